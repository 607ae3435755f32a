//! Rules for the unit square and cube, formed as tensor products of univariate Gauss rules.

use crate::univariate::unit_gauss;
use crate::{check_order, gauss_points_for_order, Error, Rule};

/// Tensor-product Gauss rule on `[0, 1]^2` with `n` points per axis.
pub fn square_gauss(num_points_per_dim: usize) -> Rule<2> {
    let (w1d, x1d) = unit_gauss(num_points_per_dim);
    let n = w1d.len();
    let mut weights = Vec::with_capacity(n * n);
    let mut points = Vec::with_capacity(n * n);
    for (&wy, &[y]) in w1d.iter().zip(&x1d) {
        for (&wx, &[x]) in w1d.iter().zip(&x1d) {
            weights.push(wx * wy);
            points.push([x, y]);
        }
    }
    (weights, points)
}

/// Tensor-product Gauss rule on `[0, 1]^3` with `n` points per axis.
pub fn cube_gauss(num_points_per_dim: usize) -> Rule<3> {
    let (w1d, x1d) = unit_gauss(num_points_per_dim);
    let n = w1d.len();
    let mut weights = Vec::with_capacity(n * n * n);
    let mut points = Vec::with_capacity(n * n * n);
    for (&wz, &[z]) in w1d.iter().zip(&x1d) {
        for (&wy, &[y]) in w1d.iter().zip(&x1d) {
            for (&wx, &[x]) in w1d.iter().zip(&x1d) {
                weights.push(wx * wy * wz);
                points.push([x, y, z]);
            }
        }
    }
    (weights, points)
}

/// A rule for the unit square that integrates every polynomial of degree `order` in each
/// variable exactly.
pub fn square(order: usize) -> Result<Rule<2>, Error> {
    check_order(order)?;
    Ok(square_gauss(gauss_points_for_order(order)))
}

/// A rule for the unit cube that integrates every polynomial of degree `order` in each
/// variable exactly.
pub fn cube(order: usize) -> Result<Rule<3>, Error> {
    check_order(order)?;
    Ok(cube_gauss(gauss_points_for_order(order)))
}
