//! Rules for the unit triangle and tetrahedron.
//!
//! The rules are conical products of Gauss rules obtained by collapsing the unit square (cube)
//! onto the simplex. They are not the most economical rules available, but they exist for any
//! order and all their points lie strictly inside the simplex with positive weights.

use crate::univariate::unit_gauss;
use crate::{check_order, gauss_points_for_order, Error, Rule};

/// A rule for the unit triangle that integrates polynomials of total degree `order` exactly.
///
/// Uses the collapsed map `(u, v) -> (u, v (1 - u))`, whose Jacobian determinant `1 - u`
/// raises the degree in `u` by one.
pub fn triangle(order: usize) -> Result<Rule<2>, Error> {
    check_order(order)?;
    let (wu, u) = unit_gauss(gauss_points_for_order(order + 1));
    let (wv, v) = unit_gauss(gauss_points_for_order(order));

    let mut weights = Vec::with_capacity(wu.len() * wv.len());
    let mut points = Vec::with_capacity(wu.len() * wv.len());
    for (&wu, &[u]) in wu.iter().zip(&u) {
        let s = 1.0 - u;
        for (&wv, &[v]) in wv.iter().zip(&v) {
            weights.push(wu * wv * s);
            points.push([u, v * s]);
        }
    }
    Ok((weights, points))
}

/// A rule for the unit tetrahedron that integrates polynomials of total degree `order` exactly.
///
/// Uses the collapsed map `(u, v, w) -> (u, v (1 - u), w (1 - u) (1 - v))` with Jacobian
/// determinant `(1 - u)^2 (1 - v)`.
pub fn tetrahedron(order: usize) -> Result<Rule<3>, Error> {
    check_order(order)?;
    let (wu, u) = unit_gauss(gauss_points_for_order(order + 2));
    let (wv, v) = unit_gauss(gauss_points_for_order(order + 1));
    let (ww, w) = unit_gauss(gauss_points_for_order(order));

    let n = wu.len() * wv.len() * ww.len();
    let mut weights = Vec::with_capacity(n);
    let mut points = Vec::with_capacity(n);
    for (&wu, &[u]) in wu.iter().zip(&u) {
        let su = 1.0 - u;
        for (&wv, &[v]) in wv.iter().zip(&v) {
            let sv = 1.0 - v;
            for (&ww, &[w]) in ww.iter().zip(&w) {
                weights.push(wu * wv * ww * su * su * sv);
                points.push([u, v * su, w * su * sv]);
            }
        }
    }
    Ok((weights, points))
}
