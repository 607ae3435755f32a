//! Quadrature rules for one-dimensional domains.

use crate::{check_order, gauss_points_for_order, Error, Rule};
use std::f64::consts::PI;

/// Legendre polynomial `p_n` and its predecessor `p_{n-1}` evaluated at a point.
///
/// The derivative formula is singular at `|x| == 1`, so this is only used in the open
/// interval `(-1, 1)`.
#[derive(Debug, Default)]
struct Legendre {
    n: usize,
    x: f64,
    p_n: f64,
    p_prev: f64,
}

impl Legendre {
    fn at(n: usize, x: f64) -> Self {
        // Bonnet's recursion: m P_m = (2m - 1) x P_{m-1} - (m - 1) P_{m-2}
        let mut p_n = 1.0;
        let mut p_prev = 0.0;
        for m in 1..=n {
            let m = m as f64;
            let p_prev_prev = p_prev;
            p_prev = p_n;
            p_n = ((2.0 * m - 1.0) * x * p_prev - (m - 1.0) * p_prev_prev) / m;
        }
        Self { n, x, p_n, p_prev }
    }

    fn value(&self) -> f64 {
        self.p_n
    }

    fn derivative(&self) -> f64 {
        let n = self.n as f64;
        n * (self.x * self.p_n - self.p_prev) / (self.x * self.x - 1.0)
    }
}

/// Gauss-Legendre quadrature with the given number of points on `[-1, 1]`.
///
/// A rule with `n` points integrates polynomials of degree up to `2n - 1` exactly.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss(num_points: usize) -> Rule<1> {
    let n = num_points;
    assert!(n > 0, "number of points must be positive");

    let num_unique = (n + 1) / 2;
    let mut points = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);

    for i in 0..num_unique {
        // Chebyshev-like initial guess, refined by Newton iterations
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut legendre = Legendre::at(n, x);
        for _ in 0..100 {
            let dx = -legendre.value() / legendre.derivative();
            x += dx;
            legendre = Legendre::at(n, x);
            if dx.abs() <= 1e-15 {
                break;
            }
        }
        let dp = legendre.derivative();
        points.push([x]);
        weights.push(2.0 / ((1.0 - x * x) * dp * dp));
    }

    // The remaining roots are mirror images of the ones already found
    for i in num_unique..n {
        let mirror = n - i - 1;
        points.push([-points[mirror][0]]);
        weights.push(weights[mirror]);
    }

    (weights, points)
}

/// Gauss-Legendre quadrature with the given number of points on `[0, 1]`.
pub fn unit_gauss(num_points: usize) -> Rule<1> {
    let (weights, points) = gauss(num_points);
    let weights = weights.into_iter().map(|w| 0.5 * w).collect();
    let points = points
        .into_iter()
        .map(|[x]| [0.5 * (x + 1.0)])
        .collect();
    (weights, points)
}

/// A rule for the unit segment `[0, 1]` that integrates polynomials of degree `order` exactly.
pub fn segment(order: usize) -> Result<Rule<1>, Error> {
    check_order(order)?;
    Ok(unit_gauss(gauss_points_for_order(order)))
}
