//! Quadrature rules for the unit reference cells.
//!
//! The main purpose of this crate is to supply `weakform` with integration rules, but the rules
//! do not depend on anything from `weakform` and may be used on their own.
//!
//! All reference cells are *unit* cells:
//!
//! - the segment `[0, 1]`,
//! - the square `[0, 1]^2` and the cube `[0, 1]^3`,
//! - the triangle with vertices `(0, 0), (1, 0), (0, 1)`,
//! - the tetrahedron with vertices `(0, 0, 0), (1, 0, 0), (0, 1, 0), (0, 0, 1)`.
//!
//! Rules are requested by the polynomial degree they must integrate exactly.

use std::fmt;
use std::fmt::{Display, Formatter};

pub mod simplex;
pub mod tensor;
pub mod univariate;

/// The largest polynomial degree for which rules are constructed.
pub const MAX_ORDER: usize = 64;

/// Library-wide error type.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable { order: usize },
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable { order } => {
                write!(
                    f,
                    "There is no quadrature rule of polynomial order {order} available (max is {MAX_ORDER})"
                )
            }
        }
    }
}

impl std::error::Error for Error {}

/// A D-dimensional point.
pub type Point<const D: usize> = [f64; D];

/// A D-dimensional rule, stored as `(weights, points)`.
pub type Rule<const D: usize> = (Vec<f64>, Vec<Point<D>>);

/// A one-dimensional rule.
pub type Rule1d = Rule<1>;

/// A two-dimensional rule.
pub type Rule2d = Rule<2>;

/// A three-dimensional rule.
pub type Rule3d = Rule<3>;

/// Approximates the integral of `f` with the given rule.
pub fn integrate<const D: usize>(rule: &Rule<D>, f: impl Fn(&Point<D>) -> f64) -> f64 {
    let (weights, points) = rule;
    weights
        .iter()
        .zip(points)
        .map(|(w, x)| w * f(x))
        .sum()
}

/// The number of Gauss points needed to integrate a univariate polynomial of the given degree.
pub fn gauss_points_for_order(order: usize) -> usize {
    order / 2 + 1
}

pub(crate) fn check_order(order: usize) -> Result<(), Error> {
    if order > MAX_ORDER {
        Err(Error::NoRuleAvailable { order })
    } else {
        Ok(())
    }
}

/// The single-point rule for the zero-dimensional reference cell.
pub fn point() -> Rule<0> {
    (vec![1.0], vec![[]])
}
