//! Element-local weak-form integrators.
//!
//! `weakform` computes the small dense matrices and vectors that a finite element code
//! scatters into its global operators: one element (or one face) at a time, by numerical
//! quadrature over the reference cell. Basis functions, geometric mappings, coefficients and
//! quadrature rules are consumed through the traits in [`element`], [`transformation`],
//! [`coefficient`] and [`quadrature`]. Global numbering and assembly are left to the caller.
//!
//! The integrators themselves live in [`integrators`] and all implement
//! [`BilinearFormIntegrator`](integrators::BilinearFormIntegrator).

use nalgebra::RealField;

pub mod coefficient;
pub mod element;
pub mod integrators;
pub mod quadrature;
pub mod transformation;
pub mod util;
pub mod workspace;

pub extern crate nalgebra;

/// Scalar types supported by `weakform`.
///
/// Used as a trait alias for the traits needed by all generic routines in the crate.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}
