use crate::element::{nodes_from_coords, FiniteElement, FunctionSpace, Geometry};
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::Real;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;

/// Linear Lagrange element on the unit segment, with nodes `0` and `1`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Segment2;

impl<T: Real> FiniteElement<T> for Segment2 {
    fn geometry(&self) -> Geometry {
        Geometry::Segment
    }

    fn num_dofs(&self) -> usize {
        2
    }

    fn order(&self) -> usize {
        1
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Pk
    }

    fn nodes(&self) -> IntegrationRule<T> {
        nodes_from_coords(&[&[0.0], &[1.0]])
    }

    fn populate_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DVector<T>) {
        basis[0] = T::one() - ip.x;
        basis[1] = ip.x;
    }

    fn populate_basis_gradients(&self, _ip: &IntegrationPoint<T>, gradients: &mut DMatrix<T>) {
        gradients[(0, 0)] = -T::one();
        gradients[(1, 0)] = T::one();
    }
}

/// Quadratic Lagrange element on the unit segment, with nodes `0`, `1` and `1/2`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Segment3;

impl<T: Real> FiniteElement<T> for Segment3 {
    fn geometry(&self) -> Geometry {
        Geometry::Segment
    }

    fn num_dofs(&self) -> usize {
        3
    }

    fn order(&self) -> usize {
        2
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Pk
    }

    fn nodes(&self) -> IntegrationRule<T> {
        nodes_from_coords(&[&[0.0], &[1.0], &[0.5]])
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn populate_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DVector<T>) {
        let x = ip.x;
        basis[0] = (1.0 - x) * (1.0 - 2.0 * x);
        basis[1] = x * (2.0 * x - 1.0);
        basis[2] = 4.0 * x * (1.0 - x);
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn populate_basis_gradients(&self, ip: &IntegrationPoint<T>, gradients: &mut DMatrix<T>) {
        let x = ip.x;
        gradients[(0, 0)] = 4.0 * x - 3.0;
        gradients[(1, 0)] = 4.0 * x - 1.0;
        gradients[(2, 0)] = 4.0 - 8.0 * x;
    }
}
