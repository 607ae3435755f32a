use crate::element::{nodes_from_coords, FiniteElement, FunctionSpace, Geometry};
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::Real;
use nalgebra::{DMatrix, DVector};

/// Bilinear Lagrange element on the unit square.
///
/// Nodes are numbered counter-clockwise starting at the origin.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Quad4;

impl<T: Real> FiniteElement<T> for Quad4 {
    fn geometry(&self) -> Geometry {
        Geometry::Square
    }

    fn num_dofs(&self) -> usize {
        4
    }

    fn order(&self) -> usize {
        1
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Qk
    }

    fn nodes(&self) -> IntegrationRule<T> {
        nodes_from_coords(&[&[0.0, 0.0], &[1.0, 0.0], &[1.0, 1.0], &[0.0, 1.0]])
    }

    fn populate_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DVector<T>) {
        let (x, y) = (ip.x, ip.y);
        let (x1, y1) = (T::one() - x, T::one() - y);
        basis[0] = x1 * y1;
        basis[1] = x * y1;
        basis[2] = x * y;
        basis[3] = x1 * y;
    }

    fn populate_basis_gradients(&self, ip: &IntegrationPoint<T>, gradients: &mut DMatrix<T>) {
        let (x, y) = (ip.x, ip.y);
        let (x1, y1) = (T::one() - x, T::one() - y);
        gradients[(0, 0)] = -y1;
        gradients[(0, 1)] = -x1;
        gradients[(1, 0)] = y1;
        gradients[(1, 1)] = -x;
        gradients[(2, 0)] = y;
        gradients[(2, 1)] = x;
        gradients[(3, 0)] = -y;
        gradients[(3, 1)] = x1;
    }
}
