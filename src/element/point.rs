use crate::element::{nodes_from_coords, FiniteElement, FunctionSpace, Geometry};
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::Real;
use nalgebra::{DMatrix, DVector};

/// The single constant basis function on a point, used for the faces of segments.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct PointElement;

impl<T: Real> FiniteElement<T> for PointElement {
    fn geometry(&self) -> Geometry {
        Geometry::Point
    }

    fn num_dofs(&self) -> usize {
        1
    }

    fn order(&self) -> usize {
        0
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Pk
    }

    fn nodes(&self) -> IntegrationRule<T> {
        nodes_from_coords(&[&[]])
    }

    fn populate_basis(&self, _ip: &IntegrationPoint<T>, basis: &mut DVector<T>) {
        basis[0] = T::one();
    }

    fn populate_basis_gradients(&self, _ip: &IntegrationPoint<T>, gradients: &mut DMatrix<T>) {
        assert_eq!(gradients.shape(), (1, 0));
    }
}
