use crate::element::{nodes_from_coords, FiniteElement, FunctionSpace, Geometry};
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::Real;
use nalgebra::{DMatrix, DVector};

/// Linear Lagrange element on the unit tetrahedron.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Tet4;

impl<T: Real> FiniteElement<T> for Tet4 {
    fn geometry(&self) -> Geometry {
        Geometry::Tetrahedron
    }

    fn num_dofs(&self) -> usize {
        4
    }

    fn order(&self) -> usize {
        1
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Pk
    }

    fn nodes(&self) -> IntegrationRule<T> {
        nodes_from_coords(&[&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]])
    }

    fn populate_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DVector<T>) {
        basis[0] = T::one() - ip.x - ip.y - ip.z;
        basis[1] = ip.x;
        basis[2] = ip.y;
        basis[3] = ip.z;
    }

    fn populate_basis_gradients(&self, _ip: &IntegrationPoint<T>, gradients: &mut DMatrix<T>) {
        gradients.fill(T::zero());
        for k in 0..3 {
            gradients[(0, k)] = -T::one();
            gradients[(k + 1, k)] = T::one();
        }
    }
}
