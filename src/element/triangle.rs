use crate::element::{nodes_from_coords, FiniteElement, FunctionSpace, Geometry};
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::Real;
use nalgebra::{DMatrix, DVector};

/// Linear Lagrange element on the unit triangle with vertices `(0, 0), (1, 0), (0, 1)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Tri3;

impl<T: Real> FiniteElement<T> for Tri3 {
    fn geometry(&self) -> Geometry {
        Geometry::Triangle
    }

    fn num_dofs(&self) -> usize {
        3
    }

    fn order(&self) -> usize {
        1
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Pk
    }

    fn nodes(&self) -> IntegrationRule<T> {
        nodes_from_coords(&[&[0.0, 0.0], &[1.0, 0.0], &[0.0, 1.0]])
    }

    fn populate_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DVector<T>) {
        basis[0] = T::one() - ip.x - ip.y;
        basis[1] = ip.x;
        basis[2] = ip.y;
    }

    #[rustfmt::skip]
    fn populate_basis_gradients(&self, _ip: &IntegrationPoint<T>, gradients: &mut DMatrix<T>) {
        let (o, z) = (T::one(), T::zero());
        gradients.copy_from_slice(&[
            // Column-major: d/dx, then d/dy
            -o, o, z,
            -o, z, o,
        ]);
    }
}
