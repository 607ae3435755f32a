use crate::element::{FiniteElement, FunctionSpace, Geometry, MapType};
use crate::quadrature::IntegrationPoint;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;

/// Lowest-order Raviart-Thomas element on the unit triangle.
///
/// Basis function `i` has unit normal flux through edge `i`, with the edges ordered
/// `(0, 1)`, `(1, 2)`, `(2, 0)` by vertex. Every basis function is of the form `x - v` for a
/// vertex `v`, so all of them have divergence 2.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Tri3RaviartThomas;

const OPPOSITE_VERTICES: [[f64; 2]; 3] = [[0.0, 1.0], [0.0, 0.0], [1.0, 0.0]];

impl<T: Real> FiniteElement<T> for Tri3RaviartThomas {
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

    fn map_type(&self) -> MapType {
        MapType::HDiv
    }

    fn populate_reference_vector_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DMatrix<T>) {
        for (i, [vx, vy]) in OPPOSITE_VERTICES.iter().enumerate() {
            basis[(i, 0)] = ip.x - nalgebra::convert(*vx);
            basis[(i, 1)] = ip.y - nalgebra::convert(*vy);
        }
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn populate_divergence_basis(&self, _ip: &IntegrationPoint<T>, divergence: &mut DVector<T>) {
        divergence.fill(2.0);
    }
}
