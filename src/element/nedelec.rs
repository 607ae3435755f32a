use crate::element::{FiniteElement, FunctionSpace, Geometry, MapType};
use crate::quadrature::IntegrationPoint;
use crate::Real;
use nalgebra::DMatrix;
use numeric_literals::replace_float_literals;

/// Lowest-order Nédélec (edge) element on the unit triangle.
///
/// Edges are ordered `(0, 1)`, `(1, 2)`, `(2, 0)` by vertex. The scalar curl of every basis
/// function is 2.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Tri3Nedelec;

impl<T: Real> FiniteElement<T> for Tri3Nedelec {
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
        MapType::HCurl
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn populate_reference_vector_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DMatrix<T>) {
        let (x, y) = (ip.x, ip.y);
        basis[(0, 0)] = 1.0 - y;
        basis[(0, 1)] = x;
        basis[(1, 0)] = -y;
        basis[(1, 1)] = x;
        basis[(2, 0)] = -y;
        basis[(2, 1)] = x - 1.0;
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn populate_curl_basis(&self, _ip: &IntegrationPoint<T>, curl: &mut DMatrix<T>) {
        curl.fill(2.0);
    }
}

/// Lowest-order Nédélec (edge) element on the unit tetrahedron.
///
/// Edges are ordered `(0, 1)`, `(0, 2)`, `(0, 3)`, `(1, 2)`, `(1, 3)`, `(2, 3)` by vertex.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Tet4Nedelec;

#[rustfmt::skip]
const TET4_NEDELEC_CURLS: [[f64; 3]; 6] = [
    [0.0, -2.0, 2.0],
    [2.0, 0.0, -2.0],
    [-2.0, 2.0, 0.0],
    [0.0, 0.0, 2.0],
    [0.0, -2.0, 0.0],
    [2.0, 0.0, 0.0],
];

impl<T: Real> FiniteElement<T> for Tet4Nedelec {
    fn geometry(&self) -> Geometry {
        Geometry::Tetrahedron
    }

    fn num_dofs(&self) -> usize {
        6
    }

    fn order(&self) -> usize {
        1
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Pk
    }

    fn map_type(&self) -> MapType {
        MapType::HCurl
    }

    #[rustfmt::skip]
    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn populate_reference_vector_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DMatrix<T>) {
        let (x, y, z) = (ip.x, ip.y, ip.z);
        let rows = [
            [1.0 - y - z, x, x],
            [y, 1.0 - x - z, y],
            [z, z, 1.0 - x - y],
            [-y, x, 0.0],
            [-z, 0.0, x],
            [0.0, -z, y],
        ];
        for (i, row) in rows.iter().enumerate() {
            for (k, value) in row.iter().enumerate() {
                basis[(i, k)] = *value;
            }
        }
    }

    fn populate_curl_basis(&self, _ip: &IntegrationPoint<T>, curl: &mut DMatrix<T>) {
        for (i, row) in TET4_NEDELEC_CURLS.iter().enumerate() {
            for (k, value) in row.iter().enumerate() {
                curl[(i, k)] = nalgebra::convert(*value);
            }
        }
    }
}
