//! Reference finite elements.
//!
//! A [`FiniteElement`] evaluates basis functions on its reference cell. It knows nothing about
//! the physical element: pulling quantities back to physical space is the job of the
//! integrators, with the help of an [`ElementTransformation`].
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::transformation::ElementTransformation;
use crate::util::{adjugate, reset_matrix};
use crate::Real;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

mod hexahedron;
mod nedelec;
mod point;
mod quadrilateral;
mod raviart_thomas;
mod segment;
mod tetrahedron;
mod triangle;

pub use hexahedron::*;
pub use nedelec::*;
pub use point::*;
pub use quadrilateral::*;
pub use raviart_thomas::*;
pub use segment::*;
pub use tetrahedron::*;
pub use triangle::*;

/// Reference cell geometries.
///
/// All reference cells are unit cells: `[0, 1]^d` for tensor-product cells and the simplex
/// spanned by the origin and the unit vectors for simplices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Geometry {
    Point,
    Segment,
    Triangle,
    Square,
    Tetrahedron,
    Cube,
}

impl Geometry {
    pub fn dim(&self) -> usize {
        match self {
            Geometry::Point => 0,
            Geometry::Segment => 1,
            Geometry::Triangle | Geometry::Square => 2,
            Geometry::Tetrahedron | Geometry::Cube => 3,
        }
    }
}

/// The polynomial family spanned by an element's basis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FunctionSpace {
    /// Polynomials of total degree at most `p`.
    Pk,
    /// Polynomials of degree at most `p` in each variable.
    Qk,
    /// `Qk` with basis functions that are only piecewise polynomial on the reference cell,
    /// which calls for a refined quadrature rule.
    RQk,
    Other,
}

/// How basis values are mapped from the reference cell to the physical element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapType {
    /// Scalar values are preserved.
    Value,
    /// Values scale with the inverse of the Jacobian determinant.
    Integral,
    /// Contravariant Piola map, `v = J v_hat / det(J)`.
    HDiv,
    /// Covariant Piola map, `v = J^{-T} v_hat`.
    HCurl,
}

impl MapType {
    /// Whether elements with this map type have vector-valued basis functions.
    pub fn is_vector(&self) -> bool {
        matches!(self, MapType::HDiv | MapType::HCurl)
    }
}

/// A finite element on a reference cell.
///
/// Matrix-valued outputs are laid out with one row per basis function. Buffers are sized by the
/// caller; the element only writes entries. Evaluations that an element family does not support
/// panic, since requesting them is a programming error.
pub trait FiniteElement<T: Real> {
    fn geometry(&self) -> Geometry;

    /// The dimension of the reference cell.
    fn dim(&self) -> usize {
        self.geometry().dim()
    }

    fn num_dofs(&self) -> usize;

    /// The polynomial order of the element, as used for selecting quadrature rules.
    fn order(&self) -> usize;

    fn space(&self) -> FunctionSpace;

    fn map_type(&self) -> MapType {
        MapType::Value
    }

    /// The reference coordinates of the degrees of freedom, for nodal elements.
    fn nodes(&self) -> IntegrationRule<T> {
        unsupported_evaluation(self, "nodes")
    }

    /// Evaluates every basis function at `ip`, writing `num_dofs` values.
    fn populate_basis(&self, _ip: &IntegrationPoint<T>, _basis: &mut DVector<T>) {
        unsupported_evaluation(self, "populate_basis")
    }

    /// Evaluates reference gradients into a `num_dofs x dim` matrix.
    fn populate_basis_gradients(&self, _ip: &IntegrationPoint<T>, _gradients: &mut DMatrix<T>) {
        unsupported_evaluation(self, "populate_basis_gradients")
    }

    /// Evaluates vector-valued basis functions on the reference cell into a `num_dofs x dim`
    /// matrix.
    fn populate_reference_vector_basis(&self, _ip: &IntegrationPoint<T>, _basis: &mut DMatrix<T>) {
        unsupported_evaluation(self, "populate_reference_vector_basis")
    }

    /// Evaluates vector-valued basis functions on the physical element at the current point of
    /// `trans`, writing a `num_dofs x space_dim` matrix.
    ///
    /// The default implementation applies the Piola map matching [`map_type`](Self::map_type)
    /// to the reference basis.
    fn populate_vector_basis(&self, trans: &dyn ElementTransformation<T>, basis: &mut DMatrix<T>) {
        let mut reference = DMatrix::zeros(self.num_dofs(), self.dim());
        self.populate_reference_vector_basis(trans.integration_point(), &mut reference);
        reset_matrix(basis, self.num_dofs(), trans.space_dim());
        let jacobian = trans.jacobian();
        let det = trans.jacobian_determinant();
        match self.map_type() {
            MapType::HDiv => {
                basis.gemm(T::one() / det, &reference, &jacobian.transpose(), T::zero());
            }
            MapType::HCurl => {
                // J^{-1} = adj(J) / det(J), or adj(J) / det(J^T J) for non-square maps
                let scale = if trans.is_square() { det } else { det * det };
                basis.gemm(T::one() / scale, &reference, &adjugate(jacobian), T::zero());
            }
            map_type => panic!("cannot map vector basis with map type {:?}", map_type),
        }
    }

    /// The number of components of the curl: 3 in three dimensions and 1 otherwise.
    fn curl_dim(&self) -> usize {
        if self.dim() == 3 {
            3
        } else {
            1
        }
    }

    /// Evaluates the reference curl of every basis function into a `num_dofs x curl_dim` matrix.
    fn populate_curl_basis(&self, _ip: &IntegrationPoint<T>, _curl: &mut DMatrix<T>) {
        unsupported_evaluation(self, "populate_curl_basis")
    }

    /// Evaluates the reference divergence of every basis function.
    fn populate_divergence_basis(&self, _ip: &IntegrationPoint<T>, _divergence: &mut DVector<T>) {
        unsupported_evaluation(self, "populate_divergence_basis")
    }
}

fn unsupported_evaluation<T: Real, E: FiniteElement<T> + ?Sized>(element: &E, method: &str) -> ! {
    panic!(
        "{} is not supported by element with geometry {:?} and map type {:?}",
        method,
        element.geometry(),
        element.map_type()
    )
}

/// Builds the nodes of a nodal element from reference coordinates.
pub(crate) fn nodes_from_coords<T: Real>(coords: &[&[f64]]) -> IntegrationRule<T> {
    coords
        .iter()
        .map(|c| {
            let c: Vec<T> = c.iter().map(|&x| nalgebra::convert(x)).collect();
            IntegrationPoint::at(&c)
        })
        .collect()
}
