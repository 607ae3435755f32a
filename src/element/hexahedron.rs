use crate::element::{nodes_from_coords, FiniteElement, FunctionSpace, Geometry};
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::Real;
use nalgebra::{DMatrix, DVector};

/// Trilinear Lagrange element on the unit cube.
///
/// The bottom face (`z = 0`) nodes come first, counter-clockwise from the origin, followed by
/// the top face in the same order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Hex8;

const HEX8_CORNERS: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

/// The 1D linear factor `x` or `1 - x`, depending on the node coordinate, and its derivative.
fn factor<T: Real>(node_coord: f64, x: T) -> (T, T) {
    if node_coord == 0.0 {
        (T::one() - x, -T::one())
    } else {
        (x, T::one())
    }
}

impl<T: Real> FiniteElement<T> for Hex8 {
    fn geometry(&self) -> Geometry {
        Geometry::Cube
    }

    fn num_dofs(&self) -> usize {
        8
    }

    fn order(&self) -> usize {
        1
    }

    fn space(&self) -> FunctionSpace {
        FunctionSpace::Qk
    }

    fn nodes(&self) -> IntegrationRule<T> {
        let corners: Vec<&[f64]> = HEX8_CORNERS.iter().map(|c| c.as_slice()).collect();
        nodes_from_coords(&corners)
    }

    fn populate_basis(&self, ip: &IntegrationPoint<T>, basis: &mut DVector<T>) {
        for (i, corner) in HEX8_CORNERS.iter().enumerate() {
            let (fx, _) = factor(corner[0], ip.x);
            let (fy, _) = factor(corner[1], ip.y);
            let (fz, _) = factor(corner[2], ip.z);
            basis[i] = fx * fy * fz;
        }
    }

    fn populate_basis_gradients(&self, ip: &IntegrationPoint<T>, gradients: &mut DMatrix<T>) {
        for (i, corner) in HEX8_CORNERS.iter().enumerate() {
            let (fx, dx) = factor(corner[0], ip.x);
            let (fy, dy) = factor(corner[1], ip.y);
            let (fz, dz) = factor(corner[2], ip.z);
            gradients[(i, 0)] = dx * fy * fz;
            gradients[(i, 1)] = fx * dy * fz;
            gradients[(i, 2)] = fx * fy * dz;
        }
    }
}
