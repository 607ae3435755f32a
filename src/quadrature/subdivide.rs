//! Quadrature rules constructed by subdividing the reference cell.
use crate::element::Geometry;
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::Real;
use nalgebra::convert;

/// An affine map `x -> origin + A x` from the reference cell onto one of its pieces, with the
/// columns of `A` stored as `axes`.
struct Piece {
    origin: [f64; 3],
    axes: [[f64; 3]; 3],
}

impl Piece {
    fn from_vertices(vertices: &[[f64; 3]]) -> Self {
        let origin = vertices[0];
        let mut axes = [[0.0; 3]; 3];
        for (axis, vertex) in axes.iter_mut().zip(&vertices[1..]) {
            for k in 0..3 {
                axis[k] = vertex[k] - origin[k];
            }
        }
        Self { origin, axes }
    }

    fn from_box(origin: [f64; 3], size: f64, dim: usize) -> Self {
        let mut axes = [[0.0; 3]; 3];
        for (k, axis) in axes.iter_mut().enumerate().take(dim) {
            axis[k] = size;
        }
        Self { origin, axes }
    }

    fn map<T: Real>(&self, ip: &IntegrationPoint<T>, weight_scale: T) -> IntegrationPoint<T> {
        let x = ip.coords();
        let mut y = [T::zero(); 3];
        for (k, y_k) in y.iter_mut().enumerate() {
            *y_k = convert(self.origin[k]);
            for (axis, x_l) in self.axes.iter().zip(&x) {
                *y_k += convert::<_, T>(axis[k]) * *x_l;
            }
        }
        IntegrationPoint {
            x: y[0],
            y: y[1],
            z: y[2],
            weight: ip.weight * weight_scale,
        }
    }
}

const HALF: f64 = 0.5;

fn pieces(geometry: Geometry) -> Vec<Piece> {
    let m = HALF;
    match geometry {
        Geometry::Point => vec![Piece::from_box([0.0; 3], 1.0, 0)],
        Geometry::Segment => (0..2)
            .map(|i| Piece::from_box([m * i as f64, 0.0, 0.0], m, 1))
            .collect(),
        Geometry::Square => (0..4)
            .map(|i| Piece::from_box([m * (i % 2) as f64, m * (i / 2) as f64, 0.0], m, 2))
            .collect(),
        Geometry::Cube => (0..8)
            .map(|i| Piece::from_box([m * (i % 2) as f64, m * ((i / 2) % 2) as f64, m * (i / 4) as f64], m, 3))
            .collect(),
        Geometry::Triangle => {
            let v = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
            let mid = |a: usize, b: usize| [m * (v[a][0] + v[b][0]), m * (v[a][1] + v[b][1]), 0.0];
            let (m01, m02, m12) = (mid(0, 1), mid(0, 2), mid(1, 2));
            vec![
                Piece::from_vertices(&[v[0], m01, m02]),
                Piece::from_vertices(&[m01, v[1], m12]),
                Piece::from_vertices(&[m02, m12, v[2]]),
                Piece::from_vertices(&[m12, m02, m01]),
            ]
        }
        Geometry::Tetrahedron => {
            let v = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
            let mid = |a: usize, b: usize| {
                [
                    m * (v[a][0] + v[b][0]),
                    m * (v[a][1] + v[b][1]),
                    m * (v[a][2] + v[b][2]),
                ]
            };
            let (m01, m02, m03) = (mid(0, 1), mid(0, 2), mid(0, 3));
            let (m12, m13, m23) = (mid(1, 2), mid(1, 3), mid(2, 3));
            vec![
                // Corners
                Piece::from_vertices(&[v[0], m01, m02, m03]),
                Piece::from_vertices(&[m01, v[1], m12, m13]),
                Piece::from_vertices(&[m02, m12, v[2], m23]),
                Piece::from_vertices(&[m03, m13, m23, v[3]]),
                // Inner octahedron, split along the diagonal m02-m13
                Piece::from_vertices(&[m02, m13, m01, m12]),
                Piece::from_vertices(&[m02, m13, m12, m23]),
                Piece::from_vertices(&[m02, m13, m23, m03]),
                Piece::from_vertices(&[m02, m13, m03, m01]),
            ]
        }
    }
}

/// Subdivides the reference cell of `geometry` into `2^dim` congruent pieces and applies
/// `rule` on each of them.
///
/// Simplices are split by their edge midpoints, tensor-product cells by halving every axis.
/// All pieces have the same volume, so weights are scaled uniformly by `2^{-dim}`.
pub fn subdivide<T: Real>(rule: &IntegrationRule<T>, geometry: Geometry) -> IntegrationRule<T> {
    let pieces = pieces(geometry);
    let weight_scale: T = convert(1.0 / pieces.len() as f64);
    pieces
        .iter()
        .flat_map(|piece| rule.iter().map(move |ip| piece.map(ip, weight_scale)))
        .collect()
}
