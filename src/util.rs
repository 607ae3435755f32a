//! Small dense linear algebra helpers shared by the integrators.
//!
//! Most of the accumulation routines are written as sums of rank-one updates through
//! [`Matrix::ger`](nalgebra::Matrix::ger), which avoids allocating temporaries inside
//! quadrature loops.
use crate::transformation::ElementTransformation;
use crate::Real;
use eyre::eyre;
use nalgebra::{DMatrix, DVector};

/// Resizes `matrix` to `nrows x ncols` and fills it with zeros.
pub fn reset_matrix<T: Real>(matrix: &mut DMatrix<T>, nrows: usize, ncols: usize) {
    if matrix.shape() != (nrows, ncols) {
        matrix.resize_mut(nrows, ncols, T::zero());
    }
    matrix.fill(T::zero());
}

/// Resizes `vector` to length `n` and fills it with zeros.
pub fn reset_vector<T: Real>(vector: &mut DVector<T>, n: usize) {
    if vector.len() != n {
        vector.resize_vertically_mut(n, T::zero());
    }
    vector.fill(T::zero());
}

/// Computes the adjugate of the Jacobian `j` of a reference-to-physical map.
///
/// For a square `j` this is the classical adjugate, `adj(J) = det(J) J^{-1}`. When the
/// physical dimension exceeds the reference dimension (`j` is `space_dim x dim` with
/// `space_dim > dim`), the generalized adjugate `adj(J^T J) J^T` is returned, which is a
/// `dim x space_dim` matrix satisfying `adj(J) J = det(J^T J) I`.
pub fn adjugate<T: Real>(j: &DMatrix<T>) -> DMatrix<T> {
    let (m, n) = j.shape();
    assert!(m >= n, "Jacobian must have at least as many rows as columns");
    if m == n {
        square_adjugate(j)
    } else {
        let jtj = j.tr_mul(j);
        square_adjugate(&jtj) * j.transpose()
    }
}

fn square_adjugate<T: Real>(a: &DMatrix<T>) -> DMatrix<T> {
    let n = a.nrows();
    match n {
        0 => DMatrix::zeros(0, 0),
        1 => DMatrix::from_element(1, 1, T::one()),
        2 => DMatrix::from_row_slice(2, 2, &[a[(1, 1)], -a[(0, 1)], -a[(1, 0)], a[(0, 0)]]),
        3 => {
            let c = |i: usize, j: usize, k: usize, l: usize| a[(i, j)] * a[(k, l)] - a[(i, l)] * a[(k, j)];
            #[rustfmt::skip]
            let adj = DMatrix::from_row_slice(3, 3, &[
                c(1, 1, 2, 2), -c(0, 1, 2, 2), c(0, 1, 1, 2),
                -c(1, 0, 2, 2), c(0, 0, 2, 2), -c(0, 0, 1, 2),
                c(1, 0, 2, 1), -c(0, 0, 2, 1), c(0, 0, 1, 1),
            ]);
            adj
        }
        _ => DMatrix::from_fn(n, n, |i, j| {
            // adj(A)_ij = (-1)^(i + j) det(A without row j and column i)
            let minor = a.clone().remove_row(j).remove_column(i);
            let cofactor = minor.determinant();
            if (i + j) % 2 == 0 {
                cofactor
            } else {
                -cofactor
            }
        }),
    }
}

/// Returns the factor `s` for which `s adj(J)` equals `W J^{-1}`, where `W` is the volume
/// element of `trans` and `J^{-1}` is the left pseudo-inverse for non-square maps.
///
/// Reference gradients multiplied by `s adj(J)` are physical gradients scaled by the volume
/// element, with the correct sign on elements of reversed orientation.
pub fn adjugate_scale<T: Real>(trans: &dyn ElementTransformation<T>) -> T {
    if trans.is_square() {
        trans.orientation()
    } else {
        T::one() / trans.weight()
    }
}

/// Computes the inverse of a square Jacobian, or the left pseudo-inverse
/// `(J^T J)^{-1} J^T` when `j` has more rows than columns.
pub fn inverse_jacobian<T: Real>(j: &DMatrix<T>) -> eyre::Result<DMatrix<T>> {
    let singular = || eyre!("Singular element Jacobian encountered");
    if j.is_square() {
        j.clone().try_inverse().ok_or_else(singular)
    } else {
        let jtj_inv = j.tr_mul(j).try_inverse().ok_or_else(singular)?;
        Ok(jtj_inv * j.transpose())
    }
}

/// Computes the (unnormalized) normal of a face from its `space_dim x (space_dim - 1)` Jacobian.
///
/// The length of the normal equals the face's area element.
pub fn calc_ortho<T: Real>(j: &DMatrix<T>) -> DVector<T> {
    match j.shape() {
        (2, 1) => DVector::from_column_slice(&[j[(1, 0)], -j[(0, 0)]]),
        (3, 2) => {
            let a = j.column(0);
            let b = j.column(1);
            DVector::from_column_slice(&[
                a[1] * b[2] - a[2] * b[1],
                a[2] * b[0] - a[0] * b[2],
                a[0] * b[1] - a[1] * b[0],
            ])
        }
        shape => panic!("cannot compute normal of face with Jacobian of shape {:?}", shape),
    }
}

/// `out += w * a * b^T`.
pub fn add_mult_abt<T: Real>(out: &mut DMatrix<T>, w: T, a: &DMatrix<T>, b: &DMatrix<T>) {
    assert_eq!(a.ncols(), b.ncols());
    for (a_k, b_k) in a.column_iter().zip(b.column_iter()) {
        out.ger(w, &a_k, &b_k, T::one());
    }
}

/// `out += w * a * a^T`.
pub fn add_mult_a_aat<T: Real>(out: &mut DMatrix<T>, w: T, a: &DMatrix<T>) {
    add_mult_abt(out, w, a, a);
}

/// `out += a * diag(d) * b^T`.
pub fn add_mult_adbt<T: Real>(out: &mut DMatrix<T>, a: &DMatrix<T>, d: &DVector<T>, b: &DMatrix<T>) {
    assert_eq!(a.ncols(), d.len());
    assert_eq!(b.ncols(), d.len());
    for (k, d_k) in d.iter().enumerate() {
        out.ger(*d_k, &a.column(k), &b.column(k), T::one());
    }
}

/// `out += a * c * b^T`.
pub fn add_mult_acbt<T: Real>(out: &mut DMatrix<T>, a: &DMatrix<T>, c: &DMatrix<T>, b: &DMatrix<T>) {
    assert_eq!(a.ncols(), c.nrows());
    assert_eq!(b.ncols(), c.ncols());
    for k in 0..c.nrows() {
        for l in 0..c.ncols() {
            let c_kl = c[(k, l)];
            if c_kl != T::zero() {
                out.ger(c_kl, &a.column(k), &b.column(l), T::one());
            }
        }
    }
}

/// `out += w * v * u^T`.
pub fn add_mult_vwt<T: Real>(out: &mut DMatrix<T>, w: T, v: &DVector<T>, u: &DVector<T>) {
    out.ger(w, v, u, T::one());
}

/// Adds `scale * block` to the sub-matrix of `out` whose upper-left corner is `(row, col)`.
pub fn add_block<T: Real>(out: &mut DMatrix<T>, scale: T, block: &DMatrix<T>, row: usize, col: usize) {
    for j in 0..block.ncols() {
        for i in 0..block.nrows() {
            out[(row + i, col + j)] += scale * block[(i, j)];
        }
    }
}

/// Builds the curl matrix of a vector field with `dim` components, each expanded in the
/// scalar basis whose physical gradients are the rows of `grad` (`n x dim`).
///
/// In 2D the output is `2n x 1` (the scalar curl), in 3D it is `3n x 3`. Row `k n + i`
/// holds the curl of the field that is basis function `i` in component `k` and zero elsewhere.
pub fn grad_to_curl<T: Real>(grad: &DMatrix<T>, curl: &mut DMatrix<T>) {
    let n = grad.nrows();
    match grad.ncols() {
        2 => {
            reset_matrix(curl, 2 * n, 1);
            for i in 0..n {
                let (x, y) = (grad[(i, 0)], grad[(i, 1)]);
                curl[(i, 0)] = -y;
                curl[(i + n, 0)] = x;
            }
        }
        3 => {
            reset_matrix(curl, 3 * n, 3);
            for i in 0..n {
                let (x, y, z) = (grad[(i, 0)], grad[(i, 1)], grad[(i, 2)]);
                curl[(i, 1)] = z;
                curl[(i, 2)] = -y;
                curl[(i + n, 0)] = -z;
                curl[(i + n, 2)] = x;
                curl[(i + 2 * n, 0)] = y;
                curl[(i + 2 * n, 1)] = -x;
            }
        }
        dim => panic!("curl is only defined in two or three dimensions, got dimension {}", dim),
    }
}

/// Flattens the `n x dim` gradient matrix column by column, so that entry `k n + i` is the
/// divergence of the field that is basis function `i` in component `k`.
pub fn grad_to_div<T: Real>(grad: &DMatrix<T>, div: &mut DVector<T>) {
    reset_vector(div, grad.len());
    div.copy_from_slice(grad.as_slice());
}

/// Replaces a square matrix with the diagonal matrix of its row sums.
pub fn lump<T: Real>(matrix: &mut DMatrix<T>) {
    assert!(matrix.is_square(), "only square matrices can be lumped");
    let row_sums = matrix.column_sum();
    matrix.fill(T::zero());
    matrix.set_diagonal(&row_sums);
}

/// Mirrors the lower triangle of a square matrix into its upper triangle.
pub fn clone_lower_to_upper<T: Real>(matrix: &mut DMatrix<T>) {
    for j in 0..matrix.ncols() {
        for i in (j + 1)..matrix.nrows() {
            matrix[(j, i)] = matrix[(i, j)];
        }
    }
}

/// Returns true if `x` is exactly zero, used to skip accumulations with vanishing weights.
pub(crate) fn is_zero<T: Real>(x: T) -> bool {
    x == T::zero()
}
