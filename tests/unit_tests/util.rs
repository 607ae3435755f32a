use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use weakform::util::adjugate;

#[test]
fn adjugate_of_singular_diagonal_matrix_keeps_nonzero_cofactors() {
    let a = DMatrix::from_diagonal(&DVector::from_column_slice(&[1.0, 2.0, 3.0, 0.0]));
    let expected = DMatrix::from_diagonal(&DVector::from_column_slice(&[0.0, 0.0, 0.0, 6.0]));
    assert_matrix_eq!(adjugate(&a), expected, comp = abs, tol = 1e-14);
}

#[test]
fn adjugate_of_singular_matrix_is_annihilated_by_it() {
    // Rank 3: the last row is the sum of the first two
    #[rustfmt::skip]
    let a = DMatrix::from_row_slice(4, 4, &[
        1.0, 2.0, 0.0, 1.0,
        0.0, 1.0, 3.0, 2.0,
        2.0, 0.0, 1.0, 1.0,
        1.0, 3.0, 3.0, 3.0,
    ]);
    let adj = adjugate(&a);
    assert!(adj.amax() > 1e-3, "rank deficiency one leaves a nonzero adjugate");
    assert_matrix_eq!(&a * &adj, DMatrix::<f64>::zeros(4, 4), comp = abs, tol = 1e-12);
    assert_matrix_eq!(&adj * &a, DMatrix::<f64>::zeros(4, 4), comp = abs, tol = 1e-12);
}

#[test]
fn adjugate_of_invertible_matrix_is_scaled_inverse() {
    #[rustfmt::skip]
    let a = DMatrix::from_row_slice(4, 4, &[
        4.0, 1.0, 0.0, 2.0,
        1.0, 3.0, 1.0, 0.0,
        0.0, 1.0, 5.0, 1.0,
        2.0, 0.0, 1.0, 6.0,
    ]);
    let det = a.determinant();
    let adj = adjugate(&a);
    assert_matrix_eq!(&a * &adj, DMatrix::<f64>::identity(4, 4) * det, comp = abs, tol = 1e-10);

    // Agrees with the closed form for 3 x 3 matrices
    let b = a.view((0, 0), (3, 3)).into_owned();
    assert_matrix_eq!(&b * adjugate(&b), DMatrix::<f64>::identity(3, 3) * b.determinant(), comp = abs, tol = 1e-12);
}
