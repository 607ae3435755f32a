use crate::{assert_symmetric, reference_triangle, tilted_triangle, triangle};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use weakform::coefficient::{ConstantCoefficient, MatrixConstantCoefficient, VectorConstantCoefficient};
use weakform::element::{Tet4, Tet4Nedelec, Tri3, Tri3Nedelec, Tri3RaviartThomas};
use weakform::integrators::{
    BilinearFormIntegrator, CurlCurlIntegrator, DivDivIntegrator, MassIntegrator, VectorCurlCurlIntegrator,
    VectorDivergenceIntegrator, VectorFECurlIntegrator, VectorFEDivergenceIntegrator, VectorFEMassIntegrator,
    VectorMassIntegrator,
};
use weakform::transformation::IsoparametricTransformation;

const VERTICES: [[f64; 2]; 3] = [[0.3, 0.1], [1.4, 0.5], [0.2, 1.2]];

fn scalar_mass() -> DMatrix<f64> {
    let mut trans = triangle(VERTICES);
    let mut elmat = DMatrix::zeros(0, 0);
    MassIntegrator::<f64>::new()
        .assemble_element_matrix(&Tri3, &mut trans, &mut elmat)
        .unwrap();
    elmat
}

fn vector_mass(integrator: &VectorMassIntegrator<f64>) -> DMatrix<f64> {
    let mut trans = triangle(VERTICES);
    let mut elmat = DMatrix::zeros(0, 0);
    integrator
        .assemble_element_matrix(&Tri3, &mut trans, &mut elmat)
        .unwrap();
    elmat
}

#[test]
fn vector_mass_is_block_diagonal_scalar_mass() {
    let m = scalar_mass();
    let elmat = vector_mass(&VectorMassIntegrator::<f64>::new());
    assert_eq!(elmat.shape(), (6, 6));
    assert_matrix_eq!(elmat.view((0, 0), (3, 3)), m, comp = abs, tol = 1e-14);
    assert_matrix_eq!(elmat.view((3, 3), (3, 3)), m, comp = abs, tol = 1e-14);
    assert_matrix_eq!(elmat.view((0, 3), (3, 3)), DMatrix::<f64>::zeros(3, 3), comp = abs, tol = 0.0);
}

#[test]
fn vector_mass_applies_vector_and_matrix_coefficients_per_component() {
    let m = scalar_mass();

    let diagonal = VectorMassIntegrator::<f64>::new()
        .with_vector_coefficient(VectorConstantCoefficient(DVector::from_column_slice(&[1.0, 3.0])));
    let elmat = vector_mass(&diagonal);
    assert_matrix_eq!(elmat.view((3, 3), (3, 3)), &m * 3.0, comp = abs, tol = 1e-14);
    assert_matrix_eq!(elmat.view((3, 0), (3, 3)), DMatrix::<f64>::zeros(3, 3), comp = abs, tol = 0.0);

    // A 3 x 3 matrix coefficient determines the number of components
    let k = DMatrix::from_row_slice(3, 3, &[1.0, 2.0, 0.0, 2.0, 1.0, 0.0, 0.0, 0.0, 4.0]);
    let coupled = VectorMassIntegrator::<f64>::new().with_matrix_coefficient(MatrixConstantCoefficient(k));
    let elmat = vector_mass(&coupled);
    assert_eq!(elmat.shape(), (9, 9));
    assert_matrix_eq!(elmat.view((0, 3), (3, 3)), &m * 2.0, comp = abs, tol = 1e-14);
    assert_matrix_eq!(elmat.view((6, 6), (3, 3)), &m * 4.0, comp = abs, tol = 1e-14);
    assert_symmetric(&elmat, 1e-14);
}

#[test]
fn vector_mass_on_surface_has_one_component_per_reference_direction() {
    let integrator = VectorMassIntegrator::<f64>::new().with_coefficient(ConstantCoefficient(2.0));
    let expected = vector_mass(&integrator);
    assert_eq!(expected.shape(), (6, 6));

    let mut tilted = tilted_triangle(VERTICES, 0.7);
    let mut elmat = DMatrix::zeros(0, 0);
    integrator
        .assemble_element_matrix(&Tri3, &mut tilted, &mut elmat)
        .unwrap();
    assert_eq!(elmat.shape(), (6, 6));
    assert_matrix_eq!(elmat, expected, comp = abs, tol = 1e-13);

    integrator
        .assemble_element_matrix2(&Tri3, &Tri3, &mut tilted, &mut elmat)
        .unwrap();
    assert_eq!(elmat.shape(), (6, 6));
    assert_matrix_eq!(elmat, expected, comp = abs, tol = 1e-13);
}

#[test]
fn mixed_vector_mass_matches_element_matrix_for_equal_spaces() {
    let integrator = VectorMassIntegrator::<f64>::new().with_coefficient(ConstantCoefficient(2.0));
    let mut trans = triangle(VERTICES);
    let mut mixed = DMatrix::zeros(0, 0);
    integrator
        .assemble_element_matrix2(&Tri3, &Tri3, &mut trans, &mut mixed)
        .unwrap();
    assert_matrix_eq!(mixed, vector_mass(&integrator), comp = abs, tol = 1e-14);
}

#[test]
fn vector_fe_mass_matrices_are_symmetric_positive_definite() {
    for vertices in [VERTICES, [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]] {
        let mut trans = triangle(vertices);
        let integrator = VectorFEMassIntegrator::<f64>::new();
        let mut nedelec = DMatrix::zeros(0, 0);
        let mut raviart_thomas = DMatrix::zeros(0, 0);
        integrator
            .assemble_element_matrix(&Tri3Nedelec, &mut trans, &mut nedelec)
            .unwrap();
        integrator
            .assemble_element_matrix(&Tri3RaviartThomas, &mut trans, &mut raviart_thomas)
            .unwrap();

        for elmat in [nedelec, raviart_thomas] {
            assert_symmetric(&elmat, 1e-14);
            assert!(elmat.cholesky().is_some());
        }
    }
}

#[test]
fn vector_fe_mass_with_scalar_test_space_integrates_components() {
    // Summing over the (partition of unity) test functions leaves int_K psi_j. On the reference
    // triangle the first Raviart-Thomas function is (x, y - 1)
    let mut trans = reference_triangle();
    let mut elmat = DMatrix::zeros(0, 0);
    VectorFEMassIntegrator::<f64>::new()
        .assemble_element_matrix2(&Tri3RaviartThomas, &Tri3, &mut trans, &mut elmat)
        .unwrap();
    assert_eq!(elmat.shape(), (6, 3));

    let x_integral: f64 = elmat.view((0, 0), (3, 1)).sum();
    let y_integral: f64 = elmat.view((3, 0), (3, 1)).sum();
    assert_scalar_eq!(x_integral, 1.0 / 6.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(y_integral, -1.0 / 3.0, comp = abs, tol = 1e-14);
}

#[test]
#[should_panic(expected = "not implemented for matrix coefficients")]
fn vector_fe_mass_with_scalar_test_space_rejects_matrix_coefficients() {
    let mut trans = reference_triangle();
    let mut elmat = DMatrix::zeros(0, 0);
    VectorFEMassIntegrator::<f64>::new()
        .with_matrix_coefficient(MatrixConstantCoefficient(DMatrix::identity(2, 2)))
        .assemble_element_matrix2(&Tri3RaviartThomas, &Tri3, &mut trans, &mut elmat)
        .unwrap();
}

#[test]
fn div_div_of_raviart_thomas_scales_with_inverse_area() {
    // Every basis function has reference divergence 2, so (div u, div v) = 4 / det(J)^2 * area
    for (vertices, expected) in [
        ([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]], 2.0),
        ([[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]], 0.5),
    ] {
        let mut trans = triangle(vertices);
        let mut elmat = DMatrix::zeros(0, 0);
        DivDivIntegrator::<f64>::new()
            .assemble_element_matrix(&Tri3RaviartThomas, &mut trans, &mut elmat)
            .unwrap();
        assert_matrix_eq!(elmat, DMatrix::repeat(3, 3, expected), comp = abs, tol = 1e-14);
    }
}

#[test]
fn vector_fe_divergence_is_invariant_under_scaling() {
    for vertices in [[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]], [[0.0, 0.0], [3.0, 0.0], [0.0, 3.0]]] {
        let mut trans = triangle(vertices);
        let mut elmat = DMatrix::zeros(0, 0);
        VectorFEDivergenceIntegrator::<f64>::new()
            .assemble_element_matrix2(&Tri3RaviartThomas, &Tri3, &mut trans, &mut elmat)
            .unwrap();
        assert_matrix_eq!(elmat, DMatrix::repeat(3, 3, 1.0 / 3.0), comp = abs, tol = 1e-14);
    }
}

#[test]
fn curl_curl_of_nedelec_on_reference_triangle() {
    let mut trans = reference_triangle();
    let mut elmat = DMatrix::zeros(0, 0);
    CurlCurlIntegrator::<f64>::new()
        .with_coefficient(ConstantCoefficient(0.5))
        .assemble_element_matrix(&Tri3Nedelec, &mut trans, &mut elmat)
        .unwrap();
    assert_matrix_eq!(elmat, DMatrix::repeat(3, 3, 1.0), comp = abs, tol = 1e-14);
}

#[test]
fn vector_curl_curl_energy_matches_matrix() {
    let mut trans = triangle(VERTICES);
    let integrator = VectorCurlCurlIntegrator::<f64>::new();
    let mut elmat = DMatrix::zeros(0, 0);
    integrator
        .assemble_element_matrix(&Tri3, &mut trans, &mut elmat)
        .unwrap();
    assert_eq!(elmat.shape(), (6, 6));
    assert_symmetric(&elmat, 1e-13);

    // The rotation (y, -x) has curl -2, the field (x, y) is curl free
    let rotation = DVector::from_iterator(6, VERTICES.iter().map(|p| p[1]).chain(VERTICES.iter().map(|p| -p[0])));
    let gradient = DVector::from_iterator(6, VERTICES.iter().map(|p| p[0]).chain(VERTICES.iter().map(|p| p[1])));
    let area = 0.5 * ((1.4 - 0.3) * (1.2 - 0.1) - (0.2 - 0.3) * (0.5 - 0.1));

    let energy = integrator
        .element_energy(&Tri3, &mut trans, &rotation)
        .unwrap();
    assert_scalar_eq!(energy, 2.0 * area, comp = abs, tol = 1e-12);
    assert_scalar_eq!(energy, 0.5 * rotation.dot(&(&elmat * &rotation)), comp = abs, tol = 1e-12);
    assert_matrix_eq!(&elmat * gradient, DVector::<f64>::zeros(6), comp = abs, tol = 1e-12);
}

#[test]
fn vector_divergence_of_linear_field() {
    // div (x, y) = 2, so each row integrates 2 phi_i = 2 area / 3
    let mut trans = triangle(VERTICES);
    let mut elmat = DMatrix::zeros(0, 0);
    VectorDivergenceIntegrator::<f64>::new()
        .assemble_element_matrix2(&Tri3, &Tri3, &mut trans, &mut elmat)
        .unwrap();
    assert_eq!(elmat.shape(), (3, 6));

    let u = DVector::from_iterator(6, VERTICES.iter().map(|p| p[0]).chain(VERTICES.iter().map(|p| p[1])));
    let area = 0.5 * ((1.4 - 0.3) * (1.2 - 0.1) - (0.2 - 0.3) * (0.5 - 0.1));
    assert_matrix_eq!(&elmat * u, DVector::repeat(3, 2.0 * area / 3.0), comp = abs, tol = 1e-13);
}

#[test]
fn vector_fe_curl_couples_nedelec_curls_with_vector_test_functions() {
    let mut trans = IsoparametricTransformation::from_vertices(
        Tet4,
        &[&[0.0, 0.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]],
    );
    let mut elmat = DMatrix::zeros(0, 0);
    VectorFECurlIntegrator::<f64>::new()
        .assemble_element_matrix2(&Tet4Nedelec, &Tet4Nedelec, &mut trans, &mut elmat)
        .unwrap();
    assert_eq!(elmat.shape(), (6, 6));
    // The curl of the first edge function is (0, -2, 2), and the first test function integrates
    // to (1/12, 1/24, 1/24) over the reference tetrahedron
    assert_scalar_eq!(elmat[(0, 0)], -2.0 / 24.0 + 2.0 / 24.0, comp = abs, tol = 1e-14);
    // The last test function is (0, -z, y) with integral (0, -1/24, 1/24)
    assert_scalar_eq!(elmat[(5, 0)], 2.0 / 24.0 + 2.0 / 24.0, comp = abs, tol = 1e-14);
}

#[test]
#[should_panic(expected = "three-dimensional")]
fn vector_fe_curl_requires_three_dimensions() {
    let mut trans = reference_triangle();
    let mut elmat = DMatrix::zeros(0, 0);
    VectorFECurlIntegrator::<f64>::new()
        .assemble_element_matrix2(&Tri3Nedelec, &Tri3Nedelec, &mut trans, &mut elmat)
        .unwrap();
}
