use crate::{square, triangle};
use matrixcompare::assert_matrix_eq;
use nalgebra::{DMatrix, DVector};
use weakform::coefficient::{ConstantCoefficient, VectorConstantCoefficient};
use weakform::element::{Quad4, Tri3};
use weakform::integrators::{
    BilinearFormIntegrator, ConvectionIntegrator, DerivativeIntegrator, GroupConvectionIntegrator,
};

fn velocity(x: f64, y: f64) -> VectorConstantCoefficient<f64> {
    VectorConstantCoefficient(DVector::from_column_slice(&[x, y]))
}

const VERTICES: [[f64; 2]; 3] = [[0.0, 0.2], [1.1, 0.0], [0.5, 1.3]];

fn tri3_matrix(integrator: &dyn BilinearFormIntegrator<f64>) -> DMatrix<f64> {
    let mut trans = triangle(VERTICES);
    let mut elmat = DMatrix::zeros(0, 0);
    integrator
        .assemble_element_matrix(&Tri3, &mut trans, &mut elmat)
        .unwrap();
    elmat
}

#[test]
fn reversed_vertex_order_permutes_convection_matrix() {
    let [a, b, c] = VERTICES;
    let integrator = ConvectionIntegrator::new(velocity(0.4, -1.1));
    let assemble = |vertices| {
        let mut trans = triangle(vertices);
        let mut elmat = DMatrix::zeros(0, 0);
        integrator
            .assemble_element_matrix(&Tri3, &mut trans, &mut elmat)
            .unwrap();
        elmat
    };
    let counter_clockwise = assemble([a, b, c]);
    let clockwise = assemble([a, c, b]);
    let permutation = [0, 2, 1];
    let permuted = DMatrix::from_fn(3, 3, |i, j| counter_clockwise[(permutation[i], permutation[j])]);
    assert_matrix_eq!(clockwise, permuted, comp = abs, tol = 1e-13);
}

#[test]
fn convection_annihilates_constants() {
    let mut trans = square(0.5, 0.5, 0.7);
    let mut elmat = DMatrix::zeros(0, 0);
    ConvectionIntegrator::new(velocity(0.3, -1.2))
        .assemble_element_matrix(&Quad4, &mut trans, &mut elmat)
        .unwrap();
    assert_matrix_eq!(&elmat * DVector::repeat(4, 1.0), DVector::<f64>::zeros(4), comp = abs, tol = 1e-14);
}

#[test]
fn convection_integrates_directional_derivative_against_test_functions() {
    // Summing over test functions gives int_K Q . grad(phi_j), and for u = x + 2y with
    // Q = (1, 1) the action is 3 int_K phi_i = area
    let elmat = tri3_matrix(&ConvectionIntegrator::new(velocity(1.0, 1.0)));
    let u = DVector::from_iterator(3, VERTICES.iter().map(|[x, y]| x + 2.0 * y));
    let area = 0.5 * ((1.1 - 0.0) * (1.3 - 0.2) - (0.5 - 0.0) * (0.0 - 0.2));
    let action = &elmat * u;
    assert_matrix_eq!(action, DVector::repeat(3, area), comp = abs, tol = 1e-13);
}

#[test]
fn alpha_scales_convection() {
    let direct = tri3_matrix(&ConvectionIntegrator::new(velocity(0.4, 0.9)));
    let integrator = ConvectionIntegrator::new(velocity(0.4, 0.9)).with_alpha(-0.5);
    assert_eq!(integrator.alpha(), -0.5);
    assert_matrix_eq!(tri3_matrix(&integrator), direct * -0.5, comp = abs, tol = 1e-14);
}

#[test]
fn group_convection_matches_convection_for_constant_velocity() {
    let convection = tri3_matrix(&ConvectionIntegrator::new(velocity(-0.7, 2.0)));
    let group = tri3_matrix(&GroupConvectionIntegrator::new(velocity(-0.7, 2.0)));
    assert_matrix_eq!(group, convection, comp = abs, tol = 1e-13);
}

#[test]
fn derivative_matches_convection_along_coordinate_axis() {
    let along_x = tri3_matrix(&ConvectionIntegrator::new(velocity(1.0, 0.0)));
    let along_y = tri3_matrix(&ConvectionIntegrator::new(velocity(0.0, 1.0)));

    assert_matrix_eq!(tri3_matrix(&DerivativeIntegrator::<f64>::new(0)), along_x, comp = abs, tol = 1e-13);
    assert_matrix_eq!(tri3_matrix(&DerivativeIntegrator::<f64>::new(1)), along_y, comp = abs, tol = 1e-13);

    let scaled = DerivativeIntegrator::<f64>::new(1).with_coefficient(ConstantCoefficient(3.0));
    assert_matrix_eq!(tri3_matrix(&scaled), along_y * 3.0, comp = abs, tol = 1e-13);
}

#[test]
#[should_panic(expected = "out of range")]
fn derivative_direction_must_exist_in_space() {
    tri3_matrix(&DerivativeIntegrator::<f64>::new(2));
}
