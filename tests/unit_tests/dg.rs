use crate::{assert_symmetric, segment, triangle};
use matrixcompare::{assert_matrix_eq, assert_scalar_eq};
use nalgebra::{DMatrix, DVector};
use weakform::coefficient::{ConstantCoefficient, MatrixConstantCoefficient, VectorConstantCoefficient};
use weakform::element::{FiniteElement, PointElement, Segment2, Tri3};
use weakform::integrators::{
    BilinearFormIntegrator, DgTraceIntegrator, DgTraceParameters, InteriorPenaltyIntegrator,
    InteriorPenaltyParameters, TraceJumpIntegrator,
};
use weakform::transformation::{
    AffineFaceMap, FaceElementTransformations, FaceTransformation, IsoparametricTransformation,
};

/// The point `x = 1` shared by the segments `[0, 1]` and `[1, 2]`.
fn interior_point_face() -> FaceElementTransformations<f64> {
    FaceElementTransformations::interior(
        IsoparametricTransformation::from_vertices(PointElement, &[&[1.0]]),
        segment(0.0, 1.0),
        AffineFaceMap::from_vertices(&[&[1.0]]),
        segment(1.0, 2.0),
        AffineFaceMap::from_vertices(&[&[0.0]]),
    )
}

/// The right end point of the segment `[0, 1]`.
fn boundary_point_face() -> FaceElementTransformations<f64> {
    FaceElementTransformations::boundary(
        IsoparametricTransformation::from_vertices(PointElement, &[&[1.0]]),
        segment(0.0, 1.0),
        AffineFaceMap::from_vertices(&[&[1.0]]),
    )
}

/// The diagonal edge from `(1, 0)` to `(0, 1)` shared by two triangles of the unit square.
fn interior_edge() -> FaceElementTransformations<f64> {
    FaceElementTransformations::interior(
        IsoparametricTransformation::from_vertices(Segment2, &[&[1.0, 0.0], &[0.0, 1.0]]),
        triangle([[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]),
        AffineFaceMap::from_vertices(&[&[1.0, 0.0], &[0.0, 1.0]]),
        triangle([[1.0, 1.0], [0.0, 1.0], [1.0, 0.0]]),
        AffineFaceMap::from_vertices(&[&[0.0, 1.0], &[1.0, 0.0]]),
    )
}

fn face_matrix(
    integrator: &dyn BilinearFormIntegrator<f64>,
    element: &dyn FiniteElement<f64>,
    mut trans: FaceElementTransformations<f64>,
) -> DMatrix<f64> {
    let el2 = if trans.is_interior() { Some(element) } else { None };
    let mut elmat = DMatrix::zeros(0, 0);
    integrator
        .assemble_face_matrix(element, el2, &mut trans, &mut elmat)
        .unwrap();
    elmat
}

fn upwind(velocity: &[f64]) -> DgTraceIntegrator<f64> {
    DgTraceIntegrator::new(
        VectorConstantCoefficient(DVector::from_column_slice(velocity)),
        DgTraceParameters::new(-1.0, 0.5),
    )
}

#[test]
fn upwind_trace_on_interior_point_takes_value_from_upwind_side() {
    let elmat = face_matrix(&upwind(&[1.0]), &Segment2, interior_point_face());
    let mut expected = DMatrix::zeros(4, 4);
    expected[(1, 2)] = -1.0;
    expected[(2, 2)] = 1.0;
    assert_matrix_eq!(elmat, expected, comp = abs, tol = 1e-15);

    let dense = upwind(&[1.0]).with_density(ConstantCoefficient(3.0));
    assert_matrix_eq!(face_matrix(&dense, &Segment2, interior_point_face()), expected * 3.0, comp = abs, tol = 1e-14);
}

#[test]
fn upwind_trace_on_boundary_only_acts_on_inflow() {
    let inflow = face_matrix(&upwind(&[-1.0]), &Segment2, boundary_point_face());
    let expected = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 0.0, 1.0]);
    assert_matrix_eq!(inflow, expected, comp = abs, tol = 1e-15);

    let outflow = face_matrix(&upwind(&[1.0]), &Segment2, boundary_point_face());
    assert_matrix_eq!(outflow, DMatrix::<f64>::zeros(2, 2), comp = abs, tol = 0.0);
}

#[test]
fn trace_form_on_interior_edge_is_conservative() {
    let elmat = face_matrix(&upwind(&[1.0, 0.5]), &Tri3, interior_edge());
    assert_eq!(elmat.shape(), (6, 6));
    // The flux leaving one element enters the other
    let column_sums = DVector::repeat(6, 1.0).transpose() * &elmat;
    assert_matrix_eq!(column_sums, DVector::<f64>::zeros(6).transpose(), comp = abs, tol = 1e-14);
    // Only the two vertices on the edge are coupled
    assert!(elmat.row(0).amax() < 1e-14);
    assert!(elmat.column(3).amax() < 1e-14);
}

#[test]
fn trace_parameters_roundtrip_through_accessor() {
    let integrator = upwind(&[1.0]);
    assert_eq!(*integrator.parameters(), DgTraceParameters::new(-1.0, 0.5));
}

#[test]
#[should_panic(expected = "requires a second element on interior faces")]
fn trace_form_on_interior_face_requires_second_element() {
    let mut trans = interior_point_face();
    let mut elmat = DMatrix::zeros(0, 0);
    upwind(&[1.0])
        .assemble_face_matrix(&Segment2, None, &mut trans, &mut elmat)
        .unwrap();
}

#[test]
#[rustfmt::skip]
fn symmetric_interior_penalty_between_two_segments() {
    let kappa = 3.0;
    let integrator = InteriorPenaltyIntegrator::new(InteriorPenaltyParameters::new(-1.0, kappa));
    let elmat = face_matrix(&integrator, &Segment2, interior_point_face());

    let expected = DMatrix::from_row_slice(4, 4, &[
         0.0,           0.5,          -0.5,  0.0,
         0.5,  -1.0 + kappa,   1.0 - kappa, -0.5,
        -0.5,   1.0 - kappa,  -1.0 + kappa,  0.5,
         0.0,          -0.5,           0.5,  0.0,
    ]);
    assert_matrix_eq!(elmat, expected, comp = abs, tol = 1e-14);

    // u = x is continuous, so only the consistency term -<{du/dn}, [v]> remains
    let u = DVector::from_column_slice(&[0.0, 1.0, 1.0, 2.0]);
    let expected_action = DVector::from_column_slice(&[0.0, -1.0, 1.0, 0.0]);
    assert_matrix_eq!(&elmat * u, expected_action, comp = abs, tol = 1e-14);
}

#[test]
fn interior_penalty_on_boundary_point() {
    // A = [[0, 0], [-1, 1]] and the result is sigma A^T - A + kappa e_1 e_1^T
    let kappa = 2.5;
    let symmetric = InteriorPenaltyIntegrator::new(InteriorPenaltyParameters::new(-1.0, kappa));
    let expected = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, kappa - 2.0]);
    assert_matrix_eq!(face_matrix(&symmetric, &Segment2, boundary_point_face()), expected, comp = abs, tol = 1e-14);

    let incomplete = InteriorPenaltyIntegrator::new(InteriorPenaltyParameters::new(0.0, 0.0));
    let expected = DMatrix::from_row_slice(2, 2, &[0.0, 0.0, 1.0, -1.0]);
    assert_matrix_eq!(face_matrix(&incomplete, &Segment2, boundary_point_face()), expected, comp = abs, tol = 1e-14);
}

#[test]
fn interior_penalty_on_interior_edge_is_consistent() {
    let integrator = InteriorPenaltyIntegrator::new(InteriorPenaltyParameters::new(-1.0, 4.0));
    let elmat = face_matrix(&integrator, &Tri3, interior_edge());
    assert_eq!(elmat.shape(), (6, 6));
    assert_symmetric(&elmat, 1e-13);

    let constant = DVector::repeat(6, 1.0);
    assert_matrix_eq!(&elmat * constant, DVector::<f64>::zeros(6), comp = abs, tol = 1e-13);

    // u = x has unit normal derivative (with respect to the unnormalized normal (1, 1)) along
    // the edge, and each edge vertex receives half of the flux
    let vertices = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [0.0, 1.0], [1.0, 0.0]];
    let u = DVector::from_iterator(6, vertices.iter().map(|p| p[0]));
    let expected = DVector::from_column_slice(&[0.0, -0.5, -0.5, 0.0, 0.5, 0.5]);
    assert_matrix_eq!(&elmat * u, expected, comp = abs, tol = 1e-13);
}

#[test]
fn interior_penalty_coefficient_kinds_agree_for_isotropic_diffusion() {
    let parameters = InteriorPenaltyParameters::new(-1.0, 2.0);
    let scalar = InteriorPenaltyIntegrator::new(parameters).with_coefficient(ConstantCoefficient(1.5));
    let vector = InteriorPenaltyIntegrator::new(parameters)
        .with_vector_coefficient(VectorConstantCoefficient(DVector::repeat(2, 1.5)));
    let matrix = InteriorPenaltyIntegrator::new(parameters)
        .with_matrix_coefficient(MatrixConstantCoefficient(DMatrix::identity(2, 2) * 1.5));
    let reference = face_matrix(&InteriorPenaltyIntegrator::new(parameters), &Tri3, interior_edge()) * 1.5;

    for integrator in [&scalar, &vector, &matrix] {
        assert_matrix_eq!(face_matrix(integrator, &Tri3, interior_edge()), reference, comp = abs, tol = 1e-13);
    }
    assert_eq!(scalar.parameters().kappa, 2.0);
}

#[test]
fn trace_jump_between_segments() {
    let mut trans = interior_point_face();
    let mut elmat = DMatrix::zeros(0, 0);
    TraceJumpIntegrator::<f64>::new()
        .assemble_face_matrix_mixed(&PointElement, &Segment2, Some(&Segment2), &mut trans, &mut elmat)
        .unwrap();
    let expected = DMatrix::from_column_slice(4, 1, &[0.0, 1.0, -1.0, 0.0]);
    assert_matrix_eq!(elmat, expected, comp = abs, tol = 1e-15);
}

#[test]
fn trace_jump_on_edge_integrates_over_physical_length() {
    let mut trans = interior_edge();
    let mut elmat = DMatrix::zeros(0, 0);
    TraceJumpIntegrator::<f64>::new()
        .assemble_face_matrix_mixed(&Segment2, &Tri3, Some(&Tri3), &mut trans, &mut elmat)
        .unwrap();
    assert_eq!(elmat.shape(), (6, 2));

    // Summing over the trace basis leaves int_e v ds, with edge length sqrt(2)
    let half_length = 0.5 * 2.0f64.sqrt();
    let row_sums: Vec<f64> = elmat.row_iter().map(|row| row.sum()).collect();
    let expected = [0.0, half_length, half_length, 0.0, -half_length, -half_length];
    for (sum, expected) in row_sums.iter().zip(expected) {
        assert_scalar_eq!(*sum, expected, comp = abs, tol = 1e-14);
    }
}

#[test]
fn trace_jump_on_boundary_has_single_block() {
    let mut trans = boundary_point_face();
    let mut elmat = DMatrix::zeros(0, 0);
    TraceJumpIntegrator::<f64>::new()
        .assemble_face_matrix_mixed(&PointElement, &Segment2, None, &mut trans, &mut elmat)
        .unwrap();
    assert_matrix_eq!(elmat, DMatrix::from_column_slice(2, 1, &[0.0, 1.0]), comp = abs, tol = 1e-15);
}
