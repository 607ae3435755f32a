use crate::triangle;
use matrixcompare::assert_matrix_eq;
use nalgebra::DMatrix;
use rayon::prelude::*;
use weakform::coefficient::ConstantCoefficient;
use weakform::define_workspace;
use weakform::element::Tri3;
use weakform::integrators::{
    BilinearFormIntegrator, DgTraceParameters, DiffusionIntegrator, InteriorPenaltyParameters, MassIntegrator,
};
use weakform::workspace::{Scratch, ScratchPolicy};

define_workspace! {
    struct TestWorkspace {
        buffer: DVector,
    }
}

fn vertices(i: usize) -> [[f64; 2]; 3] {
    let shift = 0.1 * i as f64;
    [[shift, 0.0], [1.0 + shift, 0.2 * shift], [0.5, 1.0 + shift]]
}

fn element_matrix(integrator: &dyn BilinearFormIntegrator<f64>, i: usize) -> DMatrix<f64> {
    let mut trans = triangle(vertices(i));
    let mut elmat = DMatrix::zeros(0, 0);
    integrator
        .assemble_element_matrix(&Tri3, &mut trans, &mut elmat)
        .unwrap();
    elmat
}

#[test]
fn fresh_and_reused_scratch_give_identical_matrices() {
    let reuse = DiffusionIntegrator::<f64>::new().with_coefficient(ConstantCoefficient(1.5));
    let fresh = DiffusionIntegrator::<f64>::new()
        .with_coefficient(ConstantCoefficient(1.5))
        .with_scratch_policy(ScratchPolicy::Fresh);
    assert_eq!(reuse.scratch_policy(), ScratchPolicy::Reuse);
    assert_eq!(fresh.scratch_policy(), ScratchPolicy::Fresh);

    // Repeated calls with reused buffers must not leak state between elements
    for i in 0..5 {
        assert_matrix_eq!(element_matrix(&reuse, i), element_matrix(&fresh, i), comp = abs, tol = 0.0);
    }
}

#[test]
fn shared_integrator_can_be_used_from_many_threads() {
    let integrator = MassIntegrator::<f64>::new();
    let serial: Vec<_> = (0..64).map(|i| element_matrix(&integrator, i)).collect();
    let parallel: Vec<_> = (0..64)
        .into_par_iter()
        .map(|i| element_matrix(&integrator, i))
        .collect();
    for (a, b) in serial.iter().zip(&parallel) {
        assert_matrix_eq!(a, b, comp = abs, tol = 0.0);
    }
}

#[test]
fn reentrant_scratch_access_falls_back_to_temporary_buffers() {
    let scratch = Scratch::<TestWorkspace<f64>>::default();
    let lengths = scratch.with(|outer| {
        outer.buffer = nalgebra::DVector::zeros(3);
        let inner_len = scratch.with(|inner| inner.buffer.len());
        (outer.buffer.len(), inner_len)
    });
    assert_eq!(lengths, (3, 0));
    // The outer buffers persist between calls
    assert_eq!(scratch.with(|ws| ws.buffer.len()), 3);
}

#[test]
fn changing_the_policy_releases_buffers() {
    let mut scratch = Scratch::<TestWorkspace<f64>>::with_policy(ScratchPolicy::Reuse);
    scratch.with(|ws| ws.buffer = nalgebra::DVector::zeros(5));
    scratch.set_policy(ScratchPolicy::Fresh);
    assert_eq!(scratch.with(|ws| ws.buffer.len()), 0);
}

#[test]
fn parameters_serialize_to_json() {
    let policy = serde_json::to_string(&ScratchPolicy::Fresh).unwrap();
    assert_eq!(policy, "\"Fresh\"");
    assert_eq!(serde_json::from_str::<ScratchPolicy>(&policy).unwrap(), ScratchPolicy::Fresh);

    let trace = DgTraceParameters::new(-1.0, 0.5);
    let json = serde_json::to_string(&trace).unwrap();
    assert_eq!(json, r#"{"alpha":-1.0,"beta":0.5}"#);
    assert_eq!(serde_json::from_str::<DgTraceParameters<f64>>(&json).unwrap(), trace);

    let penalty: InteriorPenaltyParameters<f64> = serde_json::from_str(r#"{"sigma":-1.0,"kappa":10.0}"#).unwrap();
    assert_eq!(penalty, InteriorPenaltyParameters::new(-1.0, 10.0));
}
