//! Face integrators for discontinuous Galerkin discretizations.
//!
//! Face matrices couple the degrees of freedom of the first element (first block) with those of
//! the second element (second block). On boundary faces only the first block is present.
use crate::coefficient::{ActiveCoefficient, Coefficient, Coefficients, VectorCoefficient};
use crate::define_workspace;
use crate::element::{FiniteElement, MapType};
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, RuleSelection,
};
use crate::quadrature::IntegrationPoint;
use crate::transformation::{ElementTransformation, FaceTransformation};
use crate::util::{adjugate, calc_ortho, is_zero, reset_matrix, reset_vector};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

define_workspace! {
    struct FaceWorkspace {
        shape1: DVector,
        shape2: DVector,
        face_shape: DVector,
        dshape1: DMatrix,
        dshape2: DMatrix,
        dshape1_dn: DVector,
        dshape2_dn: DVector,
        velocity: DVector,
        normal: DVector,
        scaled_normal: DVector,
        coefficient: DMatrix,
        diagonal: DVector,
        jump: DMatrix,
    }
}

/// Returns the second element if the face is an interior face.
///
/// Panics if the face is interior but no second element was supplied.
fn second_element<'a, T: Real>(
    integrator: &str,
    el2: Option<&'a dyn FiniteElement<T>>,
    trans: &dyn FaceTransformation<T>,
) -> Option<&'a dyn FiniteElement<T>> {
    if trans.is_interior() {
        match el2 {
            Some(el2) => Some(el2),
            None => panic!("{} requires a second element on interior faces", integrator),
        }
    } else {
        None
    }
}

/// Computes the face normal at the current point, scaled by the face area element.
///
/// For faces of one-dimensional elements (points) the normal is `-1` at the left end of the
/// reference segment and `+1` at the right end.
#[replace_float_literals(T::from_f64(literal).unwrap())]
fn face_normal<T: Real>(
    element_dim: usize,
    trans: &dyn FaceTransformation<T>,
    eip1: &IntegrationPoint<T>,
    normal: &mut DVector<T>,
) {
    if element_dim == 1 {
        reset_vector(normal, 1);
        normal[0] = 2.0 * eip1.x - 1.0;
    } else {
        *normal = calc_ortho(trans.face().jacobian());
    }
}

/// Scalar parameters of the [`DgTraceIntegrator`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DgTraceParameters<T> {
    /// Weight of the central flux.
    pub alpha: T,
    /// Weight of the upwind flux.
    pub beta: T,
}

impl<T: Real> DgTraceParameters<T> {
    pub fn new(alpha: T, beta: T) -> Self {
        Self { alpha, beta }
    }
}

/// The DG trace form `alpha/2 <(u . n) {v}, [w]> + beta <|u . n| [v], [w]>` for a velocity `u`.
///
/// With `alpha = -1` and `beta = 1/2` this is the classical upwind flux for advection. An
/// optional density `rho` multiplies the flux and is taken from the upwind side.
pub struct DgTraceIntegrator<T: Real> {
    velocity: Arc<dyn VectorCoefficient<T>>,
    density: Option<Arc<dyn Coefficient<T>>>,
    parameters: DgTraceParameters<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<FaceWorkspace<T>>,
}

impl<T: Real> Debug for DgTraceIntegrator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("DgTraceIntegrator")
            .field("parameters", &self.parameters)
            .field("density", &self.density.is_some())
            .field("rules", &self.rules)
            .finish()
    }
}

impl_quadrature_builders!(DgTraceIntegrator);

impl<T: Real> DgTraceIntegrator<T> {
    pub fn new(velocity: impl VectorCoefficient<T> + 'static, parameters: DgTraceParameters<T>) -> Self {
        Self {
            velocity: Arc::new(velocity),
            density: None,
            parameters,
            rules: RuleSelection::default(),
            scratch: Scratch::default(),
        }
    }

    pub fn with_density(mut self, density: impl Coefficient<T> + 'static) -> Self {
        self.density = Some(Arc::new(density));
        self
    }

    pub fn parameters(&self) -> &DgTraceParameters<T> {
        &self.parameters
    }
}

impl<T: Real> BilinearFormIntegrator<T> for DgTraceIntegrator<T> {
    fn name(&self) -> &'static str {
        "DgTraceIntegrator"
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn assemble_face_matrix(
        &self,
        el1: &dyn FiniteElement<T>,
        el2: Option<&dyn FiniteElement<T>>,
        trans: &mut dyn FaceTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let el2 = second_element(self.name(), el2, &*trans);
        let ndof1 = el1.num_dofs();
        let ndof2 = el2.map(|el2| el2.num_dofs()).unwrap_or(0);
        reset_matrix(elmat, ndof1 + ndof2, ndof1 + ndof2);
        let rule = self.rules.get(order::dg_trace(el1, el2, &*trans))?;
        let DgTraceParameters { alpha, beta } = self.parameters;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape1, ndof1);
            reset_vector(&mut ws.shape2, ndof2);
            reset_vector(&mut ws.velocity, self.velocity.vdim());
            for ip in rule.iter() {
                let eip1 = trans.to_elem1(ip);
                let eip2 = trans.to_elem2(ip);
                trans.set_integration_point(ip);
                el1.populate_basis(&eip1, &mut ws.shape1);

                self.velocity
                    .eval(&mut ws.velocity, trans.elem1(), &eip1);
                face_normal(el1.dim(), &*trans, &eip1, &mut ws.normal);

                let un = ws.velocity.dot(&ws.normal);
                let mut a = 0.5 * alpha * un;
                let mut b = beta * un.abs();
                // If |alpha / 2| == |beta|, either a + b or b - a vanishes and the corresponding
                // blocks are skipped below
                if let Some(density) = &self.density {
                    let rho = match (trans.elem2(), &eip2) {
                        (Some(elem2), Some(eip2)) if un >= 0.0 => density.eval(elem2, eip2),
                        _ => density.eval(trans.elem1(), &eip1),
                    };
                    a *= rho;
                    b *= rho;
                }

                let w = ip.weight * (a + b);
                if !is_zero(w) {
                    for i in 0..ndof1 {
                        for j in 0..ndof1 {
                            elmat[(i, j)] += w * ws.shape1[i] * ws.shape1[j];
                        }
                    }
                }

                if let (Some(el2), Some(eip2)) = (el2, &eip2) {
                    el2.populate_basis(eip2, &mut ws.shape2);
                    if !is_zero(w) {
                        for i in 0..ndof2 {
                            for j in 0..ndof1 {
                                elmat[(ndof1 + i, j)] -= w * ws.shape2[i] * ws.shape1[j];
                            }
                        }
                    }

                    let w = ip.weight * (b - a);
                    if !is_zero(w) {
                        for i in 0..ndof2 {
                            for j in 0..ndof2 {
                                elmat[(ndof1 + i, ndof1 + j)] += w * ws.shape2[i] * ws.shape2[j];
                            }
                        }
                        for i in 0..ndof1 {
                            for j in 0..ndof2 {
                                elmat[(i, ndof1 + j)] -= w * ws.shape1[i] * ws.shape2[j];
                            }
                        }
                    }
                }
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// Parameters of the [`InteriorPenaltyIntegrator`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteriorPenaltyParameters<T> {
    /// Symmetrization parameter: `-1` gives the symmetric interior penalty method, `1` the
    /// non-symmetric one and `0` the incomplete one.
    pub sigma: T,
    /// Penalty parameter. No penalty matrix is assembled if it is zero.
    pub kappa: T,
}

impl<T: Real> InteriorPenaltyParameters<T> {
    pub fn new(sigma: T, kappa: T) -> Self {
        Self { sigma, kappa }
    }
}

/// The interior penalty DG discretization of the diffusion form `-div(Q grad u)`:
///
/// ```text
/// -<{Q grad u . n}, [v]> + sigma <[u], {Q grad v . n}> + kappa <{h^{-1} Q} [u], [v]>
/// ```
///
/// The penalty uses the local mesh size `h = det(J) / |n|` of each adjacent element, averaged
/// over both sides on interior faces, so that it does not depend on how the face is
/// parametrized.
#[derive(Debug)]
pub struct InteriorPenaltyIntegrator<T: Real> {
    parameters: InteriorPenaltyParameters<T>,
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<FaceWorkspace<T>>,
}

impl_quadrature_builders!(InteriorPenaltyIntegrator);
impl_coefficient_builders!(InteriorPenaltyIntegrator: scalar, vector, matrix);

impl<T: Real> InteriorPenaltyIntegrator<T> {
    pub fn new(parameters: InteriorPenaltyParameters<T>) -> Self {
        Self {
            parameters,
            coefficients: Coefficients::default(),
            rules: RuleSelection::default(),
            scratch: Scratch::default(),
        }
    }

    pub fn parameters(&self) -> &InteriorPenaltyParameters<T> {
        &self.parameters
    }

    /// Computes `scaled = Q^T (w n)` for the coefficient evaluated on one side of the face.
    #[allow(clippy::too_many_arguments)]
    fn scale_normal(
        &self,
        w: T,
        normal: &DVector<T>,
        trans: &dyn ElementTransformation<T>,
        ip: &IntegrationPoint<T>,
        ws_coefficient: &mut DMatrix<T>,
        ws_diagonal: &mut DVector<T>,
        scaled: &mut DVector<T>,
    ) {
        let n = normal.len();
        match self.coefficients.active() {
            ActiveCoefficient::Matrix(mq) => {
                reset_matrix(ws_coefficient, n, n);
                mq.eval(ws_coefficient, trans, ip);
                *scaled = ws_coefficient.tr_mul(normal) * w;
            }
            ActiveCoefficient::Vector(vq) => {
                reset_vector(ws_diagonal, n);
                vq.eval(ws_diagonal, trans, ip);
                *scaled = normal.component_mul(ws_diagonal) * w;
            }
            ActiveCoefficient::Scalar(q) => *scaled = normal * (w * q.eval(trans, ip)),
            ActiveCoefficient::None => *scaled = normal * w,
        }
    }

    /// Computes the scaled normal derivatives `dshape adj(J) Q^T (w n)` of one side, with the
    /// sign of `det(J)`, and returns the penalty contribution `n . Q^T (w n)`.
    ///
    /// `w` is divided by the (unsigned) volume element, so the penalty stays positive on
    /// elements of reversed orientation.
    #[allow(clippy::too_many_arguments)]
    fn normal_derivatives(
        &self,
        w: T,
        element: &dyn FiniteElement<T>,
        trans: &dyn ElementTransformation<T>,
        eip: &IntegrationPoint<T>,
        ws_normal: &DVector<T>,
        ws_scaled_normal: &mut DVector<T>,
        ws_coefficient: &mut DMatrix<T>,
        ws_diagonal: &mut DVector<T>,
        dshape: &mut DMatrix<T>,
        dshape_dn: &mut DVector<T>,
    ) -> T {
        reset_matrix(dshape, element.num_dofs(), element.dim());
        element.populate_basis_gradients(eip, dshape);
        self.scale_normal(w, ws_normal, trans, eip, ws_coefficient, ws_diagonal, ws_scaled_normal);
        let nh = adjugate(trans.jacobian()) * &*ws_scaled_normal;
        *dshape_dn = &*dshape * nh * trans.orientation();
        ws_scaled_normal.dot(ws_normal)
    }
}

impl<T: Real> BilinearFormIntegrator<T> for InteriorPenaltyIntegrator<T> {
    fn name(&self) -> &'static str {
        "InteriorPenaltyIntegrator"
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn assemble_face_matrix(
        &self,
        el1: &dyn FiniteElement<T>,
        el2: Option<&dyn FiniteElement<T>>,
        trans: &mut dyn FaceTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let el2 = second_element(self.name(), el2, &*trans);
        let ndof1 = el1.num_dofs();
        let ndof2 = el2.map(|el2| el2.num_dofs()).unwrap_or(0);
        let ndofs = ndof1 + ndof2;
        let InteriorPenaltyParameters { sigma, kappa } = self.parameters;
        let penalize = !is_zero(kappa);
        reset_matrix(elmat, ndofs, ndofs);
        let rule = self.rules.get(order::dg_diffusion(el1, el2, &*trans))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape1, ndof1);
            reset_vector(&mut ws.shape2, ndof2);
            if penalize {
                reset_matrix(&mut ws.jump, ndofs, ndofs);
            }

            // elmat accumulates <{(Q grad u) . n}, [v]>, the jump matrix kappa <{h^{-1} Q} [u], [v]>
            for ip in rule.iter() {
                let eip1 = trans.to_elem1(ip);
                let eip2 = trans.to_elem2(ip);
                trans.set_integration_point(ip);
                face_normal(el1.dim(), &*trans, &eip1, &mut ws.normal);
                el1.populate_basis(&eip1, &mut ws.shape1);

                let elem1 = trans.elem1();
                let mut w = ip.weight / elem1.weight();
                if el2.is_some() {
                    w /= 2.0;
                }
                let mut wq = self.normal_derivatives(
                    w,
                    el1,
                    elem1,
                    &eip1,
                    &ws.normal,
                    &mut ws.scaled_normal,
                    &mut ws.coefficient,
                    &mut ws.diagonal,
                    &mut ws.dshape1,
                    &mut ws.dshape1_dn,
                );
                for i in 0..ndof1 {
                    for j in 0..ndof1 {
                        elmat[(i, j)] += ws.shape1[i] * ws.dshape1_dn[j];
                    }
                }

                if let (Some(el2), Some(elem2), Some(eip2)) = (el2, trans.elem2(), &eip2) {
                    el2.populate_basis(eip2, &mut ws.shape2);
                    let w = ip.weight / 2.0 / elem2.weight();
                    wq += self.normal_derivatives(
                        w,
                        el2,
                        elem2,
                        eip2,
                        &ws.normal,
                        &mut ws.scaled_normal,
                        &mut ws.coefficient,
                        &mut ws.diagonal,
                        &mut ws.dshape2,
                        &mut ws.dshape2_dn,
                    );

                    for i in 0..ndof1 {
                        for j in 0..ndof2 {
                            elmat[(i, ndof1 + j)] += ws.shape1[i] * ws.dshape2_dn[j];
                        }
                    }
                    for i in 0..ndof2 {
                        for j in 0..ndof1 {
                            elmat[(ndof1 + i, j)] -= ws.shape2[i] * ws.dshape1_dn[j];
                        }
                        for j in 0..ndof2 {
                            elmat[(ndof1 + i, ndof1 + j)] -= ws.shape2[i] * ws.dshape2_dn[j];
                        }
                    }
                }

                if penalize {
                    // Lower triangle only, mirrored when combining below
                    let wq = wq * kappa;
                    for i in 0..ndof1 {
                        let wsi = wq * ws.shape1[i];
                        for j in 0..=i {
                            ws.jump[(i, j)] += wsi * ws.shape1[j];
                        }
                    }
                    for i in 0..ndof2 {
                        let i2 = ndof1 + i;
                        let wsi = wq * ws.shape2[i];
                        for j in 0..ndof1 {
                            ws.jump[(i2, j)] -= wsi * ws.shape1[j];
                        }
                        for j in 0..=i {
                            ws.jump[(i2, ndof1 + j)] += wsi * ws.shape2[j];
                        }
                    }
                }
            }

            // elmat := sigma elmat^T - elmat + jump
            for i in 0..ndofs {
                for j in 0..i {
                    let (aij, aji) = (elmat[(i, j)], elmat[(j, i)]);
                    let mij = if penalize { ws.jump[(i, j)] } else { 0.0 };
                    elmat[(i, j)] = sigma * aji - aij + mij;
                    elmat[(j, i)] = sigma * aij - aji + mij;
                }
                let mii = if penalize { ws.jump[(i, i)] } else { 0.0 };
                elmat[(i, i)] = (sigma - 1.0) * elmat[(i, i)] + mii;
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// Couples a trace space on a face (trial) with the volume spaces of the adjacent elements
/// (test) through the jump `<u, [v]>`.
///
/// The result is `(test1_dofs + test2_dofs) x trace_dofs`, with the second block negated.
#[derive(Debug)]
pub struct TraceJumpIntegrator<T: Real> {
    rules: RuleSelection<T>,
    scratch: Scratch<FaceWorkspace<T>>,
}

impl<T: Real> Default for TraceJumpIntegrator<T> {
    fn default() -> Self {
        Self {
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(TraceJumpIntegrator);

impl<T: Real> TraceJumpIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for TraceJumpIntegrator<T> {
    fn name(&self) -> &'static str {
        "TraceJumpIntegrator"
    }

    fn assemble_face_matrix_mixed(
        &self,
        trace: &dyn FiniteElement<T>,
        test1: &dyn FiniteElement<T>,
        test2: Option<&dyn FiniteElement<T>>,
        trans: &mut dyn FaceTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let test2 = second_element(self.name(), test2, &*trans);
        let face_ndof = trace.num_dofs();
        let ndof1 = test1.num_dofs();
        let ndof2 = test2.map(|test2| test2.num_dofs()).unwrap_or(0);
        reset_matrix(elmat, ndof1 + ndof2, face_ndof);
        let rule = self
            .rules
            .get(order::trace_jump(trace, test1, test2, &*trans))?;
        let value_mapped = trace.map_type() == MapType::Value;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.face_shape, face_ndof);
            reset_vector(&mut ws.shape1, ndof1);
            reset_vector(&mut ws.shape2, ndof2);
            for ip in rule.iter() {
                let eip1 = trans.to_elem1(ip);
                let eip2 = trans.to_elem2(ip);
                trans.set_integration_point(ip);
                trace.populate_basis(ip, &mut ws.face_shape);
                test1.populate_basis(&eip1, &mut ws.shape1);

                let mut w = ip.weight;
                if value_mapped {
                    w *= trans.face().weight();
                }
                ws.face_shape *= w;

                for i in 0..ndof1 {
                    for j in 0..face_ndof {
                        elmat[(i, j)] += ws.shape1[i] * ws.face_shape[j];
                    }
                }
                if let (Some(test2), Some(eip2)) = (test2, &eip2) {
                    test2.populate_basis(eip2, &mut ws.shape2);
                    for i in 0..ndof2 {
                        for j in 0..face_ndof {
                            elmat[(ndof1 + i, j)] -= ws.shape2[i] * ws.face_shape[j];
                        }
                    }
                }
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}
