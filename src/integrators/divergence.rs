use crate::coefficient::Coefficients;
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, RuleSelection,
};
use crate::transformation::ElementTransformation;
use crate::util::{add_mult_vwt, adjugate, adjugate_scale, grad_to_div, reset_matrix, reset_vector};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use nalgebra::{DMatrix, DVector};

define_workspace! {
    struct DivergenceWorkspace {
        shape: DVector,
        divergence: DVector,
        dshape: DMatrix,
        grad: DMatrix,
    }
}

/// The mixed form `(Q div u, v)` with an H(div) trial element and a scalar test element.
///
/// The reference divergence is used directly: the `1 / det(J)` of the Piola map cancels with
/// the volume element up to the orientation of the element.
#[derive(Debug)]
pub struct VectorFEDivergenceIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<DivergenceWorkspace<T>>,
}

impl<T: Real> Default for VectorFEDivergenceIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(VectorFEDivergenceIntegrator);
impl_coefficient_builders!(VectorFEDivergenceIntegrator: scalar);

impl<T: Real> VectorFEDivergenceIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for VectorFEDivergenceIntegrator<T> {
    fn name(&self) -> &'static str {
        "VectorFEDivergenceIntegrator"
    }

    fn assemble_element_matrix2(
        &self,
        trial: &dyn FiniteElement<T>,
        test: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let (trial_nd, test_nd) = (trial.num_dofs(), test.num_dofs());
        reset_matrix(elmat, test_nd, trial_nd);
        let rule = self.rules.get(order::vector_fe_divergence(trial, test))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.divergence, trial_nd);
            reset_vector(&mut ws.shape, test_nd);
            for ip in rule.iter() {
                trial.populate_divergence_basis(ip, &mut ws.divergence);
                test.populate_basis(ip, &mut ws.shape);
                trans.set_integration_point(ip);
                let w = ip.weight * trans.orientation() * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_vwt(elmat, w, &ws.shape, &ws.divergence);
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// The mixed form `(Q div u, v)` where `u` is a vector field discretized component-wise with a
/// scalar H1 trial element and `v` is a scalar test function.
///
/// The result is `test_dofs x (dim * trial_dofs)`, with trial degrees of freedom ordered by
/// component.
#[derive(Debug)]
pub struct VectorDivergenceIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<DivergenceWorkspace<T>>,
}

impl<T: Real> Default for VectorDivergenceIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(VectorDivergenceIntegrator);
impl_coefficient_builders!(VectorDivergenceIntegrator: scalar);

impl<T: Real> VectorDivergenceIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for VectorDivergenceIntegrator<T> {
    fn name(&self) -> &'static str {
        "VectorDivergenceIntegrator"
    }

    fn assemble_element_matrix2(
        &self,
        trial: &dyn FiniteElement<T>,
        test: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let dim = trial.dim();
        let (trial_nd, test_nd) = (trial.num_dofs(), test.num_dofs());
        reset_matrix(elmat, test_nd, dim * trial_nd);
        let rule = self.rules.get(order::vector_divergence(trial, test, &*trans))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, trial_nd, dim);
            reset_vector(&mut ws.shape, test_nd);
            for ip in rule.iter() {
                trial.populate_basis_gradients(ip, &mut ws.dshape);
                test.populate_basis(ip, &mut ws.shape);
                trans.set_integration_point(ip);
                ws.grad = &ws.dshape * adjugate(trans.jacobian());
                grad_to_div(&ws.grad, &mut ws.divergence);

                let w = ip.weight * adjugate_scale(&*trans) * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_vwt(elmat, w, &ws.shape, &ws.divergence);
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// The form `(Q div u, div v)` for H(div) elements.
#[derive(Debug)]
pub struct DivDivIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<DivergenceWorkspace<T>>,
}

impl<T: Real> Default for DivDivIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(DivDivIntegrator);
impl_coefficient_builders!(DivDivIntegrator: scalar);

impl<T: Real> DivDivIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for DivDivIntegrator<T> {
    fn name(&self) -> &'static str {
        "DivDivIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        reset_matrix(elmat, nd, nd);
        let rule = self.rules.get(order::div_div(element))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.divergence, nd);
            for ip in rule.iter() {
                element.populate_divergence_basis(ip, &mut ws.divergence);
                trans.set_integration_point(ip);
                let w = ip.weight / trans.weight() * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_vwt(elmat, w, &ws.divergence, &ws.divergence);
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}
