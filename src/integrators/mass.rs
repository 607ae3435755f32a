use crate::coefficient::Coefficients;
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, RuleSelection,
};
use crate::transformation::ElementTransformation;
use crate::util::{add_mult_vwt, reset_matrix, reset_vector};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use nalgebra::{DMatrix, DVector};

/// The mass form `(Q u, v)` for scalar elements.
#[derive(Debug)]
pub struct MassIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<MassWorkspace<T>>,
}

impl<T: Real> Default for MassIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

define_workspace! {
    struct MassWorkspace {
        shape: DVector,
        test_shape: DVector,
    }
}

impl_quadrature_builders!(MassIntegrator);
impl_coefficient_builders!(MassIntegrator: scalar);

impl<T: Real> MassIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for MassIntegrator<T> {
    fn name(&self) -> &'static str {
        "MassIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        reset_matrix(elmat, nd, nd);
        let rule = self.rules.get(order::mass(element, &*trans))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape, nd);
            for ip in rule.iter() {
                element.populate_basis(ip, &mut ws.shape);
                trans.set_integration_point(ip);
                let w = trans.weight() * ip.weight * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_vwt(elmat, w, &ws.shape, &ws.shape);
            }
        });
        Ok(())
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
        let rule = self.rules.get(order::mass_mixed(trial, test, &*trans))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape, trial_nd);
            reset_vector(&mut ws.test_shape, test_nd);
            for ip in rule.iter() {
                trial.populate_basis(ip, &mut ws.shape);
                test.populate_basis(ip, &mut ws.test_shape);
                trans.set_integration_point(ip);
                let w = trans.weight() * ip.weight * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_vwt(elmat, w, &ws.test_shape, &ws.shape);
            }
        });
        Ok(())
    }

    fn assemble_element_vector(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elfun: &DVector<T>,
        elvect: &mut DVector<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        assert_eq!(elfun.len(), nd, "element solution must have one entry per basis function");
        reset_vector(elvect, nd);
        let rule = self.rules.get(order::mass(element, &*trans))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape, nd);
            for ip in rule.iter() {
                element.populate_basis(ip, &mut ws.shape);
                trans.set_integration_point(ip);
                let w = trans.weight() * ip.weight * self.coefficients.scalar_or_one(&*trans, ip);
                let u = ws.shape.dot(elfun);
                elvect.axpy(w * u, &ws.shape, T::one());
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}
