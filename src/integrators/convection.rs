use crate::coefficient::{Coefficients, VectorCoefficient};
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, RuleSelection,
};
use crate::transformation::ElementTransformation;
use crate::util::{add_mult_vwt, adjugate, adjugate_scale, inverse_jacobian, reset_matrix, reset_vector};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use itertools::izip;
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

define_workspace! {
    struct ConvectionWorkspace {
        shape: DVector,
        dshape: DMatrix,
        grad: DMatrix,
        velocity: DMatrix,
        direction: DVector,
        derivative: DVector,
    }
}

/// The convection form `alpha (Q . grad u, v)` with a vector velocity field `Q`.
///
/// Choosing `alpha = -1` gives the transpose form used in upwinded discretizations, while
/// `alpha = -1/2` together with the transpose of the form yields a skew-symmetric operator.
pub struct ConvectionIntegrator<T: Real> {
    velocity: Arc<dyn VectorCoefficient<T>>,
    alpha: T,
    rules: RuleSelection<T>,
    scratch: Scratch<ConvectionWorkspace<T>>,
}

impl<T: Real> Debug for ConvectionIntegrator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConvectionIntegrator")
            .field("vdim", &self.velocity.vdim())
            .field("alpha", &self.alpha)
            .field("rules", &self.rules)
            .finish()
    }
}

impl_quadrature_builders!(ConvectionIntegrator);

impl<T: Real> ConvectionIntegrator<T> {
    pub fn new(velocity: impl VectorCoefficient<T> + 'static) -> Self {
        Self {
            velocity: Arc::new(velocity),
            alpha: T::one(),
            rules: RuleSelection::default(),
            scratch: Scratch::default(),
        }
    }

    pub fn with_alpha(mut self, alpha: T) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn alpha(&self) -> T {
        self.alpha
    }
}

impl<T: Real> BilinearFormIntegrator<T> for ConvectionIntegrator<T> {
    fn name(&self) -> &'static str {
        "ConvectionIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        let dim = element.dim();
        reset_matrix(elmat, nd, nd);
        let rule = self.rules.get(order::convection(element, &*trans))?;

        self.scratch.with(|ws| {
            // Sample the velocity once for the whole rule, one column per point
            self.velocity
                .eval_rule(&mut ws.velocity, trans, &rule);

            reset_vector(&mut ws.shape, nd);
            reset_matrix(&mut ws.dshape, nd, dim);
            for (ip, q) in izip!(rule.iter(), ws.velocity.column_iter()) {
                element.populate_basis(ip, &mut ws.shape);
                element.populate_basis_gradients(ip, &mut ws.dshape);
                trans.set_integration_point(ip);
                let adj = adjugate(trans.jacobian());

                // The reference direction s adj(J) Q, so that dshape s adj(J) Q = W Q . grad phi
                let q = q * (self.alpha * ip.weight * adjugate_scale(&*trans));
                ws.direction = adj * q;
                ws.derivative = &ws.dshape * &ws.direction;
                add_mult_vwt(elmat, T::one(), &ws.shape, &ws.derivative);
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// The group convection form, where the velocity is interpolated in the element basis.
///
/// The velocity is sampled at the element nodes instead of the integration points, and each
/// test function is paired with the velocity at its own node (the group finite element
/// formulation).
pub struct GroupConvectionIntegrator<T: Real> {
    velocity: Arc<dyn VectorCoefficient<T>>,
    alpha: T,
    rules: RuleSelection<T>,
    scratch: Scratch<ConvectionWorkspace<T>>,
}

impl<T: Real> Debug for GroupConvectionIntegrator<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupConvectionIntegrator")
            .field("vdim", &self.velocity.vdim())
            .field("alpha", &self.alpha)
            .field("rules", &self.rules)
            .finish()
    }
}

impl_quadrature_builders!(GroupConvectionIntegrator);

impl<T: Real> GroupConvectionIntegrator<T> {
    pub fn new(velocity: impl VectorCoefficient<T> + 'static) -> Self {
        Self {
            velocity: Arc::new(velocity),
            alpha: T::one(),
            rules: RuleSelection::default(),
            scratch: Scratch::default(),
        }
    }

    pub fn with_alpha(mut self, alpha: T) -> Self {
        self.alpha = alpha;
        self
    }
}

impl<T: Real> BilinearFormIntegrator<T> for GroupConvectionIntegrator<T> {
    fn name(&self) -> &'static str {
        "GroupConvectionIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        let dim = element.dim();
        reset_matrix(elmat, nd, nd);
        let rule = self.rules.get(order::group_convection(element, &*trans))?;

        self.scratch.with(|ws| {
            let nodes = element.nodes();
            self.velocity
                .eval_rule(&mut ws.velocity, trans, &nodes);
            let vdim = ws.velocity.nrows();

            reset_vector(&mut ws.shape, nd);
            reset_matrix(&mut ws.dshape, nd, dim);
            for ip in rule.iter() {
                element.populate_basis(ip, &mut ws.shape);
                element.populate_basis_gradients(ip, &mut ws.dshape);
                trans.set_integration_point(ip);
                ws.grad = &ws.dshape * adjugate(trans.jacobian());

                let w = self.alpha * ip.weight * adjugate_scale(&*trans);
                for k in 0..nd {
                    let wsk = w * ws.shape[k];
                    for l in 0..nd {
                        let mut a = T::zero();
                        for s in 0..vdim {
                            a += ws.velocity[(s, k)] * ws.grad[(l, s)];
                        }
                        elmat[(k, l)] += wsk * a;
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

/// The derivative form `(Q du/dx_i, v)` for a fixed coordinate direction `i`.
///
/// This is a mixed form; the single-space element matrix uses the same element for trial
/// and test.
#[derive(Debug)]
pub struct DerivativeIntegrator<T: Real> {
    direction: usize,
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<ConvectionWorkspace<T>>,
}

impl_quadrature_builders!(DerivativeIntegrator);
impl_coefficient_builders!(DerivativeIntegrator: scalar);

impl<T: Real> DerivativeIntegrator<T> {
    pub fn new(direction: usize) -> Self {
        Self {
            direction,
            coefficients: Coefficients::default(),
            rules: RuleSelection::default(),
            scratch: Scratch::default(),
        }
    }

    pub fn direction(&self) -> usize {
        self.direction
    }
}

impl<T: Real> BilinearFormIntegrator<T> for DerivativeIntegrator<T> {
    fn name(&self) -> &'static str {
        "DerivativeIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.assemble_element_matrix2(element, element, trans, elmat)
    }

    fn assemble_element_matrix2(
        &self,
        trial: &dyn FiniteElement<T>,
        test: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let (trial_nd, test_nd) = (trial.num_dofs(), test.num_dofs());
        let dim = trial.dim();
        assert!(
            self.direction < trans.space_dim(),
            "derivative direction {} out of range for space dimension {}",
            self.direction,
            trans.space_dim()
        );
        reset_matrix(elmat, test_nd, trial_nd);
        let rule = self.rules.get(order::derivative(trial, test))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, trial_nd, dim);
            reset_vector(&mut ws.shape, test_nd);
            for ip in rule.iter() {
                trial.populate_basis_gradients(ip, &mut ws.dshape);
                test.populate_basis(ip, &mut ws.shape);
                trans.set_integration_point(ip);
                let jacobian_inverse = inverse_jacobian(trans.jacobian())?;
                ws.grad = &ws.dshape * jacobian_inverse;
                ws.derivative = ws.grad.column(self.direction).into_owned();

                let w = self.coefficients.scalar_or_one(&*trans, ip) * trans.weight() * ip.weight;
                add_mult_vwt(elmat, w, &ws.shape, &ws.derivative);
            }
            Ok(())
        })
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}
