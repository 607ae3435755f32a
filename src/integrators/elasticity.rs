use crate::coefficient::{Coefficient, Coefficients};
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, RuleSelection,
};
use crate::quadrature::IntegrationPoint;
use crate::transformation::ElementTransformation;
use crate::util::{add_block, add_mult_abt, add_mult_vwt, grad_to_div, inverse_jacobian, is_zero, reset_matrix};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

define_workspace! {
    struct ElasticityWorkspace {
        dshape: DMatrix,
        gshape: DMatrix,
        block: DMatrix,
        divergence: DVector,
    }
}

/// Computes physical gradients `gshape = dshape J^{-1}` of the element at `ip`, and the scalar
/// gradient block `gshape gshape^T`.
fn physical_gradients<T: Real>(
    element: &dyn FiniteElement<T>,
    trans: &mut dyn ElementTransformation<T>,
    ip: &IntegrationPoint<T>,
    ws: &mut ElasticityWorkspace<T>,
) -> eyre::Result<()> {
    let nd = element.num_dofs();
    element.populate_basis_gradients(ip, &mut ws.dshape);
    trans.set_integration_point(ip);
    ws.gshape = &ws.dshape * inverse_jacobian(trans.jacobian())?;
    reset_matrix(&mut ws.block, nd, nd);
    add_mult_abt(&mut ws.block, T::one(), &ws.gshape, &ws.gshape);
    Ok(())
}

/// The vector Laplacian `(Q grad u, grad v)` applied to each component of a vector field
/// discretized component-wise with a scalar element.
///
/// The result is block diagonal with one scalar diffusion block per reference dimension of the
/// element.
#[derive(Debug)]
pub struct VectorDiffusionIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<ElasticityWorkspace<T>>,
}

impl<T: Real> Default for VectorDiffusionIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(VectorDiffusionIntegrator);
impl_coefficient_builders!(VectorDiffusionIntegrator: scalar);

impl<T: Real> VectorDiffusionIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for VectorDiffusionIntegrator<T> {
    fn name(&self) -> &'static str {
        "VectorDiffusionIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        let vdim = element.dim();
        reset_matrix(elmat, vdim * nd, vdim * nd);
        let rule = self.rules.get(order::vector_diffusion(element, &*trans))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, nd, element.dim());
            for ip in rule.iter() {
                physical_gradients(element, trans, ip, ws)?;
                let w = ip.weight * trans.weight() * self.coefficients.scalar_or_one(&*trans, ip);
                for d in 0..vdim {
                    add_block(elmat, w, &ws.block, nd * d, nd * d);
                }
            }
            Ok(())
        })
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// The source of the Lamé parameters of an [`ElasticityIntegrator`].
#[derive(Clone)]
pub enum LameParameters<T: Real> {
    /// `lambda` and `mu` given by two independent coefficients.
    Independent {
        lambda: Arc<dyn Coefficient<T>>,
        mu: Arc<dyn Coefficient<T>>,
    },
    /// `lambda = lambda_factor * c` and `mu = mu_factor * c` for a single coefficient `c`.
    Scaled {
        coefficient: Arc<dyn Coefficient<T>>,
        lambda_factor: T,
        mu_factor: T,
    },
}

impl<T: Real> Debug for LameParameters<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Independent { .. } => f.debug_struct("Independent").finish_non_exhaustive(),
            Self::Scaled {
                lambda_factor,
                mu_factor,
                ..
            } => f
                .debug_struct("Scaled")
                .field("lambda_factor", lambda_factor)
                .field("mu_factor", mu_factor)
                .finish_non_exhaustive(),
        }
    }
}

impl<T: Real> LameParameters<T> {
    /// Evaluates `(lambda, mu)` at the current point of `trans`.
    pub fn eval(&self, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>) -> (T, T) {
        match self {
            Self::Independent { lambda, mu } => (lambda.eval(trans, ip), mu.eval(trans, ip)),
            Self::Scaled {
                coefficient,
                lambda_factor,
                mu_factor,
            } => {
                let c = coefficient.eval(trans, ip);
                (*lambda_factor * c, *mu_factor * c)
            }
        }
    }
}

/// Isotropic linear elasticity, `lambda (div u, div v) + 2 mu (eps(u), eps(v))`.
///
/// Degrees of freedom are ordered by component. Terms whose Lamé parameter vanishes at an
/// integration point are skipped.
#[derive(Debug)]
pub struct ElasticityIntegrator<T: Real> {
    parameters: LameParameters<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<ElasticityWorkspace<T>>,
}

impl_quadrature_builders!(ElasticityIntegrator);

impl<T: Real> ElasticityIntegrator<T> {
    pub fn new(lambda: impl Coefficient<T> + 'static, mu: impl Coefficient<T> + 'static) -> Self {
        Self::from_parameters(LameParameters::Independent {
            lambda: Arc::new(lambda),
            mu: Arc::new(mu),
        })
    }

    /// Derives both Lamé parameters from a single coefficient scaled by fixed factors.
    pub fn scaled(coefficient: impl Coefficient<T> + 'static, lambda_factor: T, mu_factor: T) -> Self {
        Self::from_parameters(LameParameters::Scaled {
            coefficient: Arc::new(coefficient),
            lambda_factor,
            mu_factor,
        })
    }

    pub fn from_parameters(parameters: LameParameters<T>) -> Self {
        Self {
            parameters,
            rules: RuleSelection::default(),
            scratch: Scratch::default(),
        }
    }

    pub fn parameters(&self) -> &LameParameters<T> {
        &self.parameters
    }
}

impl<T: Real> BilinearFormIntegrator<T> for ElasticityIntegrator<T> {
    fn name(&self) -> &'static str {
        "ElasticityIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        let dim = element.dim();
        assert_eq!(trans.space_dim(), dim, "ElasticityIntegrator requires a square transformation");
        reset_matrix(elmat, dim * nd, dim * nd);
        let rule = self.rules.get(order::elasticity(element, &*trans))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, nd, dim);
            for ip in rule.iter() {
                physical_gradients(element, trans, ip, ws)?;
                grad_to_div(&ws.gshape, &mut ws.divergence);

                let w = ip.weight * trans.weight();
                let (lambda, mu) = self.parameters.eval(&*trans, ip);

                if !is_zero(lambda) {
                    add_mult_vwt(elmat, lambda * w, &ws.divergence, &ws.divergence);
                }

                if !is_zero(mu) {
                    let mw = mu * w;
                    for d in 0..dim {
                        add_block(elmat, mw, &ws.block, nd * d, nd * d);
                    }
                    for i in 0..dim {
                        for j in 0..dim {
                            for k in 0..nd {
                                let g_kj = mw * ws.gshape[(k, j)];
                                for l in 0..nd {
                                    elmat[(nd * i + k, nd * j + l)] += g_kj * ws.gshape[(l, i)];
                                }
                            }
                        }
                    }
                }
            }
            Ok(())
        })
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}
