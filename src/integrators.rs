//! Bilinear form integrators.
//!
//! An integrator computes the local matrix of a weak form on a single element or face. All
//! integrators implement [`BilinearFormIntegrator`], which exposes the assembly operations as
//! methods with panicking defaults: each concrete integrator overrides the subset that makes
//! sense for its weak form.
//!
//! Output buffers are resized by the integrator and zeroed before accumulation. Numerical
//! failures (such as a singular Jacobian when an inverse is required) are returned as errors,
//! while misuse (unsupported operations, invalid configurations) panics.
use crate::element::FiniteElement;
use crate::quadrature::{GaussRules, IntegrationRule, QuadratureRuleProvider};
use crate::transformation::{ElementTransformation, FaceTransformation};
use crate::workspace::ScratchPolicy;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

mod composite;
mod convection;
mod curl;
mod dg;
mod diffusion;
mod divergence;
mod elasticity;
mod flux;
mod mass;
pub mod order;
mod vector_mass;

pub use composite::*;
pub use convection::*;
pub use curl::*;
pub use dg::*;
pub use diffusion::*;
pub use divergence::*;
pub use elasticity::*;
pub use flux::*;
pub use mass::*;
pub use order::RuleRequest;
pub use vector_mass::*;

/// The assembly operations of a bilinear form integrator.
pub trait BilinearFormIntegrator<T: Real>: Send + Sync {
    /// A name identifying the integrator kind in diagnostics.
    fn name(&self) -> &'static str;

    /// Assembles the `num_dofs x num_dofs` element matrix for a single space.
    fn assemble_element_matrix(
        &self,
        _element: &dyn FiniteElement<T>,
        _trans: &mut dyn ElementTransformation<T>,
        _elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        unsupported(self.name(), "assemble_element_matrix")
    }

    /// Assembles the `test_dofs x trial_dofs` element matrix for a pair of spaces.
    fn assemble_element_matrix2(
        &self,
        _trial: &dyn FiniteElement<T>,
        _test: &dyn FiniteElement<T>,
        _trans: &mut dyn ElementTransformation<T>,
        _elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        unsupported(self.name(), "assemble_element_matrix2")
    }

    /// Assembles the matrix of a face shared by `el1` and, for interior faces, `el2`.
    ///
    /// The degrees of freedom of `el1` come first. On boundary faces (`el2` is `None`) the result
    /// only contains the block of `el1`.
    fn assemble_face_matrix(
        &self,
        _el1: &dyn FiniteElement<T>,
        _el2: Option<&dyn FiniteElement<T>>,
        _trans: &mut dyn FaceTransformation<T>,
        _elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        unsupported(self.name(), "assemble_face_matrix")
    }

    /// Assembles the matrix coupling a trace space on a face (trial) to the volume spaces of the
    /// adjacent elements (test).
    fn assemble_face_matrix_mixed(
        &self,
        _trace: &dyn FiniteElement<T>,
        _test1: &dyn FiniteElement<T>,
        _test2: Option<&dyn FiniteElement<T>>,
        _trans: &mut dyn FaceTransformation<T>,
        _elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        unsupported(self.name(), "assemble_face_matrix_mixed")
    }

    /// Computes the action of the element matrix on the element solution `elfun`.
    fn assemble_element_vector(
        &self,
        _element: &dyn FiniteElement<T>,
        _trans: &mut dyn ElementTransformation<T>,
        _elfun: &DVector<T>,
        _elvect: &mut DVector<T>,
    ) -> eyre::Result<()> {
        unsupported(self.name(), "assemble_element_vector")
    }

    /// Computes the energy of the element solution `elfun`.
    fn element_energy(
        &self,
        _element: &dyn FiniteElement<T>,
        _trans: &mut dyn ElementTransformation<T>,
        _elfun: &DVector<T>,
    ) -> eyre::Result<T> {
        unsupported(self.name(), "element_energy")
    }

    /// Changes how the integrator obtains its scratch buffers. Composites forward the policy to
    /// their children.
    fn set_scratch_policy(&mut self, policy: ScratchPolicy);
}

fn unsupported(integrator: &str, method: &str) -> ! {
    panic!("{}::{} is not supported", integrator, method)
}

/// Selects the integration rule for each call: an explicitly configured rule if there is one,
/// otherwise a rule from the provider according to the integrator's order formula.
#[derive(Clone)]
pub struct RuleSelection<T: Real> {
    rule: Option<Arc<IntegrationRule<T>>>,
    provider: Arc<dyn QuadratureRuleProvider<T>>,
}

impl<T: Real> Debug for RuleSelection<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSelection")
            .field("explicit_rule", &self.rule.as_ref().map(|rule| rule.len()))
            .finish_non_exhaustive()
    }
}

impl<T: Real> Default for RuleSelection<T> {
    fn default() -> Self {
        Self {
            rule: None,
            provider: Arc::new(GaussRules::new()),
        }
    }
}

impl<T: Real> RuleSelection<T> {
    pub fn set_rule(&mut self, rule: IntegrationRule<T>) {
        self.rule = Some(Arc::new(rule));
    }

    pub fn set_provider(&mut self, provider: Arc<dyn QuadratureRuleProvider<T>>) {
        self.provider = provider;
    }

    pub fn explicit_rule(&self) -> Option<&IntegrationRule<T>> {
        self.rule.as_deref()
    }

    pub fn get(&self, request: RuleRequest) -> eyre::Result<Arc<IntegrationRule<T>>> {
        if let Some(rule) = &self.rule {
            return Ok(Arc::clone(rule));
        }
        if request.refined {
            self.provider
                .refined_rule(request.geometry, request.order)
        } else {
            self.provider.rule(request.geometry, request.order)
        }
    }
}

/// Implements the builder methods shared by all quadrature-based integrators.
///
/// The integrator must have fields `rules: RuleSelection<T>` and `scratch: Scratch<_>`.
macro_rules! impl_quadrature_builders {
    ($integrator:ident) => {
        impl<T: $crate::Real> $integrator<T> {
            /// Uses `rule` for every call instead of selecting one by order.
            pub fn with_integration_rule(mut self, rule: $crate::quadrature::IntegrationRule<T>) -> Self {
                self.rules.set_rule(rule);
                self
            }

            /// Uses `provider` to look up integration rules.
            pub fn with_rule_provider(
                mut self,
                provider: std::sync::Arc<dyn $crate::quadrature::QuadratureRuleProvider<T>>,
            ) -> Self {
                self.rules.set_provider(provider);
                self
            }

            pub fn with_scratch_policy(mut self, policy: $crate::workspace::ScratchPolicy) -> Self {
                self.scratch.set_policy(policy);
                self
            }

            pub fn scratch_policy(&self) -> $crate::workspace::ScratchPolicy {
                self.scratch.policy()
            }
        }
    };
}

/// Implements `with_coefficient` (and optionally the vector and matrix variants) for an
/// integrator with a `coefficients: Coefficients<T>` field.
macro_rules! impl_coefficient_builders {
    ($integrator:ident: scalar $(, $kind:ident)*) => {
        impl<T: $crate::Real> $integrator<T> {
            pub fn with_coefficient(mut self, coefficient: impl $crate::coefficient::Coefficient<T> + 'static) -> Self {
                self.coefficients.set_scalar(std::sync::Arc::new(coefficient));
                self
            }
        }
        $($crate::integrators::impl_coefficient_builders!(@ $integrator, $kind);)*
    };
    (@ $integrator:ident, vector) => {
        impl<T: $crate::Real> $integrator<T> {
            pub fn with_vector_coefficient(
                mut self,
                coefficient: impl $crate::coefficient::VectorCoefficient<T> + 'static,
            ) -> Self {
                self.coefficients.set_vector(std::sync::Arc::new(coefficient));
                self
            }
        }
    };
    (@ $integrator:ident, matrix) => {
        impl<T: $crate::Real> $integrator<T> {
            pub fn with_matrix_coefficient(
                mut self,
                coefficient: impl $crate::coefficient::MatrixCoefficient<T> + 'static,
            ) -> Self {
                self.coefficients.set_matrix(std::sync::Arc::new(coefficient));
                self
            }
        }
    };
}

pub(crate) use impl_coefficient_builders;
pub(crate) use impl_quadrature_builders;
