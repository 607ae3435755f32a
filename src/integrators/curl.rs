use crate::coefficient::Coefficients;
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, RuleSelection,
};
use crate::transformation::ElementTransformation;
use crate::util::{add_mult_a_aat, add_mult_abt, adjugate, grad_to_curl, reset_matrix};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;

define_workspace! {
    struct CurlWorkspace {
        curl: DMatrix,
        curl_mapped: DMatrix,
        dshape: DMatrix,
        grad: DMatrix,
        vshape: DMatrix,
    }
}

/// Maps reference curls of an H(curl) element to physical curls scaled by `det(J)`.
///
/// In 3D the curl transforms as `J curl_hat / det(J)`, so `curl J^T` gives the scaled rows.
/// In 2D the scalar curl transforms as `curl_hat / det(J)` and is used unchanged.
fn map_curl<T: Real>(curl: &DMatrix<T>, trans: &dyn ElementTransformation<T>, mapped: &mut DMatrix<T>) {
    if curl.ncols() == 3 {
        reset_matrix(mapped, curl.nrows(), 3);
        mapped.gemm(T::one(), curl, &trans.jacobian().transpose(), T::zero());
    } else {
        mapped.clone_from(curl);
    }
}

/// The curl-curl form `(Q curl u, curl v)` for H(curl) elements.
#[derive(Debug)]
pub struct CurlCurlIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<CurlWorkspace<T>>,
}

impl<T: Real> Default for CurlCurlIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(CurlCurlIntegrator);
impl_coefficient_builders!(CurlCurlIntegrator: scalar);

impl<T: Real> CurlCurlIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for CurlCurlIntegrator<T> {
    fn name(&self) -> &'static str {
        "CurlCurlIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        reset_matrix(elmat, nd, nd);
        let rule = self.rules.get(order::curl_curl(element))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.curl, nd, element.curl_dim());
            for ip in rule.iter() {
                element.populate_curl_basis(ip, &mut ws.curl);
                trans.set_integration_point(ip);
                map_curl(&ws.curl, &*trans, &mut ws.curl_mapped);

                let w = ip.weight / trans.weight() * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_a_aat(elmat, w, &ws.curl_mapped);
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// The curl-curl form `(Q curl u, curl v)` for vector fields discretized component-wise with a
/// scalar H1 element.
///
/// Degrees of freedom are ordered by component: entry `k n + i` belongs to basis function `i`
/// of component `k`. The element must be two- or three-dimensional.
#[derive(Debug)]
pub struct VectorCurlCurlIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<CurlWorkspace<T>>,
}

impl<T: Real> Default for VectorCurlCurlIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(VectorCurlCurlIntegrator);
impl_coefficient_builders!(VectorCurlCurlIntegrator: scalar);

impl<T: Real> VectorCurlCurlIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for VectorCurlCurlIntegrator<T> {
    fn name(&self) -> &'static str {
        "VectorCurlCurlIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        let dim = element.dim();
        reset_matrix(elmat, dim * nd, dim * nd);
        let rule = self.rules.get(order::vector_curl_curl(element, &*trans))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, nd, dim);
            for ip in rule.iter() {
                element.populate_basis_gradients(ip, &mut ws.dshape);
                trans.set_integration_point(ip);
                ws.grad = &ws.dshape * adjugate(trans.jacobian());
                grad_to_curl(&ws.grad, &mut ws.curl);

                let w = ip.weight / trans.weight() * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_a_aat(elmat, w, &ws.curl);
            }
        });
        Ok(())
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn element_energy(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elfun: &DVector<T>,
    ) -> eyre::Result<T> {
        let nd = element.num_dofs();
        let dim = element.dim();
        assert_eq!(elfun.len(), dim * nd, "element solution must have dim components per basis function");
        let rule = self.rules.get(order::vector_curl_curl(element, &*trans))?;
        let u = DMatrix::from_column_slice(nd, dim, elfun.as_slice());

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, nd, dim);
            let mut energy = 0.0;
            for ip in rule.iter() {
                element.populate_basis_gradients(ip, &mut ws.dshape);
                trans.set_integration_point(ip);
                // grad(c, d) is det(J) times the derivative of component c in direction d
                ws.grad = u.tr_mul(&ws.dshape) * adjugate(trans.jacobian());
                let g = &ws.grad;
                let curl_squared = match dim {
                    2 => (g[(0, 1)] - g[(1, 0)]).powi(2),
                    3 => {
                        (g[(2, 1)] - g[(1, 2)]).powi(2)
                            + (g[(0, 2)] - g[(2, 0)]).powi(2)
                            + (g[(1, 0)] - g[(0, 1)]).powi(2)
                    }
                    _ => panic!("curl is only defined in two or three dimensions, got dimension {}", dim),
                };

                let w = ip.weight / trans.weight() * self.coefficients.scalar_or_one(&*trans, ip);
                energy += w * curl_squared;
            }
            Ok(0.5 * energy)
        })
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// The mixed form `(Q curl u, v)` with an H(curl) trial element and a vector-valued test
/// element, in three dimensions.
#[derive(Debug)]
pub struct VectorFECurlIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<CurlWorkspace<T>>,
}

impl<T: Real> Default for VectorFECurlIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(VectorFECurlIntegrator);
impl_coefficient_builders!(VectorFECurlIntegrator: scalar);

impl<T: Real> VectorFECurlIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Real> BilinearFormIntegrator<T> for VectorFECurlIntegrator<T> {
    fn name(&self) -> &'static str {
        "VectorFECurlIntegrator"
    }

    fn assemble_element_matrix2(
        &self,
        trial: &dyn FiniteElement<T>,
        test: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        assert_eq!(trial.dim(), 3, "VectorFECurlIntegrator requires three-dimensional elements");
        let (trial_nd, test_nd) = (trial.num_dofs(), test.num_dofs());
        reset_matrix(elmat, test_nd, trial_nd);
        let rule = self.rules.get(order::vector_fe_curl(trial, test))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.curl, trial_nd, 3);
            for ip in rule.iter() {
                trans.set_integration_point(ip);
                trial.populate_curl_basis(ip, &mut ws.curl);
                map_curl(&ws.curl, &*trans, &mut ws.curl_mapped);
                test.populate_vector_basis(&*trans, &mut ws.vshape);

                // The mapped curl carries a factor det(J), the volume element only |det(J)|
                let w = ip.weight * trans.orientation() * self.coefficients.scalar_or_one(&*trans, ip);
                add_mult_abt(elmat, w, &ws.vshape, &ws.curl_mapped);
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}
