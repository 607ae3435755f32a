use crate::coefficient::{ActiveCoefficient, Coefficients};
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, FluxIntegrator,
    RuleSelection,
};
use crate::quadrature::IntegrationPoint;
use crate::transformation::ElementTransformation;
use crate::util::{
    add_mult_abt, add_mult_acbt, add_mult_adbt, adjugate, inverse_jacobian, reset_matrix, reset_vector,
};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use nalgebra::{DMatrix, DVector};
use numeric_literals::replace_float_literals;

/// The diffusion form `(K grad u, grad v)`, where `K` is a scalar, diagonal or full matrix
/// coefficient (the identity if none is configured).
///
/// Supports single-space and mixed element matrices, the element action `K u`, the energy
/// `1/2 (K grad u, grad u)`, as well as flux recovery through
/// [`FluxIntegrator`](crate::integrators::FluxIntegrator).
///
/// On manifold elements (physical dimension larger than reference dimension) gradients are
/// pulled back with the generalized adjugate `adj(J^T J) J^T`, which scales with `W^2` instead
/// of `W`; the quadrature weight is adjusted accordingly.
#[derive(Debug)]
pub struct DiffusionIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<DiffusionWorkspace<T>>,
}

impl<T: Real> Default for DiffusionIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

define_workspace! {
    struct DiffusionWorkspace {
        dshape: DMatrix,
        dshapedxt: DMatrix,
        test_dshape: DMatrix,
        test_dshapedxt: DMatrix,
        shape: DVector,
        jacobian_inverse: DMatrix,
        coefficient: DMatrix,
        diagonal: DVector,
        pointflux: DVector,
        flux: DVector,
    }
}

impl_quadrature_builders!(DiffusionIntegrator);
impl_coefficient_builders!(DiffusionIntegrator: scalar, vector, matrix);

impl<T: Real> DiffusionIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pulls back reference gradients `dshape` into `dshapedxt = dshape adj(J)` and returns the
    /// matching quadrature weight factor, `1 / W` for square maps and `1 / W^3` otherwise.
    fn pull_back_gradients(
        trans: &dyn ElementTransformation<T>,
        dshape: &DMatrix<T>,
        dshapedxt: &mut DMatrix<T>,
    ) -> T {
        let adj = adjugate(trans.jacobian());
        reset_matrix(dshapedxt, dshape.nrows(), trans.space_dim());
        dshapedxt.gemm(T::one(), dshape, &adj, T::zero());
        let w = trans.weight();
        if trans.is_square() {
            T::one() / w
        } else {
            T::one() / (w * w * w)
        }
    }

    /// Accumulates `elmat += w a K b^T` for the active coefficient `K`.
    #[allow(clippy::too_many_arguments)]
    fn accumulate(
        &self,
        elmat: &mut DMatrix<T>,
        w: T,
        a: &DMatrix<T>,
        b: &DMatrix<T>,
        trans: &dyn ElementTransformation<T>,
        ip: &IntegrationPoint<T>,
        ws_coefficient: &mut DMatrix<T>,
        ws_diagonal: &mut DVector<T>,
    ) {
        let sdim = trans.space_dim();
        match self.coefficients.active() {
            ActiveCoefficient::Matrix(mq) => {
                reset_matrix(ws_coefficient, sdim, sdim);
                mq.eval(ws_coefficient, trans, ip);
                *ws_coefficient *= w;
                add_mult_acbt(elmat, a, ws_coefficient, b);
            }
            ActiveCoefficient::Vector(vq) => {
                reset_vector(ws_diagonal, sdim);
                vq.eval(ws_diagonal, trans, ip);
                *ws_diagonal *= w;
                add_mult_adbt(elmat, a, ws_diagonal, b);
            }
            ActiveCoefficient::Scalar(q) => {
                add_mult_abt(elmat, w * q.eval(trans, ip), a, b);
            }
            ActiveCoefficient::None => {
                add_mult_abt(elmat, w, a, b);
            }
        }
    }

    /// Applies the active coefficient to a physical flux vector in place.
    fn apply_coefficient(
        &self,
        flux: &mut DVector<T>,
        trans: &dyn ElementTransformation<T>,
        ip: &IntegrationPoint<T>,
        ws_coefficient: &mut DMatrix<T>,
        ws_diagonal: &mut DVector<T>,
    ) {
        let sdim = flux.len();
        match self.coefficients.active() {
            ActiveCoefficient::Matrix(mq) => {
                reset_matrix(ws_coefficient, sdim, sdim);
                mq.eval(ws_coefficient, trans, ip);
                *flux = &*ws_coefficient * &*flux;
            }
            ActiveCoefficient::Vector(vq) => {
                reset_vector(ws_diagonal, sdim);
                vq.eval(ws_diagonal, trans, ip);
                flux.component_mul_assign(ws_diagonal);
            }
            ActiveCoefficient::Scalar(q) => {
                *flux *= q.eval(trans, ip);
            }
            ActiveCoefficient::None => {}
        }
    }

    /// Evaluates `w (K dshapedxt^T u, dshapedxt^T u)` summed over the rule, which is shared by
    /// the element action and the energy.
    fn integrate_action(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elfun: &DVector<T>,
        mut elvect: Option<&mut DVector<T>>,
    ) -> eyre::Result<T> {
        let nd = element.num_dofs();
        let dim = element.dim();
        assert_eq!(elfun.len(), nd, "element solution must have one entry per basis function");
        let rule = self.rules.get(order::diffusion(element, element))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, nd, dim);
            let mut energy = T::zero();
            for ip in rule.iter() {
                element.populate_basis_gradients(ip, &mut ws.dshape);
                trans.set_integration_point(ip);
                let w = ip.weight * Self::pull_back_gradients(&*trans, &ws.dshape, &mut ws.dshapedxt);

                // The (unscaled) physical gradient of u, and its image under K
                ws.pointflux = ws.dshapedxt.tr_mul(elfun);
                ws.flux.clone_from(&ws.pointflux);
                self.apply_coefficient(&mut ws.flux, &*trans, ip, &mut ws.coefficient, &mut ws.diagonal);
                ws.flux *= w;

                energy += ws.flux.dot(&ws.pointflux);
                if let Some(elvect) = elvect.as_deref_mut() {
                    elvect.gemv(T::one(), &ws.dshapedxt, &ws.flux, T::one());
                }
            }
            Ok(energy)
        })
    }
}

impl<T: Real> BilinearFormIntegrator<T> for DiffusionIntegrator<T> {
    fn name(&self) -> &'static str {
        "DiffusionIntegrator"
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
        let rule = self.rules.get(order::diffusion(element, element))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, nd, dim);
            for ip in rule.iter() {
                element.populate_basis_gradients(ip, &mut ws.dshape);
                trans.set_integration_point(ip);
                let w = ip.weight * Self::pull_back_gradients(&*trans, &ws.dshape, &mut ws.dshapedxt);
                self.accumulate(
                    elmat,
                    w,
                    &ws.dshapedxt,
                    &ws.dshapedxt,
                    &*trans,
                    ip,
                    &mut ws.coefficient,
                    &mut ws.diagonal,
                );
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
        let dim = trial.dim();
        assert_eq!(dim, test.dim(), "trial and test elements must have the same dimension");
        reset_matrix(elmat, test_nd, trial_nd);
        let rule = self.rules.get(order::diffusion(trial, test))?;

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, trial_nd, dim);
            reset_matrix(&mut ws.test_dshape, test_nd, dim);
            for ip in rule.iter() {
                trial.populate_basis_gradients(ip, &mut ws.dshape);
                test.populate_basis_gradients(ip, &mut ws.test_dshape);
                trans.set_integration_point(ip);
                let w = ip.weight * Self::pull_back_gradients(&*trans, &ws.dshape, &mut ws.dshapedxt);
                Self::pull_back_gradients(&*trans, &ws.test_dshape, &mut ws.test_dshapedxt);
                self.accumulate(
                    elmat,
                    w,
                    &ws.test_dshapedxt,
                    &ws.dshapedxt,
                    &*trans,
                    ip,
                    &mut ws.coefficient,
                    &mut ws.diagonal,
                );
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
        reset_vector(elvect, element.num_dofs());
        self.integrate_action(element, trans, elfun, Some(elvect))?;
        Ok(())
    }

    #[replace_float_literals(T::from_f64(literal).unwrap())]
    fn element_energy(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elfun: &DVector<T>,
    ) -> eyre::Result<T> {
        Ok(0.5 * self.integrate_action(element, trans, elfun, None)?)
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

impl<T: Real> FluxIntegrator<T> for DiffusionIntegrator<T> {
    fn compute_element_flux(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        u: &DVector<T>,
        flux_element: &dyn FiniteElement<T>,
        flux: &mut DVector<T>,
        with_coefficient: bool,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        let dim = element.dim();
        let sdim = trans.space_dim();
        assert_eq!(u.len(), nd, "element solution must have one entry per basis function");
        let nodes = flux_element.nodes();
        let fnd = nodes.len();
        reset_vector(flux, fnd * sdim);

        self.scratch.with(|ws| {
            reset_matrix(&mut ws.dshape, nd, dim);
            for (i, ip) in nodes.iter().enumerate() {
                element.populate_basis_gradients(ip, &mut ws.dshape);
                trans.set_integration_point(ip);
                ws.jacobian_inverse = inverse_jacobian(trans.jacobian())?;

                let reference_gradient = ws.dshape.tr_mul(u);
                ws.pointflux = ws.jacobian_inverse.tr_mul(&reference_gradient);
                if with_coefficient {
                    self.apply_coefficient(&mut ws.pointflux, &*trans, ip, &mut ws.coefficient, &mut ws.diagonal);
                }
                for k in 0..sdim {
                    flux[k * fnd + i] = ws.pointflux[k];
                }
            }
            Ok(())
        })
    }

    fn compute_flux_energy(
        &self,
        flux_element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        flux: &DVector<T>,
    ) -> eyre::Result<T> {
        let nd = flux_element.num_dofs();
        let sdim = trans.space_dim();
        assert_eq!(flux.len(), nd * sdim, "flux must have space_dim components per node");
        let rule = self.rules.get(order::flux_energy(flux_element))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape, nd);
            reset_vector(&mut ws.pointflux, sdim);
            let mut energy = T::zero();
            for ip in rule.iter() {
                flux_element.populate_basis(ip, &mut ws.shape);
                trans.set_integration_point(ip);
                for k in 0..sdim {
                    ws.pointflux[k] = flux.rows(k * nd, nd).dot(&ws.shape);
                }

                let w = trans.weight() * ip.weight;
                ws.flux.clone_from(&ws.pointflux);
                self.apply_coefficient(&mut ws.flux, &*trans, ip, &mut ws.coefficient, &mut ws.diagonal);
                energy += w * ws.flux.dot(&ws.pointflux);
            }
            Ok(energy)
        })
    }
}
