use crate::coefficient::{ActiveCoefficient, Coefficients};
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::{
    impl_coefficient_builders, impl_quadrature_builders, order, BilinearFormIntegrator, RuleSelection,
};
use crate::quadrature::IntegrationPoint;
use crate::transformation::ElementTransformation;
use crate::util::{add_block, add_mult_abt, add_mult_acbt, add_mult_adbt, add_mult_vwt, reset_matrix, reset_vector};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use nalgebra::{DMatrix, DVector};

define_workspace! {
    struct VectorMassWorkspace {
        shape: DVector,
        test_shape: DVector,
        block: DMatrix,
        vshape: DMatrix,
        test_vshape: DMatrix,
        coefficient: DMatrix,
        diagonal: DVector,
    }
}

/// The mass form `(Q u, v)` for vector fields discretized component-wise with a scalar element.
///
/// The coefficient may be a scalar, a vector (one factor per component) or a matrix coupling
/// the components. The number of components is the dimension of the vector or matrix
/// coefficient if one is set, and the reference dimension of the element otherwise (so a
/// surface element embedded in 3D carries two components).
/// Degrees of freedom are ordered by component.
#[derive(Debug)]
pub struct VectorMassIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    extra_order: usize,
    rules: RuleSelection<T>,
    scratch: Scratch<VectorMassWorkspace<T>>,
}

impl<T: Real> Default for VectorMassIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            extra_order: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(VectorMassIntegrator);
impl_coefficient_builders!(VectorMassIntegrator: scalar, vector, matrix);

impl<T: Real> VectorMassIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the default quadrature order by `extra_order`, to account for the polynomial
    /// degree of the coefficient.
    pub fn with_extra_order(mut self, extra_order: usize) -> Self {
        self.extra_order = extra_order;
        self
    }

    fn vdim(&self, element: &dyn FiniteElement<T>) -> usize {
        match self.coefficients.active() {
            ActiveCoefficient::Vector(vq) => vq.vdim(),
            ActiveCoefficient::Matrix(mq) => mq.vdim(),
            _ => element.dim(),
        }
    }

    /// Adds the weighted scalar mass block `w * block` to `elmat` for every component pair
    /// coupled by the coefficient.
    #[allow(clippy::too_many_arguments)]
    fn add_component_blocks(
        &self,
        elmat: &mut DMatrix<T>,
        block: &DMatrix<T>,
        w: T,
        vdim: usize,
        trans: &dyn ElementTransformation<T>,
        ip: &IntegrationPoint<T>,
        ws_coefficient: &mut DMatrix<T>,
        ws_diagonal: &mut DVector<T>,
    ) {
        let (rows, cols) = block.shape();
        match self.coefficients.active() {
            ActiveCoefficient::Vector(vq) => {
                reset_vector(ws_diagonal, vdim);
                vq.eval(ws_diagonal, trans, ip);
                for k in 0..vdim {
                    add_block(elmat, w * ws_diagonal[k], block, rows * k, cols * k);
                }
            }
            ActiveCoefficient::Matrix(mq) => {
                reset_matrix(ws_coefficient, vdim, vdim);
                mq.eval(ws_coefficient, trans, ip);
                for i in 0..vdim {
                    for j in 0..vdim {
                        add_block(elmat, w * ws_coefficient[(i, j)], block, rows * i, cols * j);
                    }
                }
            }
            _ => {
                let w = w * self.coefficients.scalar_or_one(trans, ip);
                for k in 0..vdim {
                    add_block(elmat, w, block, rows * k, cols * k);
                }
            }
        }
    }
}

impl<T: Real> BilinearFormIntegrator<T> for VectorMassIntegrator<T> {
    fn name(&self) -> &'static str {
        "VectorMassIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        let vdim = self.vdim(element);
        reset_matrix(elmat, vdim * nd, vdim * nd);
        let rule = self
            .rules
            .get(order::vector_mass(element, &*trans, self.extra_order))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape, nd);
            for ip in rule.iter() {
                element.populate_basis(ip, &mut ws.shape);
                trans.set_integration_point(ip);
                reset_matrix(&mut ws.block, nd, nd);
                add_mult_vwt(&mut ws.block, T::one(), &ws.shape, &ws.shape);

                let w = ip.weight * trans.weight();
                self.add_component_blocks(
                    elmat,
                    &ws.block,
                    w,
                    vdim,
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
        let vdim = self.vdim(trial);
        reset_matrix(elmat, vdim * test_nd, vdim * trial_nd);
        let rule = self
            .rules
            .get(order::vector_mass_mixed(trial, test, &*trans, self.extra_order))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.shape, trial_nd);
            reset_vector(&mut ws.test_shape, test_nd);
            for ip in rule.iter() {
                trial.populate_basis(ip, &mut ws.shape);
                test.populate_basis(ip, &mut ws.test_shape);
                trans.set_integration_point(ip);
                reset_matrix(&mut ws.block, test_nd, trial_nd);
                add_mult_vwt(&mut ws.block, T::one(), &ws.test_shape, &ws.shape);

                let w = ip.weight * trans.weight();
                self.add_component_blocks(
                    elmat,
                    &ws.block,
                    w,
                    vdim,
                    &*trans,
                    ip,
                    &mut ws.coefficient,
                    &mut ws.diagonal,
                );
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}

/// The mass form `(Q u, v)` for vector-valued (H(curl) or H(div)) elements.
///
/// The mixed form accepts either two vector-valued elements, or a vector-valued trial element
/// together with a scalar test element. In the latter case the result has `dim * test_dofs`
/// rows, one block of test functions per component, only scalar coefficients are supported and
/// the transformation must be square.
#[derive(Debug)]
pub struct VectorFEMassIntegrator<T: Real> {
    coefficients: Coefficients<T>,
    rules: RuleSelection<T>,
    scratch: Scratch<VectorMassWorkspace<T>>,
}

impl<T: Real> Default for VectorFEMassIntegrator<T> {
    fn default() -> Self {
        Self {
            coefficients: Default::default(),
            rules: Default::default(),
            scratch: Default::default(),
        }
    }
}

impl_quadrature_builders!(VectorFEMassIntegrator);
impl_coefficient_builders!(VectorFEMassIntegrator: scalar, vector, matrix);

impl<T: Real> VectorFEMassIntegrator<T> {
    pub fn new() -> Self {
        Self::default()
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
            ActiveCoefficient::Scalar(q) => add_mult_abt(elmat, w * q.eval(trans, ip), a, b),
            ActiveCoefficient::None => add_mult_abt(elmat, w, a, b),
        }
    }
}

impl<T: Real> BilinearFormIntegrator<T> for VectorFEMassIntegrator<T> {
    fn name(&self) -> &'static str {
        "VectorFEMassIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        let nd = element.num_dofs();
        reset_matrix(elmat, nd, nd);
        let rule = self.rules.get(order::vector_fe_mass(element, &*trans))?;

        self.scratch.with(|ws| {
            for ip in rule.iter() {
                trans.set_integration_point(ip);
                element.populate_vector_basis(&*trans, &mut ws.vshape);
                let w = ip.weight * trans.weight();
                self.accumulate(
                    elmat,
                    w,
                    &ws.vshape,
                    &ws.vshape,
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
        let dim = test.dim();
        let scalar_test = !test.map_type().is_vector();
        if scalar_test {
            self.coefficients
                .assert_scalar_only(self.name(), "assemble_element_matrix2");
            assert_eq!(
                trans.space_dim(),
                dim,
                "VectorFEMassIntegrator::assemble_element_matrix2 with a scalar test element requires a square transformation"
            );
            reset_matrix(elmat, dim * test_nd, trial_nd);
        } else {
            reset_matrix(elmat, test_nd, trial_nd);
        }
        let rule = self
            .rules
            .get(order::vector_fe_mass_mixed(trial, test, &*trans))?;

        self.scratch.with(|ws| {
            reset_vector(&mut ws.test_shape, test_nd);
            for ip in rule.iter() {
                trans.set_integration_point(ip);
                trial.populate_vector_basis(&*trans, &mut ws.vshape);
                let w = ip.weight * trans.weight();

                if scalar_test {
                    test.populate_basis(ip, &mut ws.test_shape);
                    let w = w * self.coefficients.scalar_or_one(&*trans, ip);
                    for d in 0..dim {
                        for k in 0..trial_nd {
                            let wv = w * ws.vshape[(k, d)];
                            for j in 0..test_nd {
                                elmat[(d * test_nd + j, k)] += wv * ws.test_shape[j];
                            }
                        }
                    }
                } else {
                    test.populate_vector_basis(&*trans, &mut ws.test_vshape);
                    self.accumulate(
                        elmat,
                        w,
                        &ws.test_vshape,
                        &ws.vshape,
                        &*trans,
                        ip,
                        &mut ws.coefficient,
                        &mut ws.diagonal,
                    );
                }
            }
        });
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
    }
}
