//! Integrators that wrap or combine other integrators.
use crate::define_workspace;
use crate::element::FiniteElement;
use crate::integrators::BilinearFormIntegrator;
use crate::transformation::{ElementTransformation, FaceTransformation};
use crate::util::{lump, reset_matrix};
use crate::workspace::{Scratch, ScratchPolicy};
use crate::Real;
use eyre::eyre;
use log::trace;
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};

/// A handle to a wrapped integrator that either owns it or borrows it mutably.
///
/// Owned integrators are dropped together with the composite. Borrowed integrators remain
/// available to the caller once the composite is gone.
pub enum IntegratorHandle<'a, T: Real> {
    Owned(Box<dyn BilinearFormIntegrator<T> + 'a>),
    Borrowed(&'a mut dyn BilinearFormIntegrator<T>),
}

impl<'a, T: Real> IntegratorHandle<'a, T> {
    pub fn owned(integrator: impl BilinearFormIntegrator<T> + 'a) -> Self {
        Self::Owned(Box::new(integrator))
    }

    pub fn borrowed(integrator: &'a mut dyn BilinearFormIntegrator<T>) -> Self {
        Self::Borrowed(integrator)
    }

    pub fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub fn get(&self) -> &dyn BilinearFormIntegrator<T> {
        match self {
            Self::Owned(integrator) => integrator.as_ref(),
            Self::Borrowed(integrator) => &**integrator,
        }
    }

    pub fn get_mut(&mut self) -> &mut dyn BilinearFormIntegrator<T> {
        match self {
            Self::Owned(integrator) => integrator.as_mut(),
            Self::Borrowed(integrator) => &mut **integrator,
        }
    }
}

impl<'a, T: Real> Debug for IntegratorHandle<'a, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let kind = if self.is_owned() { "Owned" } else { "Borrowed" };
        f.debug_tuple(kind).field(&self.get().name()).finish()
    }
}

define_workspace! {
    struct CompositeWorkspace {
        matrix: DMatrix,
        vector: DVector,
    }
}

/// Assembles the transpose of the wrapped integrator's matrices.
///
/// For mixed forms the roles of trial and test elements are swapped before delegating, so
/// that the result is `test_dofs x trial_dofs` for the arguments given.
#[derive(Debug)]
pub struct TransposeIntegrator<'a, T: Real> {
    inner: IntegratorHandle<'a, T>,
    scratch: Scratch<CompositeWorkspace<T>>,
}

impl<'a, T: Real> TransposeIntegrator<'a, T> {
    pub fn new(inner: IntegratorHandle<'a, T>) -> Self {
        Self {
            inner,
            scratch: Scratch::default(),
        }
    }

    pub fn inner(&self) -> &dyn BilinearFormIntegrator<T> {
        self.inner.get()
    }
}

fn transpose_into<T: Real>(matrix: &DMatrix<T>, output: &mut DMatrix<T>) {
    reset_matrix(output, matrix.ncols(), matrix.nrows());
    matrix.transpose_to(output);
}

impl<'a, T: Real> BilinearFormIntegrator<T> for TransposeIntegrator<'a, T> {
    fn name(&self) -> &'static str {
        "TransposeIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.scratch.with(|ws| {
            self.inner
                .get()
                .assemble_element_matrix(element, trans, &mut ws.matrix)?;
            transpose_into(&ws.matrix, elmat);
            Ok(())
        })
    }

    fn assemble_element_matrix2(
        &self,
        trial: &dyn FiniteElement<T>,
        test: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.scratch.with(|ws| {
            self.inner
                .get()
                .assemble_element_matrix2(test, trial, trans, &mut ws.matrix)?;
            transpose_into(&ws.matrix, elmat);
            Ok(())
        })
    }

    fn assemble_face_matrix(
        &self,
        el1: &dyn FiniteElement<T>,
        el2: Option<&dyn FiniteElement<T>>,
        trans: &mut dyn FaceTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.scratch.with(|ws| {
            self.inner
                .get()
                .assemble_face_matrix(el1, el2, trans, &mut ws.matrix)?;
            transpose_into(&ws.matrix, elmat);
            Ok(())
        })
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
        self.inner.get_mut().set_scratch_policy(policy);
    }
}

/// Replaces the wrapped integrator's element matrix by the diagonal matrix of its row sums.
#[derive(Debug)]
pub struct LumpedIntegrator<'a, T: Real> {
    inner: IntegratorHandle<'a, T>,
}

impl<'a, T: Real> LumpedIntegrator<'a, T> {
    pub fn new(inner: IntegratorHandle<'a, T>) -> Self {
        Self { inner }
    }
}

impl<'a, T: Real> BilinearFormIntegrator<T> for LumpedIntegrator<'a, T> {
    fn name(&self) -> &'static str {
        "LumpedIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.inner
            .get()
            .assemble_element_matrix(element, trans, elmat)?;
        lump(elmat);
        Ok(())
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.inner.get_mut().set_scratch_policy(policy);
    }
}

/// Replaces the wrapped integrator's element matrix by its inverse.
///
/// Typically combined with [`LumpedIntegrator`] or a mass integrator with nodal quadrature to
/// obtain inverse mass matrices element by element.
#[derive(Debug)]
pub struct InverseIntegrator<'a, T: Real> {
    inner: IntegratorHandle<'a, T>,
}

impl<'a, T: Real> InverseIntegrator<'a, T> {
    pub fn new(inner: IntegratorHandle<'a, T>) -> Self {
        Self { inner }
    }
}

impl<'a, T: Real> BilinearFormIntegrator<T> for InverseIntegrator<'a, T> {
    fn name(&self) -> &'static str {
        "InverseIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.inner
            .get()
            .assemble_element_matrix(element, trans, elmat)?;
        assert!(elmat.is_square(), "only square element matrices can be inverted");
        if elmat.try_inverse_mut() {
            Ok(())
        } else {
            Err(eyre!("Element matrix is not invertible"))
        }
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.inner.get_mut().set_scratch_policy(policy);
    }
}

/// Sums the contributions of several integrators.
///
/// All operations are forwarded to every child in order. The first child writes directly into
/// the output; the others assemble into scratch buffers that are then added. Assembling with
/// no children is a configuration error and panics.
#[derive(Debug)]
pub struct SumIntegrator<'a, T: Real> {
    children: Vec<IntegratorHandle<'a, T>>,
    scratch: Scratch<CompositeWorkspace<T>>,
}

impl<'a, T: Real> Default for SumIntegrator<'a, T> {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            scratch: Scratch::default(),
        }
    }
}

impl<'a, T: Real> SumIntegrator<'a, T> {
    pub fn new(children: Vec<IntegratorHandle<'a, T>>) -> Self {
        Self {
            children,
            ..Self::default()
        }
    }

    pub fn with_integrator(mut self, integrator: IntegratorHandle<'a, T>) -> Self {
        self.push(integrator);
        self
    }

    pub fn push(&mut self, integrator: IntegratorHandle<'a, T>) {
        self.children.push(integrator);
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Calls `assemble` for each child, summing matrix results into `output`.
    fn sum_matrices(
        &self,
        output: &mut DMatrix<T>,
        mut assemble: impl FnMut(&dyn BilinearFormIntegrator<T>, &mut DMatrix<T>) -> eyre::Result<()>,
    ) -> eyre::Result<()> {
        let (first, rest) = self.split_children();
        trace!("Summing integrator {} (1/{})", first.name(), self.children.len());
        assemble(first, output)?;
        self.scratch.with(|ws| {
            for (i, child) in rest.iter().enumerate() {
                trace!("Summing integrator {} ({}/{})", child.get().name(), i + 2, self.children.len());
                assemble(child.get(), &mut ws.matrix)?;
                assert_eq!(
                    ws.matrix.shape(),
                    output.shape(),
                    "integrators in a sum must produce matrices of the same shape"
                );
                *output += &ws.matrix;
            }
            Ok(())
        })
    }

    fn split_children(&self) -> (&dyn BilinearFormIntegrator<T>, &[IntegratorHandle<'a, T>]) {
        match self.children.split_first() {
            Some((first, rest)) => (first.get(), rest),
            None => panic!("SumIntegrator requires at least one integrator"),
        }
    }
}

impl<'a, T: Real> BilinearFormIntegrator<T> for SumIntegrator<'a, T> {
    fn name(&self) -> &'static str {
        "SumIntegrator"
    }

    fn assemble_element_matrix(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.sum_matrices(elmat, |integrator, output| {
            integrator.assemble_element_matrix(element, trans, output)
        })
    }

    fn assemble_element_matrix2(
        &self,
        trial: &dyn FiniteElement<T>,
        test: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.sum_matrices(elmat, |integrator, output| {
            integrator.assemble_element_matrix2(trial, test, trans, output)
        })
    }

    fn assemble_face_matrix(
        &self,
        el1: &dyn FiniteElement<T>,
        el2: Option<&dyn FiniteElement<T>>,
        trans: &mut dyn FaceTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.sum_matrices(elmat, |integrator, output| {
            integrator.assemble_face_matrix(el1, el2, trans, output)
        })
    }

    fn assemble_face_matrix_mixed(
        &self,
        trace: &dyn FiniteElement<T>,
        test1: &dyn FiniteElement<T>,
        test2: Option<&dyn FiniteElement<T>>,
        trans: &mut dyn FaceTransformation<T>,
        elmat: &mut DMatrix<T>,
    ) -> eyre::Result<()> {
        self.sum_matrices(elmat, |integrator, output| {
            integrator.assemble_face_matrix_mixed(trace, test1, test2, trans, output)
        })
    }

    fn assemble_element_vector(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elfun: &DVector<T>,
        elvect: &mut DVector<T>,
    ) -> eyre::Result<()> {
        let (first, rest) = self.split_children();
        first.assemble_element_vector(element, trans, elfun, elvect)?;
        self.scratch.with(|ws| {
            for child in rest {
                child
                    .get()
                    .assemble_element_vector(element, trans, elfun, &mut ws.vector)?;
                *elvect += &ws.vector;
            }
            Ok(())
        })
    }

    fn element_energy(
        &self,
        element: &dyn FiniteElement<T>,
        trans: &mut dyn ElementTransformation<T>,
        elfun: &DVector<T>,
    ) -> eyre::Result<T> {
        let (first, rest) = self.split_children();
        let mut energy = first.element_energy(element, trans, elfun)?;
        for child in rest {
            energy += child.get().element_energy(element, trans, elfun)?;
        }
        Ok(energy)
    }

    fn set_scratch_policy(&mut self, policy: ScratchPolicy) {
        self.scratch.set_policy(policy);
        for child in &mut self.children {
            child.get_mut().set_scratch_policy(policy);
        }
    }
}
