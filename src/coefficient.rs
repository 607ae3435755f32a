//! Coefficients evaluated at integration points.
//!
//! Coefficients come in three shapes: scalar, vector and matrix. They must be pure functions
//! of the queried point, since integrators may evaluate them in any order and more than once.
use crate::quadrature::{IntegrationPoint, IntegrationRule};
use crate::transformation::ElementTransformation;
use crate::util::reset_matrix;
use crate::Real;
use nalgebra::{DMatrix, DVector};
use std::fmt;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// A scalar coefficient.
pub trait Coefficient<T: Real>: Send + Sync {
    fn eval(&self, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>) -> T;
}

/// A vector-valued coefficient with [`vdim`](Self::vdim) components.
pub trait VectorCoefficient<T: Real>: Send + Sync {
    fn vdim(&self) -> usize;

    /// Evaluates the coefficient into `output`, which has length `vdim`.
    fn eval(&self, output: &mut DVector<T>, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>);

    /// Evaluates the coefficient at every point of `rule`, writing one column per point into
    /// a `vdim x rule.len()` matrix.
    ///
    /// The current point of `trans` is moved to each point of the rule in turn.
    fn eval_rule(
        &self,
        output: &mut DMatrix<T>,
        trans: &mut dyn ElementTransformation<T>,
        rule: &IntegrationRule<T>,
    ) {
        let vdim = self.vdim();
        reset_matrix(output, vdim, rule.len());
        let mut value = DVector::zeros(vdim);
        for (i, ip) in rule.iter().enumerate() {
            trans.set_integration_point(ip);
            self.eval(&mut value, trans, ip);
            output.set_column(i, &value);
        }
    }
}

/// A square matrix-valued coefficient of size `vdim x vdim`.
pub trait MatrixCoefficient<T: Real>: Send + Sync {
    fn vdim(&self) -> usize;

    /// Evaluates the coefficient into `output`, which is `vdim x vdim`.
    fn eval(&self, output: &mut DMatrix<T>, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>);
}

/// A coefficient that takes the same value everywhere.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConstantCoefficient<T>(pub T);

impl<T: Real> Coefficient<T> for ConstantCoefficient<T> {
    fn eval(&self, _trans: &dyn ElementTransformation<T>, _ip: &IntegrationPoint<T>) -> T {
        self.0
    }
}

/// A scalar coefficient given by a function of the physical coordinates.
pub struct FunctionCoefficient<F> {
    function: F,
}

impl<F> FunctionCoefficient<F> {
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> Debug for FunctionCoefficient<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "FunctionCoefficient")
    }
}

impl<T, F> Coefficient<T> for FunctionCoefficient<F>
where
    T: Real,
    F: Fn(&DVector<T>) -> T + Send + Sync,
{
    fn eval(&self, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>) -> T {
        (self.function)(&trans.transform(ip))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorConstantCoefficient<T: Real>(pub DVector<T>);

impl<T: Real> VectorCoefficient<T> for VectorConstantCoefficient<T> {
    fn vdim(&self) -> usize {
        self.0.len()
    }

    fn eval(&self, output: &mut DVector<T>, _trans: &dyn ElementTransformation<T>, _ip: &IntegrationPoint<T>) {
        output.copy_from(&self.0);
    }
}

/// A vector coefficient given by a function of the physical coordinates.
pub struct VectorFunctionCoefficient<F> {
    vdim: usize,
    function: F,
}

impl<F> VectorFunctionCoefficient<F> {
    pub fn new(vdim: usize, function: F) -> Self {
        Self { vdim, function }
    }
}

impl<F> Debug for VectorFunctionCoefficient<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorFunctionCoefficient")
            .field("vdim", &self.vdim)
            .finish()
    }
}

impl<T, F> VectorCoefficient<T> for VectorFunctionCoefficient<F>
where
    T: Real,
    F: Fn(&DVector<T>, &mut DVector<T>) + Send + Sync,
{
    fn vdim(&self) -> usize {
        self.vdim
    }

    fn eval(&self, output: &mut DVector<T>, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>) {
        (self.function)(&trans.transform(ip), output)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatrixConstantCoefficient<T: Real>(pub DMatrix<T>);

impl<T: Real> MatrixCoefficient<T> for MatrixConstantCoefficient<T> {
    fn vdim(&self) -> usize {
        assert!(self.0.is_square(), "matrix coefficients must be square");
        self.0.nrows()
    }

    fn eval(&self, output: &mut DMatrix<T>, _trans: &dyn ElementTransformation<T>, _ip: &IntegrationPoint<T>) {
        output.copy_from(&self.0);
    }
}

/// A matrix coefficient given by a function of the physical coordinates.
pub struct MatrixFunctionCoefficient<F> {
    vdim: usize,
    function: F,
}

impl<F> MatrixFunctionCoefficient<F> {
    pub fn new(vdim: usize, function: F) -> Self {
        Self { vdim, function }
    }
}

impl<F> Debug for MatrixFunctionCoefficient<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MatrixFunctionCoefficient")
            .field("vdim", &self.vdim)
            .finish()
    }
}

impl<T, F> MatrixCoefficient<T> for MatrixFunctionCoefficient<F>
where
    T: Real,
    F: Fn(&DVector<T>, &mut DMatrix<T>) + Send + Sync,
{
    fn vdim(&self) -> usize {
        self.vdim
    }

    fn eval(&self, output: &mut DMatrix<T>, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>) {
        (self.function)(&trans.transform(ip), output)
    }
}

/// The coefficient an integrator should use, after resolving precedence.
#[derive(Clone, Copy)]
pub enum ActiveCoefficient<'a, T: Real> {
    None,
    Scalar(&'a dyn Coefficient<T>),
    Vector(&'a dyn VectorCoefficient<T>),
    Matrix(&'a dyn MatrixCoefficient<T>),
}

impl<'a, T: Real> ActiveCoefficient<'a, T> {
    pub fn kind(&self) -> &'static str {
        match self {
            ActiveCoefficient::None => "none",
            ActiveCoefficient::Scalar(_) => "scalar",
            ActiveCoefficient::Vector(_) => "vector",
            ActiveCoefficient::Matrix(_) => "matrix",
        }
    }
}

/// The coefficients configured on an integrator.
///
/// At most one of them is used: a matrix coefficient takes precedence over a vector
/// coefficient, which takes precedence over a scalar coefficient.
#[derive(Clone)]
pub struct Coefficients<T: Real> {
    scalar: Option<Arc<dyn Coefficient<T>>>,
    vector: Option<Arc<dyn VectorCoefficient<T>>>,
    matrix: Option<Arc<dyn MatrixCoefficient<T>>>,
}

impl<T: Real> Default for Coefficients<T> {
    fn default() -> Self {
        Self {
            scalar: None,
            vector: None,
            matrix: None,
        }
    }
}

impl<T: Real> Debug for Coefficients<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coefficients")
            .field("active", &self.active().kind())
            .finish()
    }
}

impl<T: Real> Coefficients<T> {
    pub fn set_scalar(&mut self, coefficient: Arc<dyn Coefficient<T>>) {
        self.scalar = Some(coefficient);
    }

    pub fn set_vector(&mut self, coefficient: Arc<dyn VectorCoefficient<T>>) {
        self.vector = Some(coefficient);
    }

    pub fn set_matrix(&mut self, coefficient: Arc<dyn MatrixCoefficient<T>>) {
        self.matrix = Some(coefficient);
    }

    pub fn active(&self) -> ActiveCoefficient<T> {
        if let Some(matrix) = &self.matrix {
            ActiveCoefficient::Matrix(matrix.as_ref())
        } else if let Some(vector) = &self.vector {
            ActiveCoefficient::Vector(vector.as_ref())
        } else if let Some(scalar) = &self.scalar {
            ActiveCoefficient::Scalar(scalar.as_ref())
        } else {
            ActiveCoefficient::None
        }
    }

    /// Evaluates the scalar coefficient, or returns one if none is configured.
    pub fn scalar_or_one(&self, trans: &dyn ElementTransformation<T>, ip: &IntegrationPoint<T>) -> T {
        self.scalar
            .as_ref()
            .map(|q| q.eval(trans, ip))
            .unwrap_or_else(T::one)
    }

    /// Panics unless the active coefficient is scalar (or absent).
    pub fn assert_scalar_only(&self, integrator: &str, method: &str) {
        let active = self.active();
        assert!(
            matches!(active, ActiveCoefficient::None | ActiveCoefficient::Scalar(_)),
            "{}::{} is not implemented for {} coefficients",
            integrator,
            method,
            active.kind()
        );
    }
}
