//! Default quadrature orders of the integrators.
//!
//! The formulas are empirical choices that downstream accuracy depends on, so they are kept
//! exactly as established rather than derived from the integrands. Orders that would become
//! negative for constant elements are clamped to zero.
use crate::element::{FiniteElement, FunctionSpace, Geometry, MapType};
use crate::transformation::{ElementTransformation, FaceTransformation};
use crate::Real;

/// A request for an integration rule.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RuleRequest {
    pub geometry: Geometry,
    pub order: usize,
    /// Whether the rule should be refined by subdividing the reference cell.
    pub refined: bool,
}

impl RuleRequest {
    pub fn new(geometry: Geometry, order: usize) -> Self {
        Self {
            geometry,
            order,
            refined: false,
        }
    }

    /// Requests a refined rule if `element` is only piecewise polynomial on its reference cell.
    pub fn refined_for<T: Real>(mut self, element: &dyn FiniteElement<T>) -> Self {
        self.refined = element.space() == FunctionSpace::RQk;
        self
    }
}

pub fn diffusion<T: Real>(trial: &dyn FiniteElement<T>, test: &dyn FiniteElement<T>) -> RuleRequest {
    let p = trial.order() + test.order();
    let order = if trial.space() == FunctionSpace::Pk {
        p.saturating_sub(2)
    } else {
        (p + trial.dim()).saturating_sub(1)
    };
    RuleRequest::new(trial.geometry(), order).refined_for(trial)
}

pub fn mass<T: Real>(element: &dyn FiniteElement<T>, trans: &dyn ElementTransformation<T>) -> RuleRequest {
    RuleRequest::new(element.geometry(), 2 * element.order() + trans.order_w()).refined_for(element)
}

pub fn mass_mixed<T: Real>(
    trial: &dyn FiniteElement<T>,
    test: &dyn FiniteElement<T>,
    trans: &dyn ElementTransformation<T>,
) -> RuleRequest {
    RuleRequest::new(trial.geometry(), trial.order() + test.order() + trans.order_w())
}

pub fn convection<T: Real>(element: &dyn FiniteElement<T>, trans: &dyn ElementTransformation<T>) -> RuleRequest {
    let order = trans.order_grad(element) + trans.order() + element.order();
    RuleRequest::new(element.geometry(), order)
}

pub fn group_convection<T: Real>(element: &dyn FiniteElement<T>, trans: &dyn ElementTransformation<T>) -> RuleRequest {
    RuleRequest::new(element.geometry(), trans.order_grad(element) + element.order())
}

pub fn derivative<T: Real>(trial: &dyn FiniteElement<T>, test: &dyn FiniteElement<T>) -> RuleRequest {
    let p = trial.order() + test.order();
    let order = if trial.space() == FunctionSpace::Pk {
        p.saturating_sub(1)
    } else {
        p + trial.dim()
    };
    RuleRequest::new(trial.geometry(), order).refined_for(trial)
}

pub fn vector_mass<T: Real>(
    element: &dyn FiniteElement<T>,
    trans: &dyn ElementTransformation<T>,
    extra_order: usize,
) -> RuleRequest {
    let order = 2 * element.order() + trans.order_w() + extra_order;
    RuleRequest::new(element.geometry(), order).refined_for(element)
}

pub fn vector_mass_mixed<T: Real>(
    trial: &dyn FiniteElement<T>,
    test: &dyn FiniteElement<T>,
    trans: &dyn ElementTransformation<T>,
    extra_order: usize,
) -> RuleRequest {
    let order = trial.order() + test.order() + trans.order_w() + extra_order;
    RuleRequest::new(trial.geometry(), order).refined_for(trial)
}

pub fn vector_fe_mass<T: Real>(element: &dyn FiniteElement<T>, trans: &dyn ElementTransformation<T>) -> RuleRequest {
    RuleRequest::new(element.geometry(), trans.order_w() + 2 * element.order())
}

pub fn vector_fe_mass_mixed<T: Real>(
    trial: &dyn FiniteElement<T>,
    test: &dyn FiniteElement<T>,
    trans: &dyn ElementTransformation<T>,
) -> RuleRequest {
    RuleRequest::new(trial.geometry(), trans.order_w() + trial.order() + test.order())
}

pub fn vector_fe_divergence<T: Real>(trial: &dyn FiniteElement<T>, test: &dyn FiniteElement<T>) -> RuleRequest {
    RuleRequest::new(trial.geometry(), (trial.order() + test.order()).saturating_sub(1))
}

pub fn vector_fe_curl<T: Real>(trial: &dyn FiniteElement<T>, test: &dyn FiniteElement<T>) -> RuleRequest {
    RuleRequest::new(trial.geometry(), (trial.order() + test.order()).saturating_sub(1))
}

pub fn curl_curl<T: Real>(element: &dyn FiniteElement<T>) -> RuleRequest {
    let p = element.order();
    let order = if element.space() == FunctionSpace::Pk {
        (2 * p).saturating_sub(2)
    } else {
        2 * p
    };
    RuleRequest::new(element.geometry(), order)
}

pub fn vector_curl_curl<T: Real>(element: &dyn FiniteElement<T>, trans: &dyn ElementTransformation<T>) -> RuleRequest {
    RuleRequest::new(element.geometry(), 2 * trans.order_grad(element))
}

pub fn vector_divergence<T: Real>(
    trial: &dyn FiniteElement<T>,
    test: &dyn FiniteElement<T>,
    trans: &dyn ElementTransformation<T>,
) -> RuleRequest {
    RuleRequest::new(trial.geometry(), trans.order_grad(trial) + test.order())
}

pub fn div_div<T: Real>(element: &dyn FiniteElement<T>) -> RuleRequest {
    RuleRequest::new(element.geometry(), (2 * element.order()).saturating_sub(2))
}

pub fn vector_diffusion<T: Real>(element: &dyn FiniteElement<T>, trans: &dyn ElementTransformation<T>) -> RuleRequest {
    RuleRequest::new(element.geometry(), 2 * trans.order_grad(element)).refined_for(element)
}

pub fn elasticity<T: Real>(element: &dyn FiniteElement<T>, trans: &dyn ElementTransformation<T>) -> RuleRequest {
    RuleRequest::new(element.geometry(), 2 * trans.order_grad(element))
}

pub fn dg_trace<T: Real>(
    el1: &dyn FiniteElement<T>,
    el2: Option<&dyn FiniteElement<T>>,
    trans: &dyn FaceTransformation<T>,
) -> RuleRequest {
    let order_w1 = trans.elem1().order_w();
    let mut order = match (el2, trans.elem2()) {
        (Some(el2), Some(elem2)) => order_w1.min(elem2.order_w()) + 2 * el1.order().max(el2.order()),
        _ => order_w1 + 2 * el1.order(),
    };
    if el1.space() == FunctionSpace::Pk {
        order += 1;
    }
    RuleRequest::new(trans.face_geometry(), order)
}

pub fn dg_diffusion<T: Real>(
    el1: &dyn FiniteElement<T>,
    el2: Option<&dyn FiniteElement<T>>,
    trans: &dyn FaceTransformation<T>,
) -> RuleRequest {
    let order = match el2 {
        Some(el2) if trans.is_interior() => 2 * el1.order().max(el2.order()),
        _ => 2 * el1.order(),
    };
    RuleRequest::new(trans.face_geometry(), order)
}

pub fn trace_jump<T: Real>(
    trace: &dyn FiniteElement<T>,
    test1: &dyn FiniteElement<T>,
    test2: Option<&dyn FiniteElement<T>>,
    trans: &dyn FaceTransformation<T>,
) -> RuleRequest {
    let mut order = match test2 {
        Some(test2) if trans.is_interior() => test1.order().max(test2.order()),
        _ => test1.order(),
    };
    order += trace.order();
    if trace.map_type() == MapType::Value {
        order += trans.face().order_w();
    }
    RuleRequest::new(trans.face_geometry(), order)
}

pub fn flux_energy<T: Real>(flux_element: &dyn FiniteElement<T>) -> RuleRequest {
    RuleRequest::new(flux_element.geometry(), 2 * flux_element.order())
}
