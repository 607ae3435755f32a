//! Integration points, integration rules and rule providers.
//!
//! Rules are expressed on the unit reference cells of [`Geometry`]. The default provider,
//! [`GaussRules`], is backed by `weakform-quadrature` and caches every rule it constructs.
use crate::element::Geometry;
use crate::Real;
use log::{debug, warn};
use nalgebra::convert;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::marker::PhantomData;
use std::slice;
use std::sync::Arc;
use weakform_quadrature::{simplex, tensor, univariate, MAX_ORDER};

pub mod subdivide;

/// Errors returned by the underlying quadrature crate.
pub use weakform_quadrature::Error as QuadratureError;

/// A point in reference coordinates together with a quadrature weight.
///
/// Unused coordinates are zero.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntegrationPoint<T> {
    pub x: T,
    pub y: T,
    pub z: T,
    pub weight: T,
}

impl<T: Real> IntegrationPoint<T> {
    /// Creates a point from up to three reference coordinates.
    pub fn new(coords: &[T], weight: T) -> Self {
        assert!(coords.len() <= 3, "at most three reference coordinates are supported");
        let coord = |i: usize| coords.get(i).copied().unwrap_or_else(T::zero);
        Self {
            x: coord(0),
            y: coord(1),
            z: coord(2),
            weight,
        }
    }

    /// A point with zero weight, for use as an evaluation point rather than a quadrature point.
    pub fn at(coords: &[T]) -> Self {
        Self::new(coords, T::zero())
    }

    pub fn coords(&self) -> [T; 3] {
        [self.x, self.y, self.z]
    }
}

impl<T: Real> Default for IntegrationPoint<T> {
    fn default() -> Self {
        Self::at(&[])
    }
}

/// An ordered collection of integration points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IntegrationRule<T> {
    points: Vec<IntegrationPoint<T>>,
}

impl<T: Real> IntegrationRule<T> {
    pub fn new(points: Vec<IntegrationPoint<T>>) -> Self {
        Self { points }
    }

    /// Constructs a rule from separate weights and points, given as `f64` values.
    pub fn from_f64_parts<const D: usize>(weights: &[f64], points: &[[f64; D]]) -> Self {
        assert_eq!(weights.len(), points.len());
        let points = weights
            .iter()
            .zip(points)
            .map(|(&w, p)| {
                let coords: Vec<T> = p.iter().map(|&x| convert(x)).collect();
                IntegrationPoint::new(&coords, convert(w))
            })
            .collect();
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[IntegrationPoint<T>] {
        &self.points
    }

    pub fn iter(&self) -> slice::Iter<IntegrationPoint<T>> {
        self.points.iter()
    }

    /// The sum of all weights, i.e. the measure of the reference cell for any sensible rule.
    pub fn total_weight(&self) -> T {
        self.points
            .iter()
            .fold(T::zero(), |acc, ip| acc + ip.weight)
    }
}

impl<'a, T> IntoIterator for &'a IntegrationRule<T> {
    type Item = &'a IntegrationPoint<T>;
    type IntoIter = slice::Iter<'a, IntegrationPoint<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T> FromIterator<IntegrationPoint<T>> for IntegrationRule<T> {
    fn from_iter<I: IntoIterator<Item = IntegrationPoint<T>>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

/// Supplies integration rules keyed by reference geometry and polynomial order.
///
/// Integrators trust the provider blindly: the returned rule must integrate polynomials of
/// the requested total degree (or per-axis degree for tensor-product cells) exactly, or
/// accurately enough for the application.
pub trait QuadratureRuleProvider<T>: Send + Sync {
    fn rule(&self, geometry: Geometry, order: usize) -> eyre::Result<Arc<IntegrationRule<T>>>;

    /// A rule obtained by subdividing the reference cell once in every direction and applying
    /// the rule of the given order on each piece.
    fn refined_rule(&self, geometry: Geometry, order: usize) -> eyre::Result<Arc<IntegrationRule<T>>>;
}

/// Gauss-type rules for all reference geometries, cached per `(geometry, order)`.
pub struct GaussRules<T> {
    cache: RwLock<FxHashMap<(Geometry, usize, bool), Arc<IntegrationRule<T>>>>,
    marker: PhantomData<T>,
}

impl<T> std::fmt::Debug for GaussRules<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaussRules")
            .field("cached_rules", &self.cache.read().len())
            .finish()
    }
}

impl<T> Default for GaussRules<T> {
    fn default() -> Self {
        Self {
            cache: RwLock::new(FxHashMap::default()),
            marker: PhantomData,
        }
    }
}

impl<T: Real> GaussRules<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn get_or_build(&self, geometry: Geometry, order: usize, refined: bool) -> eyre::Result<Arc<IntegrationRule<T>>> {
        let order = if order > MAX_ORDER {
            warn!(
                "Requested quadrature order {} for {:?} exceeds the maximum order {}, using the maximum instead",
                order, geometry, MAX_ORDER
            );
            MAX_ORDER
        } else {
            order
        };

        let key = (geometry, order, refined);
        if let Some(rule) = self.cache.read().get(&key) {
            return Ok(Arc::clone(rule));
        }

        let mut rule = reference_rule(geometry, order)?;
        if refined {
            rule = subdivide::subdivide(&rule, geometry);
        }
        debug!(
            "Constructed {}quadrature rule for {:?} of order {} with {} points",
            if refined { "refined " } else { "" },
            geometry,
            order,
            rule.len()
        );

        let rule = Arc::new(rule);
        let mut cache = self.cache.write();
        // Another thread may have inserted the same rule in the meantime
        let rule = cache.entry(key).or_insert(rule);
        Ok(Arc::clone(rule))
    }
}

impl<T: Real> QuadratureRuleProvider<T> for GaussRules<T> {
    fn rule(&self, geometry: Geometry, order: usize) -> eyre::Result<Arc<IntegrationRule<T>>> {
        self.get_or_build(geometry, order, false)
    }

    fn refined_rule(&self, geometry: Geometry, order: usize) -> eyre::Result<Arc<IntegrationRule<T>>> {
        self.get_or_build(geometry, order, true)
    }
}

/// Constructs a rule of the given order on the reference cell of `geometry`.
pub fn reference_rule<T: Real>(geometry: Geometry, order: usize) -> eyre::Result<IntegrationRule<T>> {
    let rule = match geometry {
        Geometry::Point => {
            let (w, p) = weakform_quadrature::point();
            IntegrationRule::from_f64_parts(&w, &p)
        }
        Geometry::Segment => {
            let (w, p) = univariate::segment(order)?;
            IntegrationRule::from_f64_parts(&w, &p)
        }
        Geometry::Triangle => {
            let (w, p) = simplex::triangle(order)?;
            IntegrationRule::from_f64_parts(&w, &p)
        }
        Geometry::Square => {
            let (w, p) = tensor::square(order)?;
            IntegrationRule::from_f64_parts(&w, &p)
        }
        Geometry::Tetrahedron => {
            let (w, p) = simplex::tetrahedron(order)?;
            IntegrationRule::from_f64_parts(&w, &p)
        }
        Geometry::Cube => {
            let (w, p) = tensor::cube(order)?;
            IntegrationRule::from_f64_parts(&w, &p)
        }
    };
    Ok(rule)
}
