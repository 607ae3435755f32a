use matrixcompare::assert_scalar_eq;
use std::sync::Arc;
use weakform::element::Geometry;
use weakform::quadrature::subdivide::subdivide;
use weakform::quadrature::{reference_rule, GaussRules, IntegrationRule, QuadratureRuleProvider};
use weakform_quadrature::MAX_ORDER;

const GEOMETRIES: [(Geometry, f64); 6] = [
    (Geometry::Point, 1.0),
    (Geometry::Segment, 1.0),
    (Geometry::Triangle, 0.5),
    (Geometry::Square, 1.0),
    (Geometry::Tetrahedron, 1.0 / 6.0),
    (Geometry::Cube, 1.0),
];

fn integrate(rule: &IntegrationRule<f64>, f: impl Fn(f64, f64, f64) -> f64) -> f64 {
    rule.iter().map(|ip| ip.weight * f(ip.x, ip.y, ip.z)).sum()
}

fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

#[test]
fn reference_rules_measure_the_reference_cells() {
    for (geometry, volume) in GEOMETRIES {
        for order in 0..8 {
            let rule = reference_rule::<f64>(geometry, order).unwrap();
            assert!(!rule.is_empty());
            assert_scalar_eq!(rule.total_weight(), volume, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn triangle_rules_integrate_monomials_exactly() {
    // int_T x^a y^b = a! b! / (a + b + 2)!
    for order in 0..10u32 {
        let rule = reference_rule::<f64>(Geometry::Triangle, order as usize).unwrap();
        for a in 0..=order {
            let b = order - a;
            let exact = factorial(a) * factorial(b) / factorial(a + b + 2);
            let approx = integrate(&rule, |x, y, _| x.powi(a as i32) * y.powi(b as i32));
            assert_scalar_eq!(approx, exact, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn tetrahedron_rules_integrate_monomials_exactly() {
    // int_T x^a y^b z^c = a! b! c! / (a + b + c + 3)!
    let rule = reference_rule::<f64>(Geometry::Tetrahedron, 4).unwrap();
    for (a, b, c) in [(4, 0, 0), (2, 1, 1), (0, 2, 2), (1, 0, 3)] {
        let exact = factorial(a) * factorial(b) * factorial(c) / factorial(a + b + c + 3);
        let approx = integrate(&rule, |x, y, z| x.powi(a as i32) * y.powi(b as i32) * z.powi(c as i32));
        assert_scalar_eq!(approx, exact, comp = abs, tol = 1e-15);
    }
}

#[test]
fn tensor_rules_integrate_per_axis_degree() {
    let rule = reference_rule::<f64>(Geometry::Cube, 5).unwrap();
    let approx = integrate(&rule, |x, y, z| x.powi(5) * y.powi(4) * z);
    assert_scalar_eq!(approx, 1.0 / 6.0 / 5.0 / 2.0, comp = abs, tol = 1e-15);
}

#[test]
fn orders_beyond_the_maximum_are_errors_for_reference_rules() {
    assert!(reference_rule::<f64>(Geometry::Segment, MAX_ORDER + 1).is_err());
}

#[test]
fn gauss_rules_clamp_excessive_orders() {
    let rules = GaussRules::<f64>::new();
    let clamped = rules.rule(Geometry::Segment, 1000).unwrap();
    let maximal = rules.rule(Geometry::Segment, MAX_ORDER).unwrap();
    assert!(Arc::ptr_eq(&clamped, &maximal));
}

#[test]
fn gauss_rules_are_cached() {
    let rules = GaussRules::<f64>::new();
    let first = rules.rule(Geometry::Triangle, 4).unwrap();
    let second = rules.rule(Geometry::Triangle, 4).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let refined = rules.refined_rule(Geometry::Triangle, 4).unwrap();
    assert!(!Arc::ptr_eq(&first, &refined));
    assert_eq!(refined.len(), 4 * first.len());
}

#[test]
fn subdivided_rules_preserve_weight_and_exactness() {
    for (geometry, volume) in GEOMETRIES.into_iter().skip(1) {
        let rule = reference_rule::<f64>(geometry, 3).unwrap();
        let refined = subdivide(&rule, geometry);
        assert_eq!(refined.len(), rule.len() << geometry.dim());
        assert_scalar_eq!(refined.total_weight(), volume, comp = abs, tol = 1e-14);

        let cubic = |x: f64, y: f64, z: f64| x * x * x + x * y + 2.0 * z * z - y;
        assert_scalar_eq!(integrate(&refined, cubic), integrate(&rule, cubic), comp = abs, tol = 1e-14);
    }
}

#[test]
fn subdivided_triangle_points_stay_inside_the_triangle() {
    let refined = subdivide(&reference_rule::<f64>(Geometry::Triangle, 6).unwrap(), Geometry::Triangle);
    for ip in refined.iter() {
        assert!(ip.x >= 0.0 && ip.y >= 0.0 && ip.x + ip.y <= 1.0);
        assert!(ip.weight > 0.0);
    }
}
