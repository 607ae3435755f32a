use matrixcompare::assert_scalar_eq;
use weakform_quadrature::univariate::{gauss, segment};
use weakform_quadrature::{integrate, Error, MAX_ORDER};

#[test]
fn gauss_rules_integrate_monomials_on_symmetric_interval() {
    for n in 1..=30 {
        let rule = gauss(n);
        assert_eq!(rule.0.len(), n);
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=(2 * n - 1) as i32 {
            let exact = (1.0 - (-1.0f64).powi(alpha + 1)) / (alpha as f64 + 1.0);
            let estimated = integrate(&rule, |&[x]| x.powi(alpha));
            assert_scalar_eq!(estimated, exact, comp = abs, tol = 1e-13);
        }
    }
}

#[test]
fn segment_rules_integrate_requested_order_on_unit_interval() {
    for order in 0..=30 {
        let rule = segment(order).unwrap();
        assert!(rule.1.iter().all(|&[x]| x > 0.0 && x < 1.0));
        for alpha in 0..=order as i32 {
            let exact = 1.0 / (alpha as f64 + 1.0);
            let estimated = integrate(&rule, |&[x]| x.powi(alpha));
            assert_scalar_eq!(estimated, exact, comp = abs, tol = 1e-14);
        }
    }
}

#[test]
fn segment_rejects_excessive_order() {
    assert_eq!(
        segment(MAX_ORDER + 1),
        Err(Error::NoRuleAvailable { order: MAX_ORDER + 1 })
    );
}

#[test]
fn gauss_points_are_symmetric() {
    let (weights, points) = gauss(7);
    let mut xs: Vec<_> = points.iter().map(|&[x]| x).collect();
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());
    for i in 0..xs.len() {
        assert_scalar_eq!(xs[i], -xs[xs.len() - 1 - i], comp = abs, tol = 1e-15);
    }
    let total: f64 = weights.iter().sum();
    assert_scalar_eq!(total, 2.0, comp = abs, tol = 1e-14);
}
