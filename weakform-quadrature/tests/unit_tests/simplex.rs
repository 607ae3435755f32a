use matrixcompare::assert_scalar_eq;
use weakform_quadrature::integrate;
use weakform_quadrature::simplex::{tetrahedron, triangle};

fn factorial(n: i32) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

/// Integral of x^a y^b over the unit triangle: a! b! / (a + b + 2)!
fn triangle_monomial_integral(a: i32, b: i32) -> f64 {
    factorial(a) * factorial(b) / factorial(a + b + 2)
}

/// Integral of x^a y^b z^c over the unit tetrahedron: a! b! c! / (a + b + c + 3)!
fn tetrahedron_monomial_integral(a: i32, b: i32, c: i32) -> f64 {
    factorial(a) * factorial(b) * factorial(c) / factorial(a + b + c + 3)
}

#[test]
fn triangle_rules_integrate_total_degree_exactly() {
    for order in 0..=15 {
        let rule = triangle(order).unwrap();
        assert!(rule.0.iter().all(|&w| w > 0.0));
        assert!(rule
            .1
            .iter()
            .all(|&[x, y]| x > 0.0 && y > 0.0 && x + y < 1.0));

        for a in 0..=order as i32 {
            for b in 0..=(order as i32 - a) {
                let estimated = integrate(&rule, |&[x, y]| x.powi(a) * y.powi(b));
                let exact = triangle_monomial_integral(a, b);
                assert_scalar_eq!(estimated, exact, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn tetrahedron_rules_integrate_total_degree_exactly() {
    for order in 0..=8 {
        let rule = tetrahedron(order).unwrap();
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for a in 0..=order as i32 {
            for b in 0..=(order as i32 - a) {
                for c in 0..=(order as i32 - a - b) {
                    let estimated =
                        integrate(&rule, |&[x, y, z]| x.powi(a) * y.powi(b) * z.powi(c));
                    let exact = tetrahedron_monomial_integral(a, b, c);
                    assert_scalar_eq!(estimated, exact, comp = abs, tol = 1e-14);
                }
            }
        }
    }
}
