use matrixcompare::assert_scalar_eq;
use weakform_quadrature::integrate;
use weakform_quadrature::tensor::{cube, square};

fn unit_monomial_integral(alpha: i32) -> f64 {
    1.0 / (alpha as f64 + 1.0)
}

#[test]
fn square_rules_satisfy_expected_accuracy() {
    for order in 0..=12 {
        let rule = square(order).unwrap();
        assert!(rule.0.iter().all(|&w| w > 0.0));

        // Tensor rules are exact for each variable separately
        for alpha in 0..=order as i32 {
            for beta in 0..=order as i32 {
                let exact = unit_monomial_integral(alpha) * unit_monomial_integral(beta);
                let estimated = integrate(&rule, |&[x, y]| x.powi(alpha) * y.powi(beta));
                assert_scalar_eq!(estimated, exact, comp = abs, tol = 1e-14);
            }
        }
    }
}

#[test]
fn cube_rules_satisfy_expected_accuracy() {
    for order in 0..=7 {
        let rule = cube(order).unwrap();
        assert!(rule.0.iter().all(|&w| w > 0.0));

        for alpha in 0..=order as i32 {
            for beta in 0..=order as i32 {
                for gamma in 0..=order as i32 {
                    let exact = unit_monomial_integral(alpha)
                        * unit_monomial_integral(beta)
                        * unit_monomial_integral(gamma);
                    let estimated =
                        integrate(&rule, |&[x, y, z]| x.powi(alpha) * y.powi(beta) * z.powi(gamma));
                    assert_scalar_eq!(estimated, exact, comp = abs, tol = 1e-14);
                }
            }
        }
    }
}
