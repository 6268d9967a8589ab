//! Numeric helpers shared by the geometry code
use crate::{EPSILON, Scalar};

/// Real roots of `a * t ^ 2 + b * t + c = 0`
///
/// Degenerates into the linear equation when `a` is close to zero. A double
/// root is reported once.
pub(crate) fn quadratic_solve(
    a: Scalar,
    b: Scalar,
    c: Scalar,
) -> impl Iterator<Item = Scalar> + Clone {
    let roots = if a.abs() < EPSILON {
        [(b.abs() > EPSILON).then(|| -c / b), None]
    } else {
        let disc = b * b - 4.0 * a * c;
        if disc.abs() < EPSILON {
            [Some(-b / (2.0 * a)), None]
        } else if disc < 0.0 {
            [None, None]
        } else {
            // avoid cancellation between `-b` and `sqrt(disc)`
            let q = -0.5 * (b + b.signum() * disc.sqrt());
            let (t0, t1) = (q / a, c / q);
            [Some(t0.min(t1)), Some(t0.max(t1))]
        }
    };
    roots.into_iter().flatten()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[macro_export]
    macro_rules! assert_approx_eq {
        ( $v0:expr, $v1: expr ) => {{
            assert!(($v0 - $v1).abs() < $crate::EPSILON, "{} != {}", $v0, $v1);
        }};
        ( $v0:expr, $v1: expr, $e: expr ) => {{
            assert!(($v0 - $v1).abs() < $e, "{} != {}", $v0, $v1);
        }};
    }

    #[test]
    fn test_quadratic_solve() {
        let check = |a: Scalar, b: Scalar, c: Scalar, expected: &[Scalar]| {
            let roots: Vec<_> = quadratic_solve(a, b, c).collect();
            assert_eq!(roots.len(), expected.len(), "{:?} != {:?}", roots, expected);
            for (root, expected) in roots.iter().zip(expected) {
                assert!((a * root * root + b * root + c).abs() < 1e-9);
                assert_approx_eq!(root, expected, 1e-9);
            }
        };
        check(1.0, -5.0, 6.0, &[2.0, 3.0]);
        check(2.0, 2.0, -4.0, &[-2.0, 1.0]);
        check(1.0, -6.0, 9.0, &[3.0]);
        check(1.0, 3.0, 5.0, &[]);
        check(0.0, 5.0, 10.0, &[-2.0]);
        check(0.0, 0.0, 1.0, &[]);
    }
}
