use approx::assert_abs_diff_eq;

use dslab_overload::error::OverloadError;
use dslab_overload::math::{evaluate, linear_regression, loess_parameter_estimates, ols_estimate, tricube_weights};

#[test]
// The latest point has weight 1, the first three points share the same weight.
fn test_tricube_weights() {
    let weights = tricube_weights(5);
    assert_eq!(weights.len(), 5);
    assert_abs_diff_eq!(weights[2], 1.4927113702623906, epsilon = 1e-12);
    assert_abs_diff_eq!(weights[3], 1.048378904765904, epsilon = 1e-12);
    assert_eq!(weights[4], 1.);
    assert_eq!(weights[0], weights[2]);
    assert_eq!(weights[1], weights[2]);
    assert_eq!(tricube_weights(2), vec![1., 1.]);
}

#[test]
// Series growing by 0.1 per step starting from 0.1 at x = 1 has zero intercept.
fn test_loess_linear_series() {
    let series: Vec<f64> = (1..=10).map(|i| 0.1 * i as f64).collect();
    let (intercept, slope) = loess_parameter_estimates(&series).unwrap();
    assert_abs_diff_eq!(intercept, 0., epsilon = 1e-9);
    assert_abs_diff_eq!(slope, 0.1, epsilon = 1e-9);
}

#[test]
fn test_loess_constant_series() {
    let (intercept, slope) = loess_parameter_estimates(&[0.4; 5]).unwrap();
    assert_abs_diff_eq!(intercept, 0.4, epsilon = 1e-12);
    assert_abs_diff_eq!(slope, 0., epsilon = 1e-12);
}

#[test]
fn test_loess_degenerate_input() {
    assert!(matches!(
        loess_parameter_estimates(&[0.5, 0.6]),
        Err(OverloadError::DegenerateFit(_))
    ));
    assert!(matches!(
        loess_parameter_estimates(&[0.5, f64::INFINITY, 0.6]),
        Err(OverloadError::DegenerateFit(_))
    ));
    assert!(matches!(
        linear_regression(&[1., 1., 1.], &[0.1, 0.2, 0.3]),
        Err(OverloadError::DegenerateFit(_))
    ));
}

#[test]
// Response is an exact linear function of three independent regressors.
fn test_ols_exact_fit() {
    let a = [1., 2., 3., 4., 5., 6.];
    let b = [2., 1., 4., 3., 6., 5.];
    let c = [1., 4., 9., 16., 25., 36.];
    let y: Vec<f64> = (0..6).map(|i| 1. + 2. * a[i] + 3. * b[i] + 4. * c[i]).collect();
    let coefficients = ols_estimate(&[&a[..], &b[..], &c[..]], &y).unwrap();
    assert_eq!(coefficients.len(), 4);
    for (actual, expected) in coefficients.iter().zip([1., 2., 3., 4.]) {
        assert_abs_diff_eq!(*actual, expected, epsilon = 1e-8);
    }
    assert_abs_diff_eq!(evaluate(&coefficients, &[7., 8., 49.]), 1. + 14. + 24. + 196., epsilon = 1e-6);
}

#[test]
// Constant regressors are collinear with the intercept and get zero coefficients.
fn test_ols_constant_regressors() {
    let x = [0.1; 10];
    let y = [0.001; 10];
    let coefficients = ols_estimate(&[&x[..], &x[..], &x[..]], &y).unwrap();
    assert_abs_diff_eq!(coefficients[0], 0.001, epsilon = 1e-12);
    assert_eq!(&coefficients[1..], &[0., 0., 0.]);
}

#[test]
// Identical regressors: only the first one carries a coefficient, fitted values are not affected.
fn test_ols_duplicate_regressors() {
    let x: Vec<f64> = (0..10).map(|i| 0.55 + 0.1 * i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v * v * v).collect();
    let coefficients = ols_estimate(&[&x[..], &x[..], &x[..]], &y).unwrap();
    assert_abs_diff_eq!(coefficients[0], -1.899, epsilon = 1e-9);
    assert_abs_diff_eq!(coefficients[1], 3.1465, epsilon = 1e-9);
    assert_eq!(&coefficients[2..], &[0., 0.]);
    assert_abs_diff_eq!(evaluate(&coefficients, &[x[9], x[9], x[9]]), 2.663425, epsilon = 1e-9);
}

#[test]
fn test_ols_insufficient_rows() {
    let x = [0.1, 0.2, 0.3];
    let result = ols_estimate(&[&x[..], &x[..], &x[..]], &[0.1, 0.2, 0.3]);
    assert!(matches!(
        result,
        Err(OverloadError::InsufficientData {
            required: 4,
            available: 3
        })
    ));
}

#[test]
fn test_ols_invalid_input() {
    let x = [0.1, 0.2, 0.3, 0.4, 0.5];
    let short = [0.1, 0.2, 0.3, 0.4];
    let y = [0.2, 0.3, 0.4, 0.5, 0.6];
    assert!(matches!(
        ols_estimate(&[&x[..], &short[..]], &y),
        Err(OverloadError::DegenerateFit(_))
    ));
    assert!(matches!(
        ols_estimate(&[&x[..]], &[0.2, f64::NAN, 0.4, 0.5, 0.6]),
        Err(OverloadError::DegenerateFit(_))
    ));
}
