//! Regression routines used by utilization predictors.

use crate::error::{OverloadError, Result};

/// Relative norm below which a regressor is treated as a linear combination of the previous ones.
const RANK_TOLERANCE: f64 = 1e-10;

/// Returns tricube weights for a window of `n` points, the latest point has weight 1.
pub fn tricube_weights(n: usize) -> Vec<f64> {
    if n < 3 {
        return vec![1.; n];
    }
    let mut weights = vec![0.; n];
    let top = (n - 1) as f64;
    let spread = top;
    for (i, weight) in weights.iter_mut().enumerate().skip(2) {
        let k = (1. - ((top - i as f64) / spread).powi(3)).powi(3);
        *weight = if k > 0. { 1. / k } else { f64::MAX };
    }
    weights[0] = weights[2];
    weights[1] = weights[2];
    weights
}

/// Estimates (intercept, slope) of local regression over `y` observed at x = 1..n.
///
/// Points are weighted by tricube weights only when at least 40% of the weights vanish.
pub fn loess_parameter_estimates(y: &[f64]) -> Result<(f64, f64)> {
    let n = y.len();
    if n < 3 {
        return Err(OverloadError::DegenerateFit(format!(
            "local regression needs at least 3 points, got {}",
            n
        )));
    }
    let x: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let weights = tricube_weights(n);
    let zero_weights = weights.iter().filter(|&&w| w <= 0.).count();
    if zero_weights as f64 >= 0.4 * n as f64 {
        let scale = |values: &[f64]| -> Vec<f64> {
            values.iter().zip(&weights).map(|(v, w)| w.sqrt() * v).collect()
        };
        linear_regression(&scale(&x), &scale(y))
    } else {
        linear_regression(&x, y)
    }
}

/// Simple least squares fit returning (intercept, slope).
pub fn linear_regression(x: &[f64], y: &[f64]) -> Result<(f64, f64)> {
    if x.len() != y.len() || x.len() < 2 {
        return Err(OverloadError::DegenerateFit(format!(
            "cannot fit line to {} x and {} y values",
            x.len(),
            y.len()
        )));
    }
    check_finite(x)?;
    check_finite(y)?;
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;
    let mut sxx = 0.;
    let mut sxy = 0.;
    for (xi, yi) in x.iter().zip(y) {
        sxx += (xi - mean_x) * (xi - mean_x);
        sxy += (xi - mean_x) * (yi - mean_y);
    }
    if sxx == 0. {
        return Err(OverloadError::DegenerateFit("x values have zero variance".to_string()));
    }
    let slope = sxy / sxx;
    Ok((mean_y - slope * mean_x, slope))
}

/// Ordinary least squares multiple regression with intercept.
///
/// Returns coefficients `[intercept, b_1, ..., b_k]` for `k` regressors. The system is solved by modified
/// Gram-Schmidt QR decomposition. A regressor that is a linear combination of the previous columns gets zero
/// coefficient, so fitted values are still the least squares projection of the response.
pub fn ols_estimate(regressors: &[&[f64]], response: &[f64]) -> Result<Vec<f64>> {
    let rows = response.len();
    if rows <= regressors.len() {
        return Err(OverloadError::InsufficientData {
            required: regressors.len() + 1,
            available: rows,
        });
    }
    check_finite(response)?;
    for regressor in regressors {
        if regressor.len() != rows {
            return Err(OverloadError::DegenerateFit(format!(
                "regressor has {} values, response has {}",
                regressor.len(),
                rows
            )));
        }
        check_finite(regressor)?;
    }

    let mut columns: Vec<Vec<f64>> = vec![vec![1.; rows]];
    columns.extend(regressors.iter().map(|r| r.to_vec()));
    let params = columns.len();

    // q holds orthonormal basis of the kept columns, r[a][j] = <q_a, column_j>
    let mut q: Vec<Vec<f64>> = Vec::with_capacity(params);
    let mut r: Vec<Vec<f64>> = Vec::with_capacity(params);
    let mut kept: Vec<usize> = Vec::with_capacity(params);
    for (j, column) in columns.iter().enumerate() {
        let initial_norm = norm(column);
        let mut v = column.clone();
        for (a, qa) in q.iter().enumerate() {
            let projection = dot(qa, &v);
            r[a][j] = projection;
            for (vi, qi) in v.iter_mut().zip(qa) {
                *vi -= projection * qi;
            }
        }
        let residual_norm = norm(&v);
        if initial_norm == 0. || residual_norm <= RANK_TOLERANCE * initial_norm {
            continue;
        }
        v.iter_mut().for_each(|vi| *vi /= residual_norm);
        q.push(v);
        let mut row = vec![0.; params];
        row[j] = residual_norm;
        r.push(row);
        kept.push(j);
    }

    let qty: Vec<f64> = q.iter().map(|qa| dot(qa, response)).collect();
    let mut coefficients = vec![0.; params];
    for a in (0..kept.len()).rev() {
        let mut s = qty[a];
        for &j in &kept[a + 1..] {
            s -= r[a][j] * coefficients[j];
        }
        coefficients[kept[a]] = s / r[a][kept[a]];
    }
    check_finite(&coefficients)?;
    Ok(coefficients)
}

/// Evaluates regression with `coefficients` (intercept first) at the given regressor values.
pub fn evaluate(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients[0]
        + coefficients[1..]
            .iter()
            .zip(values)
            .map(|(coefficient, value)| coefficient * value)
            .sum::<f64>()
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().find(|v| !v.is_finite()) {
        Some(value) => Err(OverloadError::DegenerateFit(format!("non-finite value {}", value))),
        None => Ok(()),
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(a: &[f64]) -> f64 {
    dot(a, a).sqrt()
}
