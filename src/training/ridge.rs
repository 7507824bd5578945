//! Ridge-regularized least squares for the hyperplane regression.

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::{Result, TrackError};

pub(crate) struct RidgeSolution {
    /// Coefficient matrix mapping a difference vector to a parameter
    /// update: rows = targets, columns = predictors.
    pub matrix: Array2<f64>,
    /// Effective condition number of the regularized normal equations.
    pub condition: f64,
}

/// Solve `X * W ~= Y` for `W` in the ridge sense and return `W` transposed,
/// so that applying the result is a plain matrix-vector product against a
/// difference vector.
///
/// `x` is the design matrix (one difference vector per row), `y` the target
/// matrix (one parameter vector per row). Fails with
/// `IllConditionedTemplate` when the regularized system's condition number
/// exceeds `condition_threshold`, meaning the template cannot support a
/// stable regression.
pub(crate) fn solve_ridge(
    x: &Array2<f64>,
    y: &Array2<f64>,
    lambda: f64,
    condition_threshold: f64,
) -> Result<RidgeSolution> {
    let (n, m) = x.dim();
    let targets = y.dim().1;
    debug_assert_eq!(n, y.dim().0);

    let x_na = DMatrix::from_fn(n, m, |r, c| x[[r, c]]);
    let y_na = DMatrix::from_fn(n, targets, |r, c| y[[r, c]]);

    let condition = regularized_condition(&x_na, lambda);
    if !condition.is_finite() || condition > condition_threshold {
        return Err(TrackError::IllConditionedTemplate {
            condition,
            threshold: condition_threshold,
        });
    }

    // Normal equations: (X'X + lambda I) W = X'Y
    let mut gram = x_na.transpose() * &x_na;
    for i in 0..m {
        gram[(i, i)] += lambda;
    }
    let rhs = x_na.transpose() * y_na;

    let chol = gram
        .cholesky()
        .ok_or(TrackError::IllConditionedTemplate {
            condition,
            threshold: condition_threshold,
        })?;
    let weights = chol.solve(&rhs);

    let matrix = Array2::from_shape_fn((targets, m), |(r, c)| weights[(c, r)]);
    Ok(RidgeSolution { matrix, condition })
}

/// Condition number of `X'X + lambda I` from the singular values of `X`.
///
/// A vanishing largest singular value (e.g. an all-zero design matrix from a
/// textureless template) reports an infinite condition number.
fn regularized_condition(x: &DMatrix<f64>, lambda: f64) -> f64 {
    let svd = x.clone().svd(false, false);
    let mut sigma_max = 0.0f64;
    let mut sigma_min = f64::INFINITY;
    for &s in svd.singular_values.iter() {
        sigma_max = sigma_max.max(s);
        sigma_min = sigma_min.min(s);
    }
    if sigma_max * sigma_max < 1e-15 {
        return f64::INFINITY;
    }
    (sigma_max * sigma_max + lambda) / (sigma_min * sigma_min + lambda)
}
