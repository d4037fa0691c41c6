// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

/// Ordinary least-squares fit of y = slope * x + y_intercept.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearRegression {
    pub slope: f64,
    pub y_intercept: f64,

    /// Coefficient of determination. At most 1.0; negative when the line
    /// predicts worse than the mean of y.
    pub r_squared: f64,
}

impl LinearRegression {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.y_intercept
    }
}

/// A line cannot be fitted to the given points. Distinct from a valid fit
/// with a poor `r_squared`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RegressionError {
    #[error("need at least 2 points, got {got}")]
    TooFewPoints { got: usize },

    #[error("insufficient concentration spread: all {count} x values are equal")]
    ZeroXVariance { count: usize },
}

/// Fits a line through `points` given as (x, y).
///
/// When every y is identical the fitted line passes through all points and
/// `r_squared` is reported as 1.0 rather than 0/0.
pub fn linear_regression(points: &[(f64, f64)])
                         -> Result<LinearRegression, RegressionError> {
    if points.len() < 2 {
        return Err(RegressionError::TooFewPoints{got: points.len()});
    }
    let n = points.len() as f64;
    let x_mean = points.iter().map(|p| p.0).sum::<f64>() / n;
    let y_mean = points.iter().map(|p| p.1).sum::<f64>() / n;

    let mut num = 0.0;
    let mut denom = 0.0;
    for &(x, y) in points {
        num += (x - x_mean) * (y - y_mean);
        denom += (x - x_mean) * (x - x_mean);
    }
    if denom == 0.0 {
        return Err(RegressionError::ZeroXVariance{count: points.len()});
    }
    let slope = num / denom;
    let y_intercept = y_mean - slope * x_mean;

    let mut residual_sum = 0.0;
    let mut total_sum = 0.0;
    for &(x, y) in points {
        let predicted = slope * x + y_intercept;
        residual_sum += (y - predicted) * (y - predicted);
        total_sum += (y - y_mean) * (y - y_mean);
    }
    let r_squared = if total_sum == 0.0 {
        1.0
    } else {
        1.0 - residual_sum / total_sum
    };
    Ok(LinearRegression{slope, y_intercept, r_squared})
}

/// Slope of the least-squares line through `values`, using each value's
/// position as its x coordinate. Returns 0.0 for fewer than two values.
pub fn index_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    // x is 0..n, so its mean and sum of squared deviations are closed form.
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;
    let mut num = 0.0;
    let mut denom = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        num += dx * (y - y_mean);
        denom += dx * dx;
    }
    num / denom
}

// mod tests.
