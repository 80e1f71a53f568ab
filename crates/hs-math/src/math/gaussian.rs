//! Diagonal-covariance Gaussian densities and column moments.

/// ln(2π), used by every Gaussian log-density term.
const LN_2PI: f64 = 1.837_877_066_409_345_5;

/// Log density of `x` under a Gaussian with diagonal covariance.
///
/// `mean` and `var` must have the same length as `x`. Non-positive variances
/// yield NaN so callers can detect a collapsed component.
pub fn diag_gaussian_log_pdf(x: &[f64], mean: &[f64], var: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), mean.len());
    debug_assert_eq!(x.len(), var.len());

    let mut log_prob = 0.0;
    for ((xi, mi), vi) in x.iter().zip(mean).zip(var) {
        if *vi <= 0.0 {
            return f64::NAN;
        }
        let diff = xi - mi;
        log_prob += -0.5 * (diff * diff / vi + vi.ln() + LN_2PI);
    }
    log_prob
}

/// Per-column mean and (population) variance of a row-major matrix.
///
/// Returns `None` when the matrix is empty or `dim` is zero.
pub fn column_moments(data: &[f64], dim: usize) -> Option<(Vec<f64>, Vec<f64>)> {
    if dim == 0 || data.is_empty() || data.len() % dim != 0 {
        return None;
    }
    let rows = data.len() / dim;
    let n = rows as f64;

    let mut mean = vec![0.0; dim];
    for row in data.chunks_exact(dim) {
        for (m, x) in mean.iter_mut().zip(row) {
            *m += x;
        }
    }
    for m in mean.iter_mut() {
        *m /= n;
    }

    let mut var = vec![0.0; dim];
    for row in data.chunks_exact(dim) {
        for ((v, x), m) in var.iter_mut().zip(row).zip(&mean) {
            let d = x - m;
            *v += d * d;
        }
    }
    for v in var.iter_mut() {
        *v /= n;
    }

    Some((mean, var))
}

/// Squared Euclidean distance between two equal-length vectors.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
