//! Least-squares first-degree polynomial fit.

/// `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LinearFit {
    pub fn eval(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fits a line through `(xs[i], ys[i])`.
///
/// Returns `None` when fewer than two points are given or every x is the
/// same, since the slope is then undefined.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<LinearFit> {
    let n = xs.len().min(ys.len());
    if n < 2 {
        return None;
    }
    let nf = n as f64;

    // Centre on the means; raw day ordinals are large and the textbook
    // n*sum_xx - sum_x^2 form loses precision.
    let mean_x = xs[..n].iter().sum::<f64>() / nf;
    let mean_y = ys[..n].iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (&x, &y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    if sxx.abs() < 1e-12 {
        return None;
    }

    let slope = sxy / sxx;
    Some(LinearFit {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
