// Correlation summary and prediction-quality metrics.
use log::warn;
use ndarray::{Array2, Axis};

use crate::error::{Error, Result};

/// Symmetric Pearson correlation matrix of the columns of `data`.
///
/// Pairs involving a zero-variance column get 0.0; the diagonal is 1.0. With no rows
/// the result is an all-zero matrix.
pub fn correlation_matrix(data: &Array2<f64>) -> Array2<f64> {
    let (rows, cols) = data.dim();
    let mut corr = Array2::<f64>::zeros((cols, cols));
    if rows == 0 {
        return corr;
    }

    let Some(means) = data.mean_axis(Axis(0)) else {
        return corr;
    };
    let centered = data - &means;

    for i in 0..cols {
        corr[(i, i)] = 1.0;
        for j in (i + 1)..cols {
            let di = centered.column(i);
            let dj = centered.column(j);
            let cov = di.dot(&dj);
            let si = di.dot(&di);
            let sj = dj.dot(&dj);
            let r = if si > 0.0 && sj > 0.0 {
                (cov / (si.sqrt() * sj.sqrt())).clamp(-1.0, 1.0)
            } else {
                0.0
            };
            corr[(i, j)] = r;
            corr[(j, i)] = r;
        }
    }
    corr
}

/// Why a metric came out as NaN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Undefined {
    /// No samples at all; every metric is NaN.
    NoSamples,
    /// Targets have zero variance, so R² is NaN.
    ConstantTargets,
    /// Samples with a zero target were left out of the percentage error.
    ZeroTargets { count: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    pub samples: usize,
    pub mse: f64,
    pub rmse: f64,
    pub r2: f64,
    /// Mean absolute percentage error, in percent.
    pub mape: f64,
    pub undefined: Vec<Undefined>,
}

impl Metrics {
    fn empty() -> Self {
        Metrics {
            samples: 0,
            mse: f64::NAN,
            rmse: f64::NAN,
            r2: f64::NAN,
            mape: f64::NAN,
            undefined: vec![Undefined::NoSamples],
        }
    }

    pub fn is_complete(&self) -> bool {
        self.undefined.is_empty()
    }
}

/// Mean absolute percentage error, skipping zero targets.
/// Returns the value (NaN when nothing is left) and how many samples were skipped.
pub fn mean_percentage_error(predictions: &[f64], targets: &[f64]) -> (f64, usize) {
    let mut total = 0.0;
    let mut used = 0usize;
    let mut skipped = 0usize;
    for (&p, &t) in predictions.iter().zip(targets) {
        if t == 0.0 {
            skipped += 1;
            continue;
        }
        total += ((p - t) / t).abs() * 100.0;
        used += 1;
    }
    let value = if used == 0 { f64::NAN } else { total / used as f64 };
    (value, skipped)
}

/// Percentage error over the first `window` samples only.
pub fn windowed_percentage_error(predictions: &[f64], targets: &[f64], window: usize) -> (f64, usize) {
    let n = window.min(predictions.len()).min(targets.len());
    mean_percentage_error(&predictions[..n], &targets[..n])
}

/// MSE, RMSE, R² and MAPE of `predictions` against `targets`, both on the same scale.
///
/// Undefined metrics are reported as NaN and listed in `Metrics::undefined`; only a
/// length mismatch is an error.
pub fn evaluate(predictions: &[f64], targets: &[f64]) -> Result<Metrics> {
    if predictions.len() != targets.len() {
        return Err(Error::LengthMismatch {
            predictions: predictions.len(),
            targets: targets.len(),
        });
    }
    let n = targets.len();
    if n == 0 {
        warn!("no samples to evaluate");
        return Ok(Metrics::empty());
    }

    let ss_res: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (p - t).powi(2))
        .sum();
    let mse = ss_res / n as f64;
    let mean = targets.iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = targets.iter().map(|t| (t - mean).powi(2)).sum();

    let mut undefined = Vec::new();
    let r2 = if ss_tot == 0.0 {
        warn!("targets are constant, R² is undefined");
        undefined.push(Undefined::ConstantTargets);
        f64::NAN
    } else {
        1.0 - ss_res / ss_tot
    };

    let (mape, skipped) = mean_percentage_error(predictions, targets);
    if skipped > 0 {
        warn!("{} zero targets left out of the percentage error", skipped);
        undefined.push(Undefined::ZeroTargets { count: skipped });
    }

    Ok(Metrics {
        samples: n,
        mse,
        rmse: mse.sqrt(),
        r2,
        mape,
        undefined,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let data = array![
            [1.0, 2.0, 9.0, 4.0],
            [2.0, 4.1, 7.0, 4.0],
            [3.0, 5.9, 8.0, 4.0],
            [4.0, 8.2, 1.0, 4.0],
            [5.0, 9.9, 3.0, 4.0],
        ];
        let c = correlation_matrix(&data);
        assert_eq!(c.dim(), (4, 4));
        for i in 0..4 {
            assert_eq!(c[(i, i)], 1.0);
            for j in 0..4 {
                assert_eq!(c[(i, j)], c[(j, i)]);
                assert!((-1.0..=1.0).contains(&c[(i, j)]));
            }
        }
        assert!(c[(0, 1)] > 0.99);
        assert!(c[(0, 2)] < 0.0);
        // constant column
        assert_eq!(c[(0, 3)], 0.0);
        assert_eq!(c[(3, 3)], 1.0);
    }

    #[test]
    fn perfectly_linear_columns_correlate_fully() {
        let data = array![[1.0, -2.0], [2.0, -4.0], [3.0, -6.0]];
        let c = correlation_matrix(&data);
        assert!(close(c[(0, 1)], -1.0));
    }

    #[test]
    fn correlation_is_idempotent() {
        let data = array![[1.0, 3.0], [2.0, 1.0], [4.0, 2.0]];
        assert_eq!(correlation_matrix(&data), correlation_matrix(&data));
    }

    #[test]
    fn no_rows_gives_zero_matrix() {
        let c = correlation_matrix(&Array2::zeros((0, 13)));
        assert_eq!(c.dim(), (13, 13));
        assert!(c.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn perfect_predictor() {
        let t = [0.1, 0.4, 0.9, 0.3];
        let m = evaluate(&t, &t).unwrap();
        assert_eq!(m.mse, 0.0);
        assert_eq!(m.rmse, 0.0);
        assert_eq!(m.r2, 1.0);
        assert_eq!(m.mape, 0.0);
        assert!(m.is_complete());
    }

    #[test]
    fn known_errors() {
        let m = evaluate(&[1.0, 2.0, 5.0], &[2.0, 2.0, 4.0]).unwrap();
        // residuals -1, 0, 1
        assert!(close(m.mse, 2.0 / 3.0));
        assert!(close(m.rmse, (2.0f64 / 3.0).sqrt()));
        // mean 8/3, ss_tot = 4/9 + 4/9 + 16/9 = 24/9
        assert!(close(m.r2, 1.0 - 2.0 / (24.0 / 9.0)));
        assert!(close(m.mape, (50.0 + 0.0 + 25.0) / 3.0));
    }

    #[test]
    fn undefined_metrics_are_flagged() {
        let m = evaluate(&[], &[]).unwrap();
        assert!(m.mse.is_nan() && m.rmse.is_nan() && m.r2.is_nan() && m.mape.is_nan());
        assert_eq!(m.undefined, vec![Undefined::NoSamples]);

        let m = evaluate(&[1.0, 2.0], &[3.0, 3.0]).unwrap();
        assert!(m.r2.is_nan());
        assert!(close(m.mse, 2.5));
        assert_eq!(m.undefined, vec![Undefined::ConstantTargets]);

        let m = evaluate(&[1.0, 2.0, 0.5], &[0.0, 4.0, 1.0]).unwrap();
        assert!(close(m.mape, 50.0));
        assert_eq!(m.undefined, vec![Undefined::ZeroTargets { count: 1 }]);
    }

    #[test]
    fn length_mismatch_is_an_error() {
        assert!(matches!(
            evaluate(&[1.0], &[1.0, 2.0]),
            Err(Error::LengthMismatch { predictions: 1, targets: 2 })
        ));
    }

    #[test]
    fn windowed_error_uses_leading_samples() {
        let p = [110.0, 90.0, 300.0];
        let t = [100.0, 100.0, 100.0];
        let (w, skipped) = windowed_percentage_error(&p, &t, 2);
        assert!(close(w, 10.0));
        assert_eq!(skipped, 0);
        let (all, _) = windowed_percentage_error(&p, &t, 10);
        assert!(close(all, (10.0 + 10.0 + 200.0) / 3.0));
        let (none, _) = mean_percentage_error(&[1.0], &[0.0]);
        assert!(none.is_nan());
    }
}
