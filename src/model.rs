/// The regression model seen from the pipeline, and linear regression through linfa.
use std::sync::atomic::{AtomicBool, Ordering};

use linfa::prelude::*;
use linfa_linear::{FittedLinearRegression, LinearRegression};
use log::{debug, info, warn};
use ndarray::{Array1, Array2, Axis};

use crate::error::{Error, Result};

/// Anything that can learn normalized prices from normalized features.
///
/// Targets and predictions are `n x 1` matrices.
pub trait Regressor {
    fn fit(&mut self, features: &Array2<f64>, targets: &Array2<f64>) -> Result<()>;

    fn predict(&self, features: &Array2<f64>) -> Result<Array2<f64>>;

    /// Training loss after the last `fit`, if the model tracks one.
    fn score(&self) -> Option<f64> {
        None
    }
}

/// Ordinary least squares. Constant columns are left out of the fit and get a
/// zero coefficient, since they carry no information and make the system singular.
#[derive(Default)]
pub struct LinearRegressor {
    fitted: Option<FittedLinearRegression<f64>>,
    kept: Vec<usize>,
    width: usize,
    score: Option<f64>,
}

impl LinearRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficient per input column (0.0 for dropped columns) and the intercept.
    pub fn coefficients(&self) -> Option<(Vec<f64>, f64)> {
        let fitted = self.fitted.as_ref()?;
        let mut coefs = vec![0.0; self.width];
        for (&col, &c) in self.kept.iter().zip(fitted.params().iter()) {
            coefs[col] = c;
        }
        Some((coefs, fitted.intercept()))
    }

    fn kept_columns(&self, features: &Array2<f64>) -> Array2<f64> {
        features.select(Axis(1), &self.kept)
    }
}

impl Regressor for LinearRegressor {
    fn fit(&mut self, features: &Array2<f64>, targets: &Array2<f64>) -> Result<()> {
        let (n, width) = features.dim();
        if n == 0 {
            return Err(Error::EmptyDataset);
        }
        if targets.nrows() != n {
            return Err(Error::LengthMismatch {
                predictions: n,
                targets: targets.nrows(),
            });
        }

        // state is only replaced once the new fit has succeeded
        let kept: Vec<usize> = (0..width)
            .filter(|&c| {
                let col = features.column(c);
                let first = col[0];
                col.iter().any(|&v| v != first)
            })
            .collect();
        if kept.is_empty() {
            return Err(Error::Model("every feature column is constant".into()));
        }
        if kept.len() < width {
            debug!("dropping {} constant columns before fitting", width - kept.len());
        }

        let x = features.select(Axis(1), &kept);
        let y: Array1<f64> = targets.column(0).to_owned();
        let ds = linfa::Dataset::new(x.clone(), y.clone());
        let fitted = LinearRegression::new()
            .fit(&ds)
            .map_err(|e| Error::Model(e.to_string()))?;

        let predicted: Array1<f64> = fitted.predict(&x);
        let mse = (&predicted - &y).mapv(|d| d * d).mean().unwrap_or(f64::NAN);
        self.fitted = Some(fitted);
        self.kept = kept;
        self.width = width;
        self.score = Some(mse);
        Ok(())
    }

    fn predict(&self, features: &Array2<f64>) -> Result<Array2<f64>> {
        let fitted = self
            .fitted
            .as_ref()
            .ok_or_else(|| Error::Model("model has not been trained".into()))?;
        if features.ncols() != self.width {
            return Err(Error::DimensionMismatch {
                expected: self.width,
                found: features.ncols(),
            });
        }
        let x = self.kept_columns(features);
        let predicted: Array1<f64> = fitted.predict(&x);
        Ok(predicted.insert_axis(Axis(1)))
    }

    fn score(&self) -> Option<f64> {
        self.score
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingOptions {
    pub epochs: usize,
    /// Emit an `Epoch` event every this many epochs.
    pub report_every: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        TrainingOptions {
            epochs: 1,
            report_every: 100,
        }
    }
}

/// Coarse progress checkpoints of `train`.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingEvent {
    Started { samples: usize, epochs: usize },
    Epoch { epoch: usize, score: Option<f64> },
    Completed { score: Option<f64> },
    Failed { reason: String },
    Cancelled { epoch: usize },
}

/// Fits `model` for `options.epochs` rounds, reporting through `on_event`.
///
/// `cancel` is checked before every epoch. The function does no threading of its own;
/// callers that want training off their main thread move it there and share the
/// `Dataset` read-only.
pub fn train<M, F>(
    model: &mut M,
    features: &Array2<f64>,
    targets: &Array2<f64>,
    options: &TrainingOptions,
    cancel: Option<&AtomicBool>,
    mut on_event: F,
) -> Result<()>
where
    M: Regressor + ?Sized,
    F: FnMut(TrainingEvent),
{
    let epochs = options.epochs.max(1);
    let report_every = options.report_every.max(1);
    on_event(TrainingEvent::Started {
        samples: features.nrows(),
        epochs,
    });

    for epoch in 0..epochs {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            warn!("training cancelled at epoch {}", epoch);
            on_event(TrainingEvent::Cancelled { epoch });
            return Err(Error::Cancelled { epochs: epoch });
        }
        if let Err(e) = model.fit(features, targets) {
            on_event(TrainingEvent::Failed {
                reason: e.to_string(),
            });
            return Err(e);
        }
        if epoch % report_every == 0 {
            let score = model.score();
            info!("Epoch {}, Score: {:?}", epoch, score);
            on_event(TrainingEvent::Epoch { epoch, score });
        }
    }

    on_event(TrainingEvent::Completed {
        score: model.score(),
    });
    Ok(())
}
