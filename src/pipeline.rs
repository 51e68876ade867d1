// Single-sample price prediction and test-split evaluation on top of a trained model.
use log::{debug, info, warn};
use ndarray::Array2;

use crate::dataset::{Dataset, Entry};
use crate::error::{Error, Result};
use crate::model::Regressor;
use crate::preprocess::{encode, Bounds};
use crate::stats::{self, Metrics, Undefined};

/// Predicts the price of one house from its raw (unnormalized) feature vector.
///
/// `bounds` must be the ones the model was trained against: features are scaled with
/// them on the way in and the price is denormalized with them on the way out.
pub fn predict_price<M>(raw_features: &[f64], bounds: &Bounds, model: &M) -> Result<f64>
where
    M: Regressor + ?Sized,
{
    if raw_features.len() != bounds.dimension() {
        return Err(Error::DimensionMismatch {
            expected: bounds.dimension(),
            found: raw_features.len(),
        });
    }
    let normalized = bounds.normalize_features(raw_features);
    let input = Array2::from_shape_vec((1, normalized.len()), normalized)
        .map_err(|e| Error::Model(e.to_string()))?;

    let output = model.predict(&input)?;
    let norm = output
        .iter()
        .next()
        .copied()
        .ok_or_else(|| Error::Model("model returned no prediction".into()))?;
    let price = bounds.denormalize_price(norm);
    debug!("normalized prediction {:.5} -> {:.2}", norm, price);
    Ok(price)
}

/// One row of the sample-prediction table.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePrediction {
    pub predicted: f64,
    pub actual: f64,
    pub error_pct: f64,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    /// MSE, RMSE and R² on the normalized scale; MAPE on the price scale.
    pub metrics: Metrics,
    /// Percentage error over the leading window, when one was asked for.
    pub windowed_mape: Option<f64>,
    pub samples: Vec<SamplePrediction>,
}

/// Scores `model` on `testing`. `window` limits the extra percentage-error figure to the
/// first samples of the testing set.
pub fn evaluate_split<M>(
    dataset: &Dataset,
    testing: &[&Entry],
    model: &M,
    window: Option<usize>,
) -> Result<Evaluation>
where
    M: Regressor + ?Sized,
{
    let targets: Vec<f64> = testing.iter().map(|e| e.target).collect();
    let predictions: Vec<f64> = if testing.is_empty() {
        Vec::new()
    } else {
        let x = dataset.feature_matrix(testing);
        model.predict(&x)?.iter().copied().collect()
    };

    let mut metrics = stats::evaluate(&predictions, &targets)?;

    let predicted_prices: Vec<f64> = predictions.iter().map(|&p| dataset.denormalize_price(p)).collect();
    let actual_prices: Vec<f64> = testing.iter().map(|e| e.record.price).collect();
    // the percentage error is reported on prices, so its zero-target flag must be too
    let (mape, skipped) = stats::mean_percentage_error(&predicted_prices, &actual_prices);
    metrics.mape = mape;
    metrics
        .undefined
        .retain(|u| !matches!(u, Undefined::ZeroTargets { .. }));
    if skipped > 0 {
        warn!("{} zero prices left out of the percentage error", skipped);
        metrics.undefined.push(Undefined::ZeroTargets { count: skipped });
    }
    let windowed_mape =
        window.map(|w| stats::windowed_percentage_error(&predicted_prices, &actual_prices, w).0);

    let samples = predicted_prices
        .iter()
        .zip(&actual_prices)
        .map(|(&predicted, &actual)| SamplePrediction {
            predicted,
            actual,
            error_pct: if actual == 0.0 {
                f64::NAN
            } else {
                ((predicted - actual) / actual).abs() * 100.0
            },
        })
        .collect();

    info!(
        "MSE (normalized): {:.5}, RMSE (normalized): {:.5}, R2: {:.5}",
        metrics.mse, metrics.rmse, metrics.r2
    );
    Ok(Evaluation {
        metrics,
        windowed_mape,
        samples,
    })
}

/// Simple hints shown next to a prediction: big area, preferred area and air
/// conditioning push the price up.
pub fn influential_factors(raw_features: &[f64], dataset: &Dataset) -> Vec<&'static str> {
    let mut out = Vec::new();
    let get = |i: usize| raw_features.get(i).copied().unwrap_or(0.0);
    if get(0) > dataset.average_area() {
        out.push("large area (+)");
    }
    if get(10) == 1.0 {
        out.push("preferred area (+)");
    }
    if get(8) == 1.0 {
        out.push("air conditioning (+)");
    }
    out
}

/// Raw feature vector of a known entry, handy for replaying test samples.
pub fn raw_features(entry: &Entry) -> Vec<f64> {
    encode(&entry.record).to_vec()
}
