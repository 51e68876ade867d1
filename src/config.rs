// Command-line configuration.
use clap::Parser;

use crate::model::TrainingOptions;

/// Train a price model on a housing CSV and report how well it predicts held-out houses.
#[derive(Debug, Clone, Parser)]
#[command(name = "housing_pipeline", version)]
pub struct Config {
    /// Housing CSV with a header row and 13 columns
    #[arg(default_value = "data/housing_sample.csv")]
    pub path: String,

    /// Fraction of records used for training, in (0, 1]
    #[arg(long, default_value_t = 0.8)]
    pub train_ratio: f64,

    /// Seed for the train/test shuffle
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    #[arg(long, default_value_t = 1)]
    pub epochs: usize,

    /// Log a training checkpoint every N epochs
    #[arg(long, default_value_t = 100)]
    pub report_every: usize,

    /// Also report the percentage error over only the first N testing samples
    #[arg(long)]
    pub sample_window: Option<usize>,

    /// Number of sample predictions to print
    #[arg(long, default_value_t = 3)]
    pub show_samples: usize,

    /// Predict one house from 12 comma-separated raw feature values
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub predict: Option<Vec<f64>>,

    /// Log filter, overrides RUST_LOG
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Config {
    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            epochs: self.epochs,
            report_every: self.report_every,
        }
    }
}
