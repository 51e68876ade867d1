//! Housing price data pipeline: CSV ingestion, feature encoding, min-max scaling,
//! seeded train/test splits, correlation summary and prediction metrics.
//!
//! The regression model itself sits behind [`model::Regressor`]; [`model::LinearRegressor`]
//! is the linfa-backed implementation used by the binary.
pub mod config;
pub mod dataset;
pub mod error;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod preprocess;
pub mod stats;

pub use dataset::{Dataset, Entry, Split};
pub use error::{Error, ParseError, Result};
pub use io::{FurnishingStatus, Record};
pub use stats::Metrics;
