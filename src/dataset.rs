// The loaded housing collection: records, learned bounds and normalized samples.
use std::io::Read;

use log::{debug, info};
use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::io::{self, Record};
use crate::preprocess::{encode, Bounds, FEATURE_COUNT};
use crate::stats;

/// A record together with its normalized features and target.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub record: Record,
    pub features: Vec<f64>,
    pub target: f64,
}

/// Training and testing views into a `Dataset`.
#[derive(Debug, Clone)]
pub struct Split<'a> {
    pub training: Vec<&'a Entry>,
    pub testing: Vec<&'a Entry>,
}

/// Immutable once built. Bounds are learned from the whole collection, never from a
/// split, so every split is scaled the same way and predictions can be denormalized.
///
/// A `Dataset` holds no interior mutability and can be shared with a background trainer
/// by reference.
#[derive(Debug, Clone)]
pub struct Dataset {
    entries: Vec<Entry>,
    bounds: Bounds,
}

impl Dataset {
    /// Builds a dataset from parsed records. An empty collection is allowed and
    /// degrades to zero bounds.
    pub fn from_records(records: Vec<Record>) -> Self {
        let bounds = Bounds::fit(&records);
        let entries: Vec<Entry> = records
            .into_iter()
            .map(|record| {
                let features = bounds.normalize_features(&encode(&record));
                let target = bounds.normalize_price(record.price);
                Entry { record, features, target }
            })
            .collect();
        debug!("normalized {} records", entries.len());
        Dataset { entries, bounds }
    }

    /// Parses every row after the header. Fails on the first malformed row or when no
    /// data rows remain.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        let records = io::read_records(reader)?;
        Self::checked(records)
    }

    pub fn load_csv(path: &str) -> Result<Self> {
        let records = io::load_csv(path)?;
        Self::checked(records)
    }

    fn checked(records: Vec<Record>) -> Result<Self> {
        if records.is_empty() {
            return Err(Error::EmptyDataset);
        }
        let ds = Self::from_records(records);
        info!("Data normalization completed ({} records)", ds.len());
        Ok(ds)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.entries.iter().map(|e| &e.record)
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Length of the normalized feature vector.
    pub fn input_dimension(&self) -> usize {
        self.bounds.dimension()
    }

    pub fn denormalize_price(&self, norm: f64) -> f64 {
        self.bounds.denormalize_price(norm)
    }

    pub fn average_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.records().map(|r| r.area).sum::<f64>() / self.len() as f64
    }

    /// Shuffles the record order with `seed` and cuts it at `floor(n * train_ratio)`.
    /// The same seed always gives the same split.
    pub fn split(&self, train_ratio: f64, seed: u64) -> Result<Split<'_>> {
        if !(train_ratio > 0.0 && train_ratio <= 1.0) {
            return Err(Error::InvalidRatio(train_ratio));
        }

        let mut order: Vec<&Entry> = self.entries.iter().collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let training_size = ((order.len() as f64 * train_ratio).floor() as usize).min(order.len());
        let testing = order.split_off(training_size);
        info!(
            "Data split: {} training samples, {} testing samples",
            order.len(),
            testing.len()
        );
        Ok(Split { training: order, testing })
    }

    /// `n x input_dimension` matrix of normalized features.
    pub fn feature_matrix(&self, entries: &[&Entry]) -> Array2<f64> {
        let mut x = Array2::<f64>::zeros((entries.len(), self.input_dimension()));
        for (mut row, e) in x.axis_iter_mut(Axis(0)).zip(entries) {
            for (cell, &v) in row.iter_mut().zip(&e.features) {
                *cell = v;
            }
        }
        x
    }

    /// `n x 1` matrix of normalized prices.
    pub fn target_matrix(&self, entries: &[&Entry]) -> Array2<f64> {
        Array2::from_shape_fn((entries.len(), 1), |(i, _)| entries[i].target)
    }

    /// Raw features followed by the raw price, one row per record.
    pub fn raw_matrix(&self) -> Array2<f64> {
        let width = FEATURE_COUNT + 1;
        let mut m = Array2::<f64>::zeros((self.len(), width));
        for (i, r) in self.records().enumerate() {
            for (j, v) in encode(r).into_iter().enumerate() {
                m[(i, j)] = v;
            }
            m[(i, width - 1)] = r.price;
        }
        m
    }

    /// Pearson correlation of every feature and the price over raw values.
    pub fn correlation_matrix(&self) -> Array2<f64> {
        stats::correlation_matrix(&self.raw_matrix())
    }
}
