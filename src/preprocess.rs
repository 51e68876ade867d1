// Feature encoding and min-max scaling.
use log::warn;

use crate::io::Record;

/// Number of values `encode` produces.
pub const FEATURE_COUNT: usize = 12;

/// Order of the encoded feature vector. Training and inference both rely on it.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "area",
    "bedrooms",
    "bathrooms",
    "stories",
    "mainroad",
    "guestroom",
    "basement",
    "hotwater",
    "ac",
    "parking",
    "prefarea",
    "furnishing",
];

fn flag(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Maps a record to its numeric feature vector, see `FEATURE_NAMES`.
pub fn encode(r: &Record) -> [f64; FEATURE_COUNT] {
    [
        r.area,
        r.bedrooms as f64,
        r.bathrooms as f64,
        r.stories as f64,
        flag(r.mainroad),
        flag(r.guestroom),
        flag(r.basement),
        flag(r.hot_water_heating),
        flag(r.air_conditioning),
        r.parking as f64,
        flag(r.preferred_area),
        r.furnishing_status.code(),
    ]
}

/// Scales `raw` into [0, 1]. A constant column (`hi == lo`) maps every value to 0.
pub fn normalize(raw: f64, lo: f64, hi: f64) -> f64 {
    let range = hi - lo;
    if range == 0.0 {
        0.0
    } else {
        (raw - lo) / range
    }
}

/// Inverse of `normalize`. For a constant column this always returns `lo`.
pub fn denormalize(norm: f64, lo: f64, hi: f64) -> f64 {
    norm * (hi - lo) + lo
}

/// Per-feature and price min/max learned from a whole collection of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    pub feature_min: Vec<f64>,
    pub feature_max: Vec<f64>,
    pub price_min: f64,
    pub price_max: f64,
}

impl Bounds {
    /// Single pass over `records`. An empty slice yields all-zero bounds.
    pub fn fit(records: &[Record]) -> Self {
        let Some(first) = records.first() else {
            return Bounds {
                feature_min: vec![0.0; FEATURE_COUNT],
                feature_max: vec![0.0; FEATURE_COUNT],
                price_min: 0.0,
                price_max: 0.0,
            };
        };

        let seed = encode(first);
        let mut bounds = Bounds {
            feature_min: seed.to_vec(),
            feature_max: seed.to_vec(),
            price_min: first.price,
            price_max: first.price,
        };
        for r in records {
            for (f, v) in encode(r).into_iter().enumerate() {
                bounds.feature_min[f] = bounds.feature_min[f].min(v);
                bounds.feature_max[f] = bounds.feature_max[f].max(v);
            }
            bounds.price_min = bounds.price_min.min(r.price);
            bounds.price_max = bounds.price_max.max(r.price);
        }

        for f in bounds.degenerate_features() {
            warn!(
                "feature `{}` is constant ({}); it normalizes to 0.0",
                FEATURE_NAMES[f], bounds.feature_min[f]
            );
        }
        if bounds.price_min == bounds.price_max {
            warn!("price is constant ({}); targets normalize to 0.0", bounds.price_min);
        }
        bounds
    }

    pub fn dimension(&self) -> usize {
        self.feature_min.len()
    }

    /// Indices of features whose min equals max.
    pub fn degenerate_features(&self) -> Vec<usize> {
        self.feature_min
            .iter()
            .zip(&self.feature_max)
            .enumerate()
            .filter(|(_, (lo, hi))| lo == hi)
            .map(|(i, _)| i)
            .collect()
    }

    /// Normalizes a raw feature vector. The caller checks the length.
    pub fn normalize_features(&self, raw: &[f64]) -> Vec<f64> {
        raw.iter()
            .zip(self.feature_min.iter().zip(&self.feature_max))
            .map(|(&v, (&lo, &hi))| normalize(v, lo, hi))
            .collect()
    }

    pub fn normalize_price(&self, price: f64) -> f64 {
        normalize(price, self.price_min, self.price_max)
    }

    pub fn denormalize_price(&self, norm: f64) -> f64 {
        denormalize(norm, self.price_min, self.price_max)
    }
}
