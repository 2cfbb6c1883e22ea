// src/features.rs - Fixed-schema feature vectors, labelled records and log scaling

use serde::{Deserialize, Serialize};

/// Column name of the class label in every output file
pub const LABEL_COLUMN: &str = "clase";

/// A descriptor with a fixed, ordered set of named numeric columns
pub trait FeatureVector: Sized {
    /// Column names, in the order `values` returns them
    fn column_names() -> Vec<String>;

    fn values(&self) -> Vec<f64>;

    /// Apply `f` to every numeric field
    fn map_values<F: Fn(f64) -> f64>(&self, f: F) -> Self;
}

/// Logarithm used by the log-scale normaliser; one base per output file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogBase {
    #[default]
    Natural,
    Base10,
}

impl LogBase {
    /// `log(1 + value)`, accurate for small values
    fn log1p(&self, value: f64) -> f64 {
        match self {
            LogBase::Natural => value.ln_1p(),
            LogBase::Base10 => value.ln_1p() / std::f64::consts::LN_10,
        }
    }
}

/// `sign(v) * log(|v| + 1)`, with zero mapped to 0.0
pub fn log_scale(value: f64, base: LogBase) -> f64 {
    if value == 0.0 || value.is_nan() {
        return 0.0;
    }
    value.signum() * base.log1p(value.abs())
}

/// One output row: a descriptor plus the class label it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledRecord<T: FeatureVector> {
    pub features: T,
    pub label: String,
}

impl<T: FeatureVector> LabeledRecord<T> {
    pub fn new(features: T, label: impl Into<String>) -> Self {
        Self {
            features,
            label: label.into(),
        }
    }

    /// Log-scale every numeric field; the label passes through untouched
    pub fn log_scaled(&self, base: LogBase) -> Self {
        Self {
            features: self.features.map_values(|v| log_scale(v, base)),
            label: self.label.clone(),
        }
    }

    /// Header row: the descriptor columns followed by the label column
    pub fn header() -> Vec<String> {
        let mut header = T::column_names();
        header.push(LABEL_COLUMN.to_string());
        header
    }
}
