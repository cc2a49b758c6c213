//! Feature standardization (mean/variance scaling)

use serde::{Deserialize, Serialize};

/// Standardizes features to zero mean and unit variance.
///
/// A feature with zero variance is left centered only, so constant columns
/// (like the dummy-fit sample) do not produce NaNs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StandardScaler {
    means: Vec<f64>,
    stds: Vec<f64>,
}

impl StandardScaler {
    /// Create an unfitted scaler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to a non-empty sample matrix (rows = samples).
    pub fn fit(&mut self, samples: &[Vec<f64>]) {
        let Some(first) = samples.first() else {
            return;
        };
        let n_features = first.len();
        #[allow(clippy::cast_precision_loss)]
        let n = samples.len() as f64;

        self.means = (0..n_features)
            .map(|f| samples.iter().map(|row| row[f]).sum::<f64>() / n)
            .collect();
        self.stds = (0..n_features)
            .map(|f| {
                let mean = self.means[f];
                let variance =
                    samples.iter().map(|row| (row[f] - mean).powi(2)).sum::<f64>() / n;
                variance.sqrt()
            })
            .collect();
    }

    /// Scale one feature vector with the fitted statistics.
    #[must_use]
    pub fn transform(&self, features: &[f64]) -> Vec<f64> {
        features
            .iter()
            .enumerate()
            .map(|(f, &value)| {
                let mean = self.means.get(f).copied().unwrap_or(0.0);
                let std = self.stds.get(f).copied().unwrap_or(0.0);
                if std < f64::EPSILON {
                    value - mean
                } else {
                    (value - mean) / std
                }
            })
            .collect()
    }
}
