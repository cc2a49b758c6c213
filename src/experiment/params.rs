//! Parameter values for experiments
//!
//! Experiment parameters are open-ended: numeric values participate in safe
//! ranges, clamping, and feature extraction; text values are carried through
//! untouched.

use serde::{Deserialize, Serialize};

/// A single experiment parameter value, numeric or categorical.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ParamValue {
    /// Numeric value (latency, error rates, packet loss percentages, ...).
    Number(f64),
    /// Categorical value (failure type tags, mode switches, ...).
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value, `None` for text.
    #[must_use]
    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Text view of the value, `None` for numbers.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Number(_) => None,
            Self::Text(s) => Some(s),
        }
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        #[allow(clippy::cast_precision_loss)]
        Self::Number(value as f64)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_view() {
        assert_eq!(ParamValue::from(42.0).as_number(), Some(42.0));
        assert_eq!(ParamValue::from("latency").as_number(), None);
    }

    #[test]
    fn test_untagged_serde() {
        let n: ParamValue = serde_json::from_str("1500").unwrap();
        assert_eq!(n, ParamValue::Number(1500.0));
        let t: ParamValue = serde_json::from_str("\"error\"").unwrap();
        assert_eq!(t, ParamValue::Text("error".to_string()));
    }
}
