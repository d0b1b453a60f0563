use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::AlertError;

/// Price band for one symbol. Ticks at or below `lower`, or at or above
/// `upper`, raise an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ThresholdRule {
    pub lower: f64,
    /// `null` on the wire means unbounded
    #[serde(with = "unbounded", default = "unbounded::infinity")]
    #[schema(value_type = Option<f64>)]
    pub upper: f64,
}

impl ThresholdRule {
    /// Inverted bands (`lower > upper`) and NaN bounds are rejected.
    pub fn new(lower: f64, upper: f64) -> Result<Self, AlertError> {
        if lower.is_nan() || upper.is_nan() {
            return Err(AlertError::InvalidBound("bounds must be numbers".to_string()));
        }
        if lower > upper {
            return Err(AlertError::InvertedRange { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Build a rule from optional bounds: a missing lower bound is 0, a
    /// missing upper bound is unbounded. At least one bound is required.
    pub fn from_bounds(lower: Option<f64>, upper: Option<f64>) -> Result<Self, AlertError> {
        let lower = lower.filter(|v| *v != 0.0);
        let upper = upper.filter(|v| *v != 0.0);
        if lower.is_none() && upper.is_none() {
            return Err(AlertError::MissingBounds);
        }
        Self::new(lower.unwrap_or(0.0), upper.unwrap_or(f64::INFINITY))
    }
}

/// Rules keyed by upper-cased symbol; one rule per symbol, last write wins.
#[derive(Debug, Clone, Default)]
pub struct ThresholdBook {
    rules: HashMap<String, ThresholdRule>,
}

impl ThresholdBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a rule, returning the one it replaced
    pub fn set(&mut self, symbol: &str, rule: ThresholdRule) -> Option<ThresholdRule> {
        self.rules.insert(normalize(symbol), rule)
    }

    pub fn remove(&mut self, symbol: &str) -> Option<ThresholdRule> {
        self.rules.remove(&normalize(symbol))
    }

    pub fn get(&self, symbol: &str) -> Option<&ThresholdRule> {
        self.rules.get(&normalize(symbol))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules sorted by symbol
    pub fn entries(&self) -> Vec<(String, ThresholdRule)> {
        let mut entries: Vec<(String, ThresholdRule)> =
            self.rules.iter().map(|(s, r)| (s.clone(), *r)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }
}

fn normalize(symbol: &str) -> String {
    symbol.trim().to_ascii_uppercase()
}

mod unbounded {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn infinity() -> f64 {
        f64::INFINITY
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}
