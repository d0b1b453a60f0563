//! Display-safe number formatting.
//!
//! Upstream quote fields may be absent, null or non-finite. These helpers
//! collapse all of those to zero instead of surfacing an error.

use serde::{Deserialize, Deserializer};

/// Format `value` with `decimals` places, rendering non-finite input as zero.
pub fn display_fixed(value: f64, decimals: usize) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.*}", decimals, value)
}

/// Serde helper: `null`, missing and non-finite numbers become `0.0`.
pub fn zero_if_missing<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite()).unwrap_or(0.0))
}

/// Round to two decimal places, the precision used for reported scores.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wire {
        #[serde(default, deserialize_with = "zero_if_missing")]
        c: f64,
    }

    #[test]
    fn test_display_fixed_handles_non_finite() {
        assert_eq!(display_fixed(f64::NAN, 2), "0.00");
        assert_eq!(display_fixed(f64::INFINITY, 2), "0.00");
        assert_eq!(display_fixed(12.346, 2), "12.35");
        assert_eq!(display_fixed(3.0, 0), "3");
    }

    #[test]
    fn test_zero_if_missing() {
        let null: Wire = serde_json::from_str(r#"{"c": null}"#).unwrap();
        assert_eq!(null.c, 0.0);

        let missing: Wire = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.c, 0.0);

        let present: Wire = serde_json::from_str(r#"{"c": 187.5}"#).unwrap();
        assert_eq!(present.c, 187.5);
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.3333), 33.33);
        assert_eq!(round2(2.0 / 3.0), 0.67);
    }
}
