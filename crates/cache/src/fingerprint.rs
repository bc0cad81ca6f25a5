//! Deterministic analysis fingerprints: a stable hash over the semantically
//! relevant inputs of an analysis request, used as the cache key.

use chrono::NaiveDate;
use funnel_core::types::BaselineRates;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// The inputs that decide whether two analysis requests are the same work.
#[derive(Debug, Clone, Serialize)]
pub struct KeyInputs {
    pub property_id: String,
    pub dimensions: Vec<String>,
    pub date_range: (NaiveDate, NaiveDate),
    pub baseline: BaselineRates,
}

/// Derive the cache key: dimension names sorted, baseline rates rounded to
/// `rate_precision` decimals so float noise cannot defeat a hit, fields in a
/// fixed order, SHA-256 over the canonical JSON.
pub fn fingerprint(inputs: &KeyInputs, rate_precision: u32) -> String {
    let mut dimensions = inputs.dimensions.clone();
    dimensions.sort_unstable();

    let canonical = serde_json::json!({
        "baseline": {
            "cart_to_purchase": round_rate(inputs.baseline.cart_to_purchase_rate, rate_precision),
            "overall": round_rate(inputs.baseline.overall_conversion_rate, rate_precision),
            "view_to_cart": round_rate(inputs.baseline.view_to_cart_rate, rate_precision),
        },
        "date_range": [
            inputs.date_range.0.to_string(),
            inputs.date_range.1.to_string(),
        ],
        "dimensions": dimensions,
        "property_id": inputs.property_id,
    });

    sha256_hex(&canonical.to_string())
}

/// Round a rate to `precision` decimal places.
pub fn round_rate(rate: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (rate * factor).round() / factor
}

/// Compute SHA-256 hex digest.
fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use funnel_core::types::StepTotals;

    fn baseline(view_to_cart: f64) -> BaselineRates {
        BaselineRates {
            view_to_cart_rate: view_to_cart,
            cart_to_purchase_rate: 0.087,
            overall_conversion_rate: 0.0132,
            totals: StepTotals::default(),
        }
    }

    fn inputs(dimensions: &[&str], view_to_cart: f64) -> KeyInputs {
        KeyInputs {
            property_id: "476872592".to_string(),
            dimensions: dimensions.iter().map(|d| d.to_string()).collect(),
            date_range: (
                NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            ),
            baseline: baseline(view_to_cart),
        }
    }

    #[test]
    fn test_dimension_order_is_irrelevant() {
        let a = fingerprint(&inputs(&["channel", "device"], 0.152), 4);
        let b = fingerprint(&inputs(&["device", "channel"], 0.152), 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sub_precision_noise_is_absorbed() {
        let a = fingerprint(&inputs(&["channel"], 0.152_000_01), 4);
        let b = fingerprint(&inputs(&["channel"], 0.152_000_09), 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_meaningful_rate_change_alters_key() {
        let a = fingerprint(&inputs(&["channel"], 0.152), 4);
        let b = fingerprint(&inputs(&["channel"], 0.153), 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_date_range_alters_key() {
        let mut other = inputs(&["channel"], 0.152);
        other.date_range.1 = NaiveDate::from_ymd_opt(2025, 7, 31).unwrap();
        let a = fingerprint(&inputs(&["channel"], 0.152), 4);
        let b = fingerprint(&other, 4);
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_is_hex_sha256() {
        let key = fingerprint(&inputs(&["channel"], 0.152), 4);
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_round_rate() {
        assert_eq!(round_rate(0.123_456, 4), 0.1235);
        assert_eq!(round_rate(0.1, 4), 0.1);
    }
}
