//! Report records produced by the aggregators and the monetary rounding rule
//! they share.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};

pub const METRICS_FILE: &str = "metrics.json";
pub const TOP_CHAINS_FILE: &str = "top_chains.json";
pub const QUANTITIES_FILE: &str = "most_prescribed_quantities.json";

const MONEY_SCALE: u32 = 2;

/// Rounds to 2 decimals, ties to even, on the exact binary value of `value`.
///
/// `1.015` is stored as `1.01499999...` and becomes `1.01`. Exact halves such as
/// `0.125` go to the even neighbour. Non-finite values and magnitudes outside
/// the `Decimal` range are returned unchanged.
pub fn round_money(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    Decimal::from_f64_retain(value)
        .map(|d| d.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven))
        .and_then(|d| d.to_f64())
        .unwrap_or(value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub npi: String,
    pub ndc: String,
    pub fills: u64,
    pub total_price: f64,
    pub avg_price: f64,
    pub reverted: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainPrice {
    /// `None` when the claim's pharmacy is not in the directory.
    pub name: Option<String>,
    pub avg_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRecommendation {
    pub ndc: String,
    pub chain: Vec<ChainPrice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuantityRanking {
    pub ndc: String,
    pub most_prescribed_quantity: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_money_ties_to_even() {
        assert_eq!(round_money(0.125), 0.12);
        assert_eq!(round_money(0.375), 0.38);
        assert_eq!(round_money(2.5), 2.5);
        assert_eq!(round_money(1.0 / 3.0), 0.33);
        assert_eq!(round_money(-0.125), -0.12);
    }

    #[test]
    fn round_money_uses_the_stored_binary_value() {
        assert_eq!(round_money(1.015), 1.01);
        assert_eq!(round_money(2.675), 2.67);
        assert_eq!(round_money(2.03 / 2.0), 1.01);
        assert_eq!(round_money(0.285), 0.28);
    }

    #[test]
    fn round_money_passes_through_non_finite() {
        assert!(round_money(f64::NAN).is_nan());
        assert_eq!(round_money(f64::INFINITY), f64::INFINITY);
        assert_eq!(round_money(1e300), 1e300);
    }

    #[test]
    fn chain_recommendation_serializes_missing_chain_as_null() {
        let rec = ChainRecommendation {
            ndc: "d1".into(),
            chain: vec![ChainPrice {
                name: None,
                avg_price: 1.5,
            }],
        };
        let json = serde_json::to_string(&rec).expect("serialize");
        assert_eq!(json, r#"{"ndc":"d1","chain":[{"name":null,"avg_price":1.5}]}"#);
    }
}
