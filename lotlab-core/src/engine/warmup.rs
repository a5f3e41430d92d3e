//! Warm-up calculator — how many leading candles to skip before any signal
//! is trusted.
//!
//! Scans the serialized configuration for numeric fields whose key path
//! names both an indicator family and a period-like quantity, takes the
//! maximum and adds a stability buffer. The walk is a recursive visit over
//! a generic JSON value tree, so new indicator parameters are picked up
//! without touching this module.

use serde_json::Value;

use crate::config::StrategyConfig;

/// Extra candles consumed beyond the longest indicator period before
/// signals are trusted.
pub const WARMUP_BUFFER: usize = 10;

/// Indicator family tokens. A key path must contain one of these...
const FAMILY_TOKENS: &[&str] = &["ema", "sma", "macd", "rsi", "atr", "supertrend", "adx"];

/// ...and one of these period-ish tokens to count as a warm-up input.
const PERIOD_TOKENS: &[&str] = &["period", "fast", "slow", "lookback", "window", "length"];

/// Warm-up length for a strategy configuration. Pure: identical configs
/// yield identical output regardless of call order.
pub fn warmup_candles(config: &StrategyConfig) -> usize {
    let tree = serde_json::to_value(config).unwrap_or(Value::Null);
    warmup_from_value(&tree)
}

/// Warm-up length for an arbitrary configuration value tree.
pub fn warmup_from_value(tree: &Value) -> usize {
    let mut periods: Vec<usize> = Vec::new();
    collect(tree, "", &mut periods);
    periods.into_iter().max().unwrap_or(0) + WARMUP_BUFFER
}

fn collect(value: &Value, path: &str, out: &mut Vec<usize>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{path}.{key}")
                };
                collect(child, &child_path, out);
            }
        }
        Value::Array(items) => {
            for child in items {
                collect(child, path, out);
            }
        }
        Value::Number(n) => {
            if is_period_path(path) {
                if let Some(v) = n.as_f64() {
                    if v.is_finite() && v >= 1.0 {
                        out.push(v as usize);
                    }
                }
            }
        }
        _ => {}
    }
}

fn is_period_path(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    FAMILY_TOKENS.iter().any(|t| lower.contains(t))
        && PERIOD_TOKENS.iter().any(|t| lower.contains(t))
}
