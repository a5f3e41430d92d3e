//! Strategy configuration — a flat, validated value object.
//!
//! Never mutated after validation. Field names matter: the warm-up
//! calculator discovers indicator periods by walking the serialized form
//! and matching key names, so period-bearing fields keep the
//! `<family>_..._<period|lookback|fast|slow>` convention.

pub mod validate;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::domain::ConfigHash;

pub use validate::{validate, Severity, ValidationIssue, ValidationReport};

/// Order in which an exit resolves against open lots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitMode {
    Fifo,
    Lifo,
}

/// How the trailing stop tracks the favorable extreme.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TrailingMode {
    /// Stop trails at `extreme - ATR * multiplier` (mirrored for shorts).
    Atr { multiplier: f64 },
    /// Stop trails at `extreme * (1 - pct)` (mirrored for shorts).
    Percent { pct: f64 },
}

/// Trailing-stop sub-configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailingConfig {
    pub enabled: bool,
    pub mode: TrailingMode,
    /// Unrealized profit (fraction of entry) required before the stop arms.
    pub activation_profit: f64,
    /// Optional cap on how far the stop may lag the extreme, in price units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_trail_distance: Option<f64>,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: TrailingMode::Atr { multiplier: 2.0 },
            activation_profit: 0.01,
            max_trail_distance: None,
        }
    }
}

/// Complete configuration for one strategy on one symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Strategy variant key, resolved by the strategy factory
    /// ("ema_gap_atr", "advanced_atr", "price_action").
    pub strategy: String,

    // ── EMA ──
    pub fast_ema_period: usize,
    pub slow_ema_period: usize,

    // ── RSI ──
    pub rsi_period: usize,
    /// Entry gate: RSI must sit inside [min, max] for a new entry.
    pub rsi_entry_min: f64,
    pub rsi_entry_max: f64,
    /// Exit band: long positions close when RSI crosses up through this level.
    pub rsi_exit_long: f64,
    /// Exit band: short positions close when RSI crosses down through this level.
    pub rsi_exit_short: f64,

    // ── ATR ──
    pub atr_period: usize,
    /// Expansion gate: current ATR must be >= reference ATR * ratio.
    /// None disables the gate (EMA-Gap-ATR treats it as optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atr_expansion_ratio: Option<f64>,
    /// Candles back to the reference ATR used by the expansion gate.
    pub atr_reference_lookback: usize,
    /// Exit when ATR falls below peak-since-entry * (1 - threshold).
    pub atr_decline_threshold: f64,

    // ── MACD (price-action variant) ──
    pub macd_fast_period: usize,
    pub macd_slow_period: usize,
    pub macd_signal_period: usize,

    // ── Supertrend (price-action variant) ──
    pub supertrend_period: usize,
    pub supertrend_multiplier: f64,

    // ── Position sizing & pyramiding ──
    pub max_lots: usize,
    pub pyramiding_enabled: bool,
    pub exit_mode: ExitMode,
    /// Quantity per lot.
    pub position_size: f64,
    pub capital: f64,
    /// Fraction of capital the run may put at risk; (0, 1].
    pub max_loss_pct: f64,

    // ── Trailing stop ──
    pub trailing: TrailingConfig,

    // ── Intraday exit cutoffs, "HH:MM" ──
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mis_exit_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnc_exit_time: Option<String>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            strategy: "ema_gap_atr".into(),
            fast_ema_period: 9,
            slow_ema_period: 21,
            rsi_period: 14,
            rsi_entry_min: 40.0,
            rsi_entry_max: 70.0,
            rsi_exit_long: 80.0,
            rsi_exit_short: 20.0,
            atr_period: 14,
            atr_expansion_ratio: None,
            atr_reference_lookback: 10,
            atr_decline_threshold: 0.3,
            macd_fast_period: 12,
            macd_slow_period: 26,
            macd_signal_period: 9,
            supertrend_period: 10,
            supertrend_multiplier: 3.0,
            max_lots: 3,
            pyramiding_enabled: false,
            exit_mode: ExitMode::Fifo,
            position_size: 1.0,
            capital: 100_000.0,
            max_loss_pct: 0.05,
            trailing: TrailingConfig::default(),
            mis_exit_time: None,
            cnc_exit_time: None,
        }
    }
}

impl StrategyConfig {
    /// Content hash over the canonical JSON form. Struct field order is
    /// fixed, so the serialization is deterministic.
    pub fn config_hash(&self) -> ConfigHash {
        let json = serde_json::to_string(self).unwrap_or_default();
        ConfigHash::from_bytes(json.as_bytes())
    }

    /// Intraday square-off cutoff: the earlier of the MIS/CNC exit times.
    /// Malformed strings are ignored here; validation reports them.
    pub fn exit_cutoff(&self) -> Option<NaiveTime> {
        let parse = |s: &Option<String>| {
            s.as_deref()
                .and_then(|v| NaiveTime::parse_from_str(v, "%H:%M").ok())
        };
        match (parse(&self.mis_exit_time), parse(&self.cnc_exit_time)) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_hash_stable_for_equal_configs() {
        let a = StrategyConfig::default();
        let b = StrategyConfig::default();
        assert_eq!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn config_hash_changes_with_params() {
        let a = StrategyConfig::default();
        let b = StrategyConfig {
            fast_ema_period: 5,
            ..StrategyConfig::default()
        };
        assert_ne!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn exit_cutoff_takes_earlier_time() {
        let cfg = StrategyConfig {
            mis_exit_time: Some("15:10".into()),
            cnc_exit_time: Some("15:25".into()),
            ..StrategyConfig::default()
        };
        assert_eq!(
            cfg.exit_cutoff(),
            Some(NaiveTime::from_hms_opt(15, 10, 0).unwrap())
        );
    }

    #[test]
    fn exit_cutoff_ignores_malformed() {
        let cfg = StrategyConfig {
            mis_exit_time: Some("quarter past three".into()),
            ..StrategyConfig::default()
        };
        assert_eq!(cfg.exit_cutoff(), None);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = StrategyConfig {
            pyramiding_enabled: true,
            exit_mode: ExitMode::Lifo,
            atr_expansion_ratio: Some(1.1),
            ..StrategyConfig::default()
        };
        let text = toml::to_string(&cfg).unwrap();
        let back: StrategyConfig = toml::from_str(&text).unwrap();
        assert_eq!(cfg, back);
    }
}
