//! Serializable run configuration, loaded from TOML.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use lotlab_core::config::StrategyConfig;
use lotlab_core::domain::{RunId, Timeframe};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

fn default_concurrency() -> usize {
    4
}

/// Everything needed to reproduce a portfolio run.
///
/// `strategy` is the base configuration; `overrides` replaces it wholesale
/// for individual symbols (per-symbol risk overrides included).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub symbols: Vec<String>,
    pub timeframe: Timeframe,
    /// Inclusive range, "YYYY-MM-DDTHH:MM:SS" in the TOML file.
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    pub strategy: StrategyConfig,
    #[serde(default)]
    pub overrides: BTreeMap<String, StrategyConfig>,
}

impl RunConfig {
    /// Deterministic content hash; identical configs share a RunId, which
    /// makes results comparable across processes.
    pub fn run_id(&self) -> RunId {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }

    /// Effective strategy config for one symbol.
    pub fn spec_for(&self, symbol: &str) -> &StrategyConfig {
        self.overrides.get(symbol).unwrap_or(&self.strategy)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
symbols = ["RELIANCE", "TCS"]
timeframe = "5m"
start = "2024-01-02T09:15:00"
end = "2024-03-28T15:30:00"
concurrency = 2

[strategy]
strategy = "ema_gap_atr"
fast_ema_period = 9
slow_ema_period = 21
rsi_period = 14
rsi_entry_min = 40.0
rsi_entry_max = 70.0
rsi_exit_long = 80.0
rsi_exit_short = 20.0
atr_period = 14
atr_reference_lookback = 10
atr_decline_threshold = 0.3
macd_fast_period = 12
macd_slow_period = 26
macd_signal_period = 9
supertrend_period = 10
supertrend_multiplier = 3.0
max_lots = 3
pyramiding_enabled = true
exit_mode = "FIFO"
position_size = 10.0
capital = 100000.0
max_loss_pct = 0.05

[strategy.trailing]
enabled = true
activation_profit = 0.01

[strategy.trailing.mode]
type = "atr"
multiplier = 2.0

[overrides.TCS]
strategy = "ema_gap_atr"
fast_ema_period = 5
slow_ema_period = 13
rsi_period = 14
rsi_entry_min = 40.0
rsi_entry_max = 70.0
rsi_exit_long = 80.0
rsi_exit_short = 20.0
atr_period = 14
atr_reference_lookback = 10
atr_decline_threshold = 0.3
macd_fast_period = 12
macd_slow_period = 26
macd_signal_period = 9
supertrend_period = 10
supertrend_multiplier = 3.0
max_lots = 1
pyramiding_enabled = false
exit_mode = "LIFO"
position_size = 5.0
capital = 50000.0
max_loss_pct = 0.02

[overrides.TCS.trailing]
enabled = false
activation_profit = 0.01

[overrides.TCS.trailing.mode]
type = "percent"
pct = 0.05
"#;

    #[test]
    fn sample_toml_parses() {
        let config = RunConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.symbols, vec!["RELIANCE", "TCS"]);
        assert_eq!(config.timeframe, Timeframe::FiveMinute);
        assert_eq!(config.concurrency, 2);
        assert!(config.strategy.pyramiding_enabled);
        assert_eq!(config.spec_for("TCS").max_lots, 1);
        assert_eq!(config.spec_for("RELIANCE").max_lots, 3);
    }

    #[test]
    fn run_id_is_deterministic_and_content_sensitive() {
        let a = RunConfig::from_toml_str(SAMPLE).unwrap();
        let b = RunConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(a.run_id(), b.run_id());

        let mut c = RunConfig::from_toml_str(SAMPLE).unwrap();
        c.strategy.max_lots = 5;
        assert_ne!(a.run_id(), c.run_id());
    }
}
