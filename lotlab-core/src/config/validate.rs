//! Safety checker — rejects unbounded-risk and contradictory configurations
//! before a run starts.
//!
//! Validation results come back as a structured report with severities, not
//! errors, so a caller can decide whether to proceed on non-critical
//! findings. Anything CRITICAL aborts the run before the first candle.

use serde::{Deserialize, Serialize};

use super::{StrategyConfig, TrailingMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// One finding from the safety checker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub field: String,
    pub message: String,
}

/// Full validation report for a strategy configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// True when the configuration must not run.
    pub fn is_fatal(&self) -> bool {
        self.issues
            .iter()
            .any(|i| i.severity == Severity::Critical)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn push(&mut self, severity: Severity, field: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity,
            field: field.to_string(),
            message: message.into(),
        });
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.issues.is_empty() {
            return write!(f, "no issues");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(
                f,
                "[{:?}] {}: {}",
                issue.severity, issue.field, issue.message
            )?;
        }
        Ok(())
    }
}

/// Hard cap on lot count; beyond this the position is considered
/// uncontrollable regardless of sizing.
pub const MAX_LOTS_CEILING: usize = 15;

/// Validate a strategy configuration. Pure: same config, same report.
pub fn validate(config: &StrategyConfig) -> ValidationReport {
    let mut report = ValidationReport::default();

    // ── Indicator periods ──
    if config.fast_ema_period == 0 || config.slow_ema_period == 0 {
        report.push(
            Severity::Critical,
            "fast_ema_period/slow_ema_period",
            "EMA periods must be >= 1",
        );
    } else if config.fast_ema_period >= config.slow_ema_period {
        report.push(
            Severity::Critical,
            "fast_ema_period",
            format!(
                "fast EMA period ({}) must be shorter than slow ({})",
                config.fast_ema_period, config.slow_ema_period
            ),
        );
    }
    if config.rsi_period == 0 {
        report.push(Severity::Critical, "rsi_period", "RSI period must be >= 1");
    }
    if config.atr_period == 0 {
        report.push(Severity::Critical, "atr_period", "ATR period must be >= 1");
    }

    // ── RSI bands ──
    if config.rsi_entry_min >= config.rsi_entry_max {
        report.push(
            Severity::High,
            "rsi_entry_min",
            "RSI entry band is empty (min >= max); no entry can ever fire",
        );
    }

    // ── Lots & pyramiding ──
    if config.max_lots == 0 {
        report.push(Severity::Critical, "max_lots", "max_lots must be >= 1");
    } else if config.max_lots > MAX_LOTS_CEILING {
        report.push(
            Severity::Critical,
            "max_lots",
            format!(
                "max_lots {} exceeds the ceiling of {}",
                config.max_lots, MAX_LOTS_CEILING
            ),
        );
    }
    if config.pyramiding_enabled && config.max_lots == 1 {
        report.push(
            Severity::Medium,
            "pyramiding_enabled",
            "pyramiding enabled but max_lots = 1; add-ons will never fire",
        );
    }

    // ── Capital & risk ──
    if config.capital <= 0.0 {
        report.push(Severity::Critical, "capital", "capital must be positive");
    }
    if config.position_size <= 0.0 {
        report.push(
            Severity::Critical,
            "position_size",
            "position_size must be positive",
        );
    }
    if !(config.max_loss_pct > 0.0 && config.max_loss_pct <= 1.0) {
        report.push(
            Severity::Critical,
            "max_loss_pct",
            "max_loss_pct must be in (0, 1]; unset or zero means unlimited risk",
        );
    }
    if config.capital > 0.0
        && config.position_size > 0.0
        && config.position_size * config.max_lots as f64 > config.capital
    {
        report.push(
            Severity::High,
            "position_size",
            "full pyramid notional exceeds capital",
        );
    }

    // ── Trailing stop ──
    if config.trailing.enabled {
        match config.trailing.mode {
            TrailingMode::Atr { multiplier } => {
                if multiplier <= 0.0 {
                    report.push(
                        Severity::Critical,
                        "trailing.mode.multiplier",
                        "ATR trailing multiplier must be positive",
                    );
                }
            }
            TrailingMode::Percent { pct } => {
                if !(pct > 0.0 && pct < 1.0) {
                    report.push(
                        Severity::Critical,
                        "trailing.mode.pct",
                        "percent trailing distance must be in (0, 1)",
                    );
                }
            }
        }
        if config.trailing.activation_profit < 0.0 {
            report.push(
                Severity::High,
                "trailing.activation_profit",
                "activation profit must not be negative",
            );
        }
        if let Some(d) = config.trailing.max_trail_distance {
            if d <= 0.0 {
                report.push(
                    Severity::High,
                    "trailing.max_trail_distance",
                    "max trail distance must be positive when set",
                );
            }
        }
    }

    // ── Exit cutoffs ──
    for (field, value) in [
        ("mis_exit_time", &config.mis_exit_time),
        ("cnc_exit_time", &config.cnc_exit_time),
    ] {
        if let Some(raw) = value {
            if chrono::NaiveTime::parse_from_str(raw, "%H:%M").is_err() {
                report.push(
                    Severity::Medium,
                    field,
                    format!("'{raw}' is not a valid HH:MM time; cutoff will be ignored"),
                );
            }
        }
    }

    report
}
