//! Strategy evaluators — entry/exit/pyramid rules behind one trait.
//!
//! Each variant implements [`StrategyEvaluator`] and is selected by a
//! name-keyed factory, never an inheritance chain. Evaluators are stateless:
//! everything they need arrives as the candle window, the indicator
//! snapshot, and an explicit [`PositionContext`].

pub mod advanced_atr;
pub mod ema_gap_atr;
pub mod price_action;

pub use advanced_atr::AdvancedAtr;
pub use ema_gap_atr::EmaGapAtr;
pub use price_action::PriceAction;

use thiserror::Error;

use crate::config::StrategyConfig;
use crate::domain::{Candle, Direction, ExitReason, Signal};
use crate::indicators::{Indicator, IndicatorSnapshot};

/// Open-position context fed to an evaluator by the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct PositionContext {
    pub direction: Option<Direction>,
    pub open_lots: usize,
    pub max_lots: usize,
    /// Candle index of the oldest open lot's entry.
    pub entry_index: Option<usize>,
    pub avg_entry_price: Option<f64>,
}

impl PositionContext {
    pub fn flat(max_lots: usize) -> Self {
        Self {
            max_lots,
            ..Self::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.direction.is_some()
    }
}

/// Per-candle observability: the values the rules actually looked at.
/// Logged at debug level; not a correctness concern.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    pub fast_ema: Option<f64>,
    pub slow_ema: Option<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub supertrend_dir: Option<f64>,
    pub macd_hist: Option<f64>,
    pub crossed_long: bool,
    pub crossed_short: bool,
    pub notes: Vec<&'static str>,
}

/// Result of evaluating one candle.
#[derive(Debug, Default)]
pub struct Evaluation {
    pub signals: Vec<Signal>,
    pub diagnostics: Diagnostics,
}

impl Evaluation {
    pub fn empty(diagnostics: Diagnostics) -> Self {
        Self {
            signals: Vec::new(),
            diagnostics,
        }
    }

    pub fn single(signal: Signal, diagnostics: Diagnostics) -> Self {
        Self {
            signals: vec![signal],
            diagnostics,
        }
    }
}

/// One strategy variant's rule set.
pub trait StrategyEvaluator: Send + Sync {
    /// Factory key ("ema_gap_atr", "advanced_atr", "price_action").
    fn name(&self) -> &'static str;

    /// Indicators this strategy needs precomputed for a given config.
    fn required_indicators(&self, config: &StrategyConfig) -> Vec<Box<dyn Indicator>>;

    /// Evaluate one candle against current indicator state and position
    /// context. At most one exit per candle; triggers are mutually
    /// exclusive and checked in fixed priority order.
    fn evaluate(
        &self,
        config: &StrategyConfig,
        candles: &[Candle],
        index: usize,
        snapshot: &IndicatorSnapshot,
        ctx: &PositionContext,
    ) -> Evaluation;
}

#[derive(Debug, Clone, Error)]
pub enum StrategyError {
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
}

/// Resolve a strategy variant by name.
pub fn create_strategy(name: &str) -> Result<Box<dyn StrategyEvaluator>, StrategyError> {
    match name {
        "ema_gap_atr" => Ok(Box::new(EmaGapAtr)),
        "advanced_atr" => Ok(Box::new(AdvancedAtr)),
        "price_action" => Ok(Box::new(PriceAction)),
        other => Err(StrategyError::UnknownStrategy(other.to_string())),
    }
}

// ─── Shared rule helpers ─────────────────────────────────────────────

/// a crossed above b on this candle.
pub(crate) fn crossed_above(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a <= prev_b && a > b
}

/// a crossed below b on this candle.
pub(crate) fn crossed_below(prev_a: f64, prev_b: f64, a: f64, b: f64) -> bool {
    prev_a >= prev_b && a < b
}

/// True once the candle's time-of-day reaches the configured square-off.
pub(crate) fn past_exit_cutoff(config: &StrategyConfig, candle: &Candle) -> bool {
    config
        .exit_cutoff()
        .map(|cutoff| candle.timestamp.time() >= cutoff)
        .unwrap_or(false)
}

/// ATR expansion gate: current ATR vs the reference ATR `lookback` candles
/// back. None when either value is still warming up.
pub(crate) fn atr_expanded(
    snapshot: &IndicatorSnapshot,
    atr_name: &str,
    ratio: f64,
    lookback: usize,
) -> Option<bool> {
    let atr = snapshot.current(atr_name)?;
    let reference = snapshot.back(atr_name, lookback)?;
    Some(reference > 0.0 && atr >= reference * ratio)
}

/// Exit ladder shared by the EMA strategy family, in fixed priority order:
/// ATR decline → RSI exit band → opposite EMA crossover → time cutoff.
/// The trailing stop runs in the engine, ahead of all of these. First match
/// wins; at most one exit per candle.
pub(crate) fn ema_family_exit(
    config: &StrategyConfig,
    candle: &Candle,
    snapshot: &IndicatorSnapshot,
    ctx: &PositionContext,
    diagnostics: &mut Diagnostics,
) -> Option<Signal> {
    let direction = ctx.direction?;
    let atr_name = format!("atr_{}", config.atr_period);
    let rsi_name = format!("rsi_{}", config.rsi_period);

    // 1. ATR decline relative to the peak since entry.
    if let (Some(entry_index), Some(atr)) = (ctx.entry_index, snapshot.current(&atr_name)) {
        if let Some(peak) = snapshot.max_since(&atr_name, entry_index) {
            if peak > 0.0 && atr < peak * (1.0 - config.atr_decline_threshold) {
                diagnostics.notes.push("atr_decline");
                return Some(Signal::exit(
                    direction,
                    candle.close,
                    candle.timestamp,
                    ExitReason::AtrDecline,
                    "atr_decline",
                ));
            }
        }
    }

    // 2. RSI crossing the exit band.
    if let (Some(rsi_prev), Some(rsi)) =
        (snapshot.previous(&rsi_name), snapshot.current(&rsi_name))
    {
        let crossed = match direction {
            Direction::Long => rsi_prev < config.rsi_exit_long && rsi >= config.rsi_exit_long,
            Direction::Short => rsi_prev > config.rsi_exit_short && rsi <= config.rsi_exit_short,
        };
        if crossed {
            diagnostics.notes.push("rsi_exit");
            return Some(Signal::exit(
                direction,
                candle.close,
                candle.timestamp,
                ExitReason::RsiExit,
                "rsi_exit",
            ));
        }
    }

    // 3. Opposite EMA crossover.
    let flipped = match direction {
        Direction::Long => diagnostics.crossed_short,
        Direction::Short => diagnostics.crossed_long,
    };
    if flipped {
        diagnostics.notes.push("ema_flip");
        return Some(Signal::exit(
            direction,
            candle.close,
            candle.timestamp,
            ExitReason::EmaFlip,
            "ema_flip",
        ));
    }

    // 4. Intraday square-off.
    if past_exit_cutoff(config, candle) {
        diagnostics.notes.push("time_exit");
        return Some(Signal::exit(
            direction,
            candle.close,
            candle.timestamp,
            ExitReason::TimeExit,
            "time_exit",
        ));
    }

    None
}
