//! Advanced-ATR strategy.
//!
//! A volatility-breakout cousin of EMA-Gap-ATR: no crossover is required,
//! only an EMA trend filter. Entries fire on a mandatory ATR expansion
//! while the trend and the RSI band confirm, which makes this variant
//! re-enter trends that EMA-Gap-ATR would only catch at the cross. Exits
//! reuse the shared ladder.

use crate::config::StrategyConfig;
use crate::domain::{Candle, Direction, Signal};
use crate::indicators::{Atr, Ema, Indicator, IndicatorSnapshot, Rsi};

use super::{
    atr_expanded, crossed_above, crossed_below, ema_family_exit, Diagnostics, Evaluation,
    PositionContext, StrategyEvaluator,
};

/// Expansion ratio applied when the config leaves `atr_expansion_ratio`
/// unset; this variant always gates on expansion.
const DEFAULT_EXPANSION_RATIO: f64 = 1.1;

pub struct AdvancedAtr;

impl StrategyEvaluator for AdvancedAtr {
    fn name(&self) -> &'static str {
        "advanced_atr"
    }

    fn required_indicators(&self, config: &StrategyConfig) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Ema::new(config.fast_ema_period)),
            Box::new(Ema::new(config.slow_ema_period)),
            Box::new(Rsi::new(config.rsi_period)),
            Box::new(Atr::new(config.atr_period)),
        ]
    }

    fn evaluate(
        &self,
        config: &StrategyConfig,
        candles: &[Candle],
        index: usize,
        snapshot: &IndicatorSnapshot,
        ctx: &PositionContext,
    ) -> Evaluation {
        let candle = &candles[index];
        let fast_name = format!("ema_{}", config.fast_ema_period);
        let slow_name = format!("ema_{}", config.slow_ema_period);
        let rsi_name = format!("rsi_{}", config.rsi_period);
        let atr_name = format!("atr_{}", config.atr_period);

        let mut diagnostics = Diagnostics {
            fast_ema: snapshot.current(&fast_name),
            slow_ema: snapshot.current(&slow_name),
            rsi: snapshot.current(&rsi_name),
            atr: snapshot.current(&atr_name),
            ..Diagnostics::default()
        };

        let (fast, slow, fast_prev, slow_prev) = match (
            diagnostics.fast_ema,
            diagnostics.slow_ema,
            snapshot.previous(&fast_name),
            snapshot.previous(&slow_name),
        ) {
            (Some(f), Some(s), Some(fp), Some(sp)) => (f, s, fp, sp),
            _ => {
                diagnostics.notes.push("insufficient_history");
                return Evaluation::empty(diagnostics);
            }
        };
        diagnostics.crossed_long = crossed_above(fast_prev, slow_prev, fast, slow);
        diagnostics.crossed_short = crossed_below(fast_prev, slow_prev, fast, slow);

        let ratio = config.atr_expansion_ratio.unwrap_or(DEFAULT_EXPANSION_RATIO);
        let expanded = atr_expanded(snapshot, &atr_name, ratio, config.atr_reference_lookback)
            .unwrap_or(false);

        if ctx.is_open() {
            if let Some(exit) = ema_family_exit(config, candle, snapshot, ctx, &mut diagnostics) {
                return Evaluation::single(exit, diagnostics);
            }
            if let (true, Some(direction)) = (
                config.pyramiding_enabled && ctx.open_lots < ctx.max_lots && expanded,
                ctx.direction,
            ) {
                let trend_intact = match direction {
                    Direction::Long => fast > slow,
                    Direction::Short => fast < slow,
                };
                if trend_intact {
                    diagnostics.notes.push("pyramid");
                    return Evaluation::single(
                        Signal::pyramid(direction, candle.close, candle.timestamp, "atr_expansion"),
                        diagnostics,
                    );
                }
            }
            return Evaluation::empty(diagnostics);
        }

        // Flat: expansion is mandatory, the EMA relation only filters side.
        if !expanded {
            return Evaluation::empty(diagnostics);
        }
        let rsi_ok = diagnostics
            .rsi
            .map(|r| r >= config.rsi_entry_min && r <= config.rsi_entry_max)
            .unwrap_or(false);
        if !rsi_ok {
            diagnostics.notes.push("rsi_gate_blocked");
            return Evaluation::empty(diagnostics);
        }

        let direction = if fast > slow {
            Direction::Long
        } else if fast < slow {
            Direction::Short
        } else {
            return Evaluation::empty(diagnostics);
        };

        Evaluation::single(
            Signal::entry(direction, candle.close, candle.timestamp, "atr_breakout"),
            diagnostics,
        )
    }
}
