//! Price-Action strategy — Supertrend flips confirmed by the MACD
//! histogram.
//!
//! Entry: the Supertrend direction flips and the MACD histogram agrees
//! with the new side. Exit: the opposite flip, an RSI extreme, or the time
//! cutoff. Pyramids ride a confirmed trend on ATR expansion like the EMA
//! family.

use crate::config::StrategyConfig;
use crate::domain::{Candle, Direction, ExitReason, Signal};
use crate::indicators::{
    Atr, Indicator, IndicatorSnapshot, Macd, MacdOutput, Rsi, Supertrend, SupertrendOutput,
};

use super::{
    atr_expanded, past_exit_cutoff, Diagnostics, Evaluation, PositionContext, StrategyEvaluator,
};

pub struct PriceAction;

impl PriceAction {
    fn dir_name(config: &StrategyConfig) -> String {
        format!(
            "supertrend_dir_{}_{}",
            config.supertrend_period, config.supertrend_multiplier
        )
    }

    fn hist_name(config: &StrategyConfig) -> String {
        format!(
            "macd_hist_{}_{}_{}",
            config.macd_fast_period, config.macd_slow_period, config.macd_signal_period
        )
    }
}

impl StrategyEvaluator for PriceAction {
    fn name(&self) -> &'static str {
        "price_action"
    }

    fn required_indicators(&self, config: &StrategyConfig) -> Vec<Box<dyn Indicator>> {
        vec![
            Box::new(Supertrend::new(
                config.supertrend_period,
                config.supertrend_multiplier,
                SupertrendOutput::Band,
            )),
            Box::new(Supertrend::new(
                config.supertrend_period,
                config.supertrend_multiplier,
                SupertrendOutput::Direction,
            )),
            Box::new(Macd::new(
                config.macd_fast_period,
                config.macd_slow_period,
                config.macd_signal_period,
                MacdOutput::Histogram,
            )),
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
        let dir_name = Self::dir_name(config);
        let hist_name = Self::hist_name(config);
        let rsi_name = format!("rsi_{}", config.rsi_period);
        let atr_name = format!("atr_{}", config.atr_period);

        let mut diagnostics = Diagnostics {
            supertrend_dir: snapshot.current(&dir_name),
            macd_hist: snapshot.current(&hist_name),
            rsi: snapshot.current(&rsi_name),
            atr: snapshot.current(&atr_name),
            ..Diagnostics::default()
        };

        let (dir_prev, dir_now) = match (snapshot.previous(&dir_name), diagnostics.supertrend_dir)
        {
            (Some(p), Some(c)) => (p, c),
            _ => {
                diagnostics.notes.push("insufficient_history");
                return Evaluation::empty(diagnostics);
            }
        };
        let flipped_up = dir_prev < 0.0 && dir_now > 0.0;
        let flipped_down = dir_prev > 0.0 && dir_now < 0.0;
        diagnostics.crossed_long = flipped_up;
        diagnostics.crossed_short = flipped_down;

        if let Some(direction) = ctx.direction {
            // 1. Opposite Supertrend flip.
            let against = match direction {
                Direction::Long => flipped_down,
                Direction::Short => flipped_up,
            };
            if against {
                diagnostics.notes.push("supertrend_flip");
                return Evaluation::single(
                    Signal::exit(
                        direction,
                        candle.close,
                        candle.timestamp,
                        ExitReason::OppositeSignal,
                        "supertrend_flip",
                    ),
                    diagnostics,
                );
            }

            // 2. RSI extreme crossing.
            if let (Some(rsi_prev), Some(rsi)) =
                (snapshot.previous(&rsi_name), diagnostics.rsi)
            {
                let stretched = match direction {
                    Direction::Long => {
                        rsi_prev < config.rsi_exit_long && rsi >= config.rsi_exit_long
                    }
                    Direction::Short => {
                        rsi_prev > config.rsi_exit_short && rsi <= config.rsi_exit_short
                    }
                };
                if stretched {
                    diagnostics.notes.push("rsi_exit");
                    return Evaluation::single(
                        Signal::exit(
                            direction,
                            candle.close,
                            candle.timestamp,
                            ExitReason::RsiExit,
                            "rsi_exit",
                        ),
                        diagnostics,
                    );
                }
            }

            // 3. Intraday square-off.
            if past_exit_cutoff(config, candle) {
                diagnostics.notes.push("time_exit");
                return Evaluation::single(
                    Signal::exit(
                        direction,
                        candle.close,
                        candle.timestamp,
                        ExitReason::TimeExit,
                        "time_exit",
                    ),
                    diagnostics,
                );
            }

            // Pyramid: trend confirmed, histogram strengthening, ATR expanding.
            if config.pyramiding_enabled && ctx.open_lots < ctx.max_lots {
                let trend_ok = match direction {
                    Direction::Long => dir_now > 0.0,
                    Direction::Short => dir_now < 0.0,
                };
                let hist_ok = match (snapshot.previous(&hist_name), diagnostics.macd_hist) {
                    (Some(prev), Some(now)) => match direction {
                        Direction::Long => now > 0.0 && now > prev,
                        Direction::Short => now < 0.0 && now < prev,
                    },
                    _ => false,
                };
                let ratio = config.atr_expansion_ratio.unwrap_or(1.0);
                let expanded =
                    atr_expanded(snapshot, &atr_name, ratio, config.atr_reference_lookback)
                        .unwrap_or(false);
                if trend_ok && hist_ok && expanded {
                    diagnostics.notes.push("pyramid");
                    return Evaluation::single(
                        Signal::pyramid(direction, candle.close, candle.timestamp, "trend_add"),
                        diagnostics,
                    );
                }
            }
            return Evaluation::empty(diagnostics);
        }

        // Flat: flip + histogram confirmation.
        let hist = match diagnostics.macd_hist {
            Some(h) => h,
            None => {
                diagnostics.notes.push("insufficient_history");
                return Evaluation::empty(diagnostics);
            }
        };
        if flipped_up && hist > 0.0 {
            return Evaluation::single(
                Signal::entry(
                    Direction::Long,
                    candle.close,
                    candle.timestamp,
                    "supertrend_flip",
                ),
                diagnostics,
            );
        }
        if flipped_down && hist < 0.0 {
            return Evaluation::single(
                Signal::entry(
                    Direction::Short,
                    candle.close,
                    candle.timestamp,
                    "supertrend_flip",
                ),
                diagnostics,
            );
        }
        Evaluation::empty(diagnostics)
    }
}
