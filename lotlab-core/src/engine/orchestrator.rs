//! Backtest orchestrator — the per-symbol candle loop.
//!
//! Strictly sequential: candle i+1 is never evaluated before candle i's
//! signals are applied, because indicator snapshots, trailing-stop state,
//! and the ledger are causally chained. Per-candle failures are logged and
//! skipped; only a structurally invalid config (checked by the caller via
//! the validation report) prevents a run.

use tracing::{debug, warn};

use crate::config::StrategyConfig;
use crate::domain::{Candle, ExitReason, Signal, Timeframe};
use crate::execution::OrderExecutor;
use crate::feed::sanitize_candles;
use crate::indicators::IndicatorRegistry;
use crate::strategy::{PositionContext, StrategyEvaluator};
use crate::trailing;

use super::ledger::LotLedger;
use super::state::{CancelToken, EquityPoint, SymbolRun};
use super::warmup::warmup_candles;

/// Run one symbol's backtest over a candle history.
///
/// The candles are sanitized defensively (duplicates, backward timestamps,
/// insane OHLC are dropped) before the loop. Cancellation is checked at the
/// top of each iteration; a cancelled run returns the partial result with
/// `cancelled = true` and the position left unclosed.
pub fn run_symbol(
    symbol: &str,
    timeframe: Timeframe,
    candles: Vec<Candle>,
    config: &StrategyConfig,
    strategy: &dyn StrategyEvaluator,
    executor: &dyn OrderExecutor,
    cancel: &CancelToken,
) -> SymbolRun {
    let (candles, skipped) = sanitize_candles(candles);

    let registry = IndicatorRegistry::from_indicators(strategy.required_indicators(config));
    let series = registry.precompute(&candles);
    let warmup = warmup_candles(config);
    let atr_name = format!("atr_{}", config.atr_period);

    let mut ledger = LotLedger::new(
        symbol,
        config.max_lots,
        config.exit_mode,
        config.position_size,
    );
    let mut trades = Vec::new();
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(candles.len());
    let mut realized = 0.0_f64;
    let mut rejected = 0usize;
    let mut cancelled = false;

    for (i, candle) in candles.iter().enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }

        if i < warmup {
            equity_curve.push(EquityPoint {
                timestamp: candle.timestamp,
                equity: config.capital,
            });
            continue;
        }

        let snapshot = series.snapshot(i);
        let ctx = PositionContext {
            direction: ledger.direction(),
            open_lots: ledger.lot_count(),
            max_lots: config.max_lots,
            entry_index: ledger.lots().iter().map(|l| l.entry_index).min(),
            avg_entry_price: if ledger.is_open() {
                Some(ledger.position().avg_entry_price())
            } else {
                None
            },
        };

        let evaluation = strategy.evaluate(config, &candles, i, &snapshot, &ctx);
        if !evaluation.diagnostics.notes.is_empty() {
            debug!(
                candle = i,
                notes = ?evaluation.diagnostics.notes,
                "evaluator notes"
            );
        }

        // Trailing stops run for every open lot, independent of the signal
        // generator. A trailing exit takes priority over anything the
        // generator produced this candle.
        let mut trailing_exit: Option<Signal> = None;
        if ledger.is_open() {
            let atr_now = snapshot.current(&atr_name);
            for lot in ledger.lots().to_vec() {
                let (updated, exit) =
                    trailing::update_lot(&lot, candle, atr_now, &config.trailing);
                ledger.put_lot(updated);
                if trailing_exit.is_none() {
                    trailing_exit = exit;
                }
            }
        }

        let signals: Vec<Signal> = match trailing_exit {
            Some(exit) => vec![exit],
            None => evaluation.signals,
        };

        for signal in &signals {
            let fill = match executor.place_order(
                signal.direction,
                config.position_size,
                signal.price,
            ) {
                Ok(fill) => fill,
                Err(err) => {
                    warn!(%err, trigger = signal.trigger, "order not filled; signal dropped");
                    rejected += 1;
                    continue;
                }
            };
            let mut filled = signal.clone();
            filled.price = fill.price;
            match ledger.apply_signal(&filled, i) {
                Ok(closed) => {
                    realized += closed.iter().map(|t| t.pnl).sum::<f64>();
                    trades.extend(closed);
                }
                Err(err) => {
                    warn!(%err, "ledger rejected signal");
                    rejected += 1;
                }
            }
        }

        equity_curve.push(EquityPoint {
            timestamp: candle.timestamp,
            equity: config.capital + realized + ledger.unrealized_pnl(candle.close),
        });
    }

    // Force-close whatever is still open at the end of the feed.
    if !cancelled && ledger.is_open() {
        if let (Some(last), Some(direction)) = (candles.last(), ledger.direction()) {
            let exit = Signal::exit(
                direction,
                last.close,
                last.timestamp,
                ExitReason::EndOfData,
                "end_of_data",
            );
            match ledger.apply_signal(&exit, candles.len().saturating_sub(1)) {
                Ok(closed) => {
                    realized += closed.iter().map(|t| t.pnl).sum::<f64>();
                    trades.extend(closed);
                    if let Some(point) = equity_curve.last_mut() {
                        point.equity = config.capital + realized;
                    }
                }
                Err(err) => warn!(%err, "end-of-data close rejected"),
            }
        }
    }

    SymbolRun {
        symbol: symbol.to_string(),
        timeframe,
        trades,
        equity_curve,
        cancelled,
        warmup_candles: warmup,
        candles_seen: candles.len(),
        candles_skipped: skipped,
        signals_rejected: rejected,
        config_hash: config.config_hash(),
    }
}
