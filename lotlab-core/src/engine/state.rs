//! Run state — cancellation token, equity samples, per-symbol result.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{ClosedTrade, ConfigHash, Symbol, Timeframe};

/// Cooperative cancellation flag, checked at the top of the candle loop.
///
/// Cloning shares the flag; any clone can cancel the run.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One sample of the mark-to-market equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// Raw output of one per-symbol backtest run, before metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolRun {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    /// True when a cancellation signal stopped the loop mid-feed; the trade
    /// log then contains only trades closed before cancellation.
    pub cancelled: bool,
    pub warmup_candles: usize,
    pub candles_seen: usize,
    /// Candles dropped by hygiene checks (duplicates, backward timestamps,
    /// insane OHLC).
    pub candles_skipped: usize,
    /// Signals rejected by the ledger (conflicts, lot-limit breaches).
    pub signals_rejected: usize,
    pub config_hash: ConfigHash,
}
