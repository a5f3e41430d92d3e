//! Position & lot ledger — the core state machine.
//!
//! Owns all open lots for one symbol, applies pyramiding limits, and
//! resolves exits against lots using FIFO or LIFO matching. Illegal signals
//! are rejected with typed errors and never corrupt ledger state.

use thiserror::Error;
use tracing::debug;

use crate::config::ExitMode;
use crate::domain::{
    ClosedTrade, Direction, ExitReason, Lot, LotId, Position, Signal, SignalKind, Symbol,
};

/// Per-signal rejections. Recoverable: the signal is dropped and logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("position conflict on {symbol}: {message}")]
    PositionConflict { symbol: Symbol, message: String },

    #[error("lot limit exceeded on {symbol}: {max_lots} lots already open")]
    LotLimitExceeded { symbol: Symbol, max_lots: usize },
}

/// The ordered collection of open lots for one symbol.
///
/// Invariants held at every point between calls:
/// - `lots.len() <= max_lots`
/// - all lots share one direction
#[derive(Debug, Clone)]
pub struct LotLedger {
    symbol: Symbol,
    max_lots: usize,
    exit_mode: ExitMode,
    /// Quantity assigned to each new lot.
    position_size: f64,
    lots: Vec<Lot>,
    next_lot_id: u64,
}

impl LotLedger {
    pub fn new(
        symbol: impl Into<Symbol>,
        max_lots: usize,
        exit_mode: ExitMode,
        position_size: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            max_lots,
            exit_mode,
            position_size,
            lots: Vec::new(),
            next_lot_id: 1,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn is_open(&self) -> bool {
        !self.lots.is_empty()
    }

    pub fn lot_count(&self) -> usize {
        self.lots.len()
    }

    pub fn lots(&self) -> &[Lot] {
        &self.lots
    }

    pub fn direction(&self) -> Option<Direction> {
        self.lots.first().map(|l| l.direction)
    }

    /// Snapshot of the open position (entry order preserved).
    pub fn position(&self) -> Position {
        Position {
            symbol: self.symbol.clone(),
            lots: self.lots.clone(),
        }
    }

    /// Replace a lot in place (trailing-state write-back). Unknown ids are
    /// ignored: the lot was closed between snapshot and write-back.
    pub fn put_lot(&mut self, updated: Lot) {
        if let Some(slot) = self.lots.iter_mut().find(|l| l.id == updated.id) {
            *slot = updated;
        } else {
            debug!(lot_id = updated.id.0, "put_lot: lot no longer open");
        }
    }

    /// Unrealized P&L of all open lots marked at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.lots.iter().map(|l| l.unrealized_pnl(price)).sum()
    }

    /// Apply a batch of signals in order. Rejected signals are collected,
    /// not propagated; ledger state is unchanged by a rejection.
    pub fn apply(
        &mut self,
        signals: &[Signal],
        candle_index: usize,
    ) -> (Vec<ClosedTrade>, Vec<LedgerError>) {
        let mut trades = Vec::new();
        let mut rejections = Vec::new();
        for signal in signals {
            match self.apply_signal(signal, candle_index) {
                Ok(mut closed) => trades.append(&mut closed),
                Err(err) => {
                    debug!(%err, trigger = signal.trigger, "signal rejected");
                    rejections.push(err);
                }
            }
        }
        (trades, rejections)
    }

    /// Apply one signal. An exit closes the entire position — one
    /// ClosedTrade per lot, all at the signal price, in FIFO or LIFO order,
    /// each lot keeping its own entry price.
    pub fn apply_signal(
        &mut self,
        signal: &Signal,
        candle_index: usize,
    ) -> Result<Vec<ClosedTrade>, LedgerError> {
        match signal.kind {
            SignalKind::Entry => {
                if self.is_open() {
                    let message = if self.direction() == Some(signal.direction.opposite()) {
                        "entry against an open opposite-direction position"
                    } else {
                        "entry while a position is already open"
                    };
                    return Err(LedgerError::PositionConflict {
                        symbol: self.symbol.clone(),
                        message: message.to_string(),
                    });
                }
                self.open_lot(signal, candle_index);
                Ok(Vec::new())
            }
            SignalKind::Pyramid => {
                if !self.is_open() {
                    return Err(LedgerError::PositionConflict {
                        symbol: self.symbol.clone(),
                        message: "pyramid with no open position".to_string(),
                    });
                }
                if self.direction() != Some(signal.direction) {
                    return Err(LedgerError::PositionConflict {
                        symbol: self.symbol.clone(),
                        message: "pyramid against the open direction".to_string(),
                    });
                }
                if self.lot_count() >= self.max_lots {
                    return Err(LedgerError::LotLimitExceeded {
                        symbol: self.symbol.clone(),
                        max_lots: self.max_lots,
                    });
                }
                self.open_lot(signal, candle_index);
                Ok(Vec::new())
            }
            SignalKind::Exit => {
                if !self.is_open() {
                    debug!(symbol = %self.symbol, "exit with no open position; ignored");
                    return Ok(Vec::new());
                }
                Ok(self.close_all(signal))
            }
        }
    }

    fn open_lot(&mut self, signal: &Signal, candle_index: usize) {
        let lot = Lot::open(
            LotId(self.next_lot_id),
            signal.direction,
            signal.price,
            signal.timestamp,
            candle_index,
            self.position_size,
        );
        self.next_lot_id += 1;
        self.lots.push(lot);
    }

    fn close_all(&mut self, signal: &Signal) -> Vec<ClosedTrade> {
        let reason = signal.exit_reason.unwrap_or(ExitReason::OppositeSignal);
        let mut lots = std::mem::take(&mut self.lots);
        if self.exit_mode == ExitMode::Lifo {
            lots.reverse();
        }
        lots.iter()
            .map(|lot| {
                ClosedTrade::from_lot(&self.symbol, lot, signal.price, signal.timestamp, reason)
            })
            .collect()
    }
}
