//! ClosedTrade — the realized record produced when a lot is exited.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::lot::{Direction, Lot};
use super::signal::ExitReason;

/// One realized round trip: a lot's entry matched to an exit.
///
/// Immutable once created; appended to the run's trade log. A full position
/// exit produces one record per lot, all at the same exit price/time but
/// each keeping its own entry price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub direction: Direction,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub exit_timestamp: NaiveDateTime,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub exit_reason: ExitReason,
}

impl ClosedTrade {
    /// Close `lot` at `exit_price`/`exit_timestamp`, realizing its P&L.
    pub fn from_lot(
        symbol: &str,
        lot: &Lot,
        exit_price: f64,
        exit_timestamp: NaiveDateTime,
        exit_reason: ExitReason,
    ) -> Self {
        let pnl = lot.direction.sign() * (exit_price - lot.entry_price) * lot.quantity;
        let pnl_pct = if lot.entry_price != 0.0 {
            lot.direction.sign() * (exit_price - lot.entry_price) / lot.entry_price * 100.0
        } else {
            0.0
        };
        Self {
            symbol: symbol.to_string(),
            direction: lot.direction,
            quantity: lot.quantity,
            entry_price: lot.entry_price,
            entry_timestamp: lot.entry_timestamp,
            exit_price,
            exit_timestamp,
            pnl,
            pnl_pct,
            exit_reason,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }
}
