//! Position — the ordered set of open lots for one symbol.

use serde::{Deserialize, Serialize};

use super::lot::{Direction, Lot};
use super::Symbol;

/// All open lots for a symbol at one point in time.
///
/// Invariants (enforced by the lot ledger, not here):
/// - every lot shares one direction
/// - lot count never exceeds the configured maximum
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Position {
    pub symbol: Symbol,
    pub lots: Vec<Lot>,
}

impl Position {
    pub fn is_open(&self) -> bool {
        !self.lots.is_empty()
    }

    pub fn lot_count(&self) -> usize {
        self.lots.len()
    }

    /// Direction shared by all lots, or None when flat.
    pub fn direction(&self) -> Option<Direction> {
        self.lots.first().map(|l| l.direction)
    }

    /// Candle index of the oldest lot's entry.
    pub fn entry_index(&self) -> Option<usize> {
        self.lots.iter().map(|l| l.entry_index).min()
    }

    pub fn total_quantity(&self) -> f64 {
        self.lots.iter().map(|l| l.quantity).sum()
    }

    /// Quantity-weighted average entry price, 0.0 when flat.
    pub fn avg_entry_price(&self) -> f64 {
        let qty = self.total_quantity();
        if qty == 0.0 {
            return 0.0;
        }
        self.lots
            .iter()
            .map(|l| l.entry_price * l.quantity)
            .sum::<f64>()
            / qty
    }

    /// Unrealized P&L of the whole position marked at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.lots.iter().map(|l| l.unrealized_pnl(price)).sum()
    }
}
