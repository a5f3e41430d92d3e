//! Lot — one discrete unit of an open position.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::ids::LotId;

/// Trade direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1.0 for long, -1.0 for short. Multiplies price moves into P&L.
    pub fn sign(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Long => Direction::Short,
            Direction::Short => Direction::Long,
        }
    }
}

/// Trailing-stop lifecycle for one lot.
///
/// `Inactive` until unrealized profit reaches the activation threshold,
/// `Armed` while the stop ratchets with price, `Triggered` once the stop
/// has been crossed and the exit signal emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrailingState {
    Inactive,
    Armed,
    Triggered,
}

/// One unit of position size with its own entry price and trailing state.
///
/// Created by an ENTRY or PYRAMID signal; destroyed when matched to an exit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    pub id: LotId,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_timestamp: NaiveDateTime,
    /// Candle index at entry, used to bound since-entry indicator scans.
    pub entry_index: usize,
    pub quantity: f64,
    pub highest_price_since_entry: f64,
    pub lowest_price_since_entry: f64,
    pub trailing_stop_price: Option<f64>,
    pub trailing: TrailingState,
}

impl Lot {
    pub fn open(
        id: LotId,
        direction: Direction,
        entry_price: f64,
        entry_timestamp: NaiveDateTime,
        entry_index: usize,
        quantity: f64,
    ) -> Self {
        Self {
            id,
            direction,
            entry_price,
            entry_timestamp,
            entry_index,
            quantity,
            highest_price_since_entry: entry_price,
            lowest_price_since_entry: entry_price,
            trailing_stop_price: None,
            trailing: TrailingState::Inactive,
        }
    }

    /// Unrealized P&L of this lot marked at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        self.direction.sign() * (price - self.entry_price) * self.quantity
    }

    /// Unrealized profit as a fraction of the entry price (signed).
    pub fn unrealized_profit_pct(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        self.direction.sign() * (price - self.entry_price) / self.entry_price
    }

    pub fn is_trailing_armed(&self) -> bool {
        self.trailing == TrailingState::Armed
    }
}
