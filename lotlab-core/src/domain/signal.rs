//! Signals — transient instructions produced per candle, consumed by the
//! ledger in the same candle, never persisted.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::lot::Direction;

/// What a signal asks the ledger to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// Open the first lot of a new position.
    Entry,
    /// Add a lot to an existing same-direction position.
    Pyramid,
    /// Close the entire position.
    Exit,
}

/// Why a position was exited. Fixed taxonomy; serialized for trade records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitReason {
    AtrDecline,
    RsiExit,
    TrailingStop,
    TimeExit,
    EmaFlip,
    OppositeSignal,
    EndOfData,
}

/// A typed signal for one candle.
///
/// `exit_reason` is set only for `Exit` signals. `trigger` is a short static
/// label for logs and diagnostics ("ema_crossover", "atr_expansion", ...).
#[derive(Debug, Clone)]
pub struct Signal {
    pub kind: SignalKind,
    pub direction: Direction,
    pub price: f64,
    pub timestamp: NaiveDateTime,
    pub exit_reason: Option<ExitReason>,
    pub trigger: &'static str,
}

impl Signal {
    pub fn entry(
        direction: Direction,
        price: f64,
        timestamp: NaiveDateTime,
        trigger: &'static str,
    ) -> Self {
        Self {
            kind: SignalKind::Entry,
            direction,
            price,
            timestamp,
            exit_reason: None,
            trigger,
        }
    }

    pub fn pyramid(
        direction: Direction,
        price: f64,
        timestamp: NaiveDateTime,
        trigger: &'static str,
    ) -> Self {
        Self {
            kind: SignalKind::Pyramid,
            direction,
            price,
            timestamp,
            exit_reason: None,
            trigger,
        }
    }

    pub fn exit(
        direction: Direction,
        price: f64,
        timestamp: NaiveDateTime,
        reason: ExitReason,
        trigger: &'static str,
    ) -> Self {
        Self {
            kind: SignalKind::Exit,
            direction,
            price,
            timestamp,
            exit_reason: Some(reason),
            trigger,
        }
    }

    pub fn is_exit(&self) -> bool {
        self.kind == SignalKind::Exit
    }
}
