//! Trailing stop engine — a per-lot state machine, independent of the
//! signal generator.
//!
//! States: Inactive → Armed → Triggered. The stop arms once unrealized
//! profit reaches the activation threshold, then ratchets with the
//! favorable extreme: it may tighten but never retreat. Each lot is a pure
//! function of `(lot, candle, atr, config)` — lots can be processed in any
//! order with no cross-lot dependency.

use crate::config::{TrailingConfig, TrailingMode};
use crate::domain::{Candle, Direction, ExitReason, Lot, Signal, TrailingState};

/// Advance one lot's trailing state by one candle.
///
/// Returns the updated lot and, when the stop is crossed, an EXIT signal
/// priced at the stop. A missing or NaN ATR in ATR mode means "trailing not
/// yet available": the lot stays Inactive, or keeps its last stop if
/// already armed.
pub fn update_lot(
    lot: &Lot,
    candle: &Candle,
    atr: Option<f64>,
    cfg: &TrailingConfig,
) -> (Lot, Option<Signal>) {
    let mut updated = lot.clone();
    updated.highest_price_since_entry = updated.highest_price_since_entry.max(candle.high);
    updated.lowest_price_since_entry = updated.lowest_price_since_entry.min(candle.low);

    if !cfg.enabled || updated.trailing == TrailingState::Triggered {
        return (updated, None);
    }

    let atr = atr.filter(|v| !v.is_nan() && *v > 0.0);

    if updated.trailing == TrailingState::Inactive {
        if matches!(cfg.mode, TrailingMode::Atr { .. }) && atr.is_none() {
            return (updated, None);
        }
        if updated.unrealized_profit_pct(candle.close) < cfg.activation_profit {
            return (updated, None);
        }
        updated.trailing = TrailingState::Armed;
    }

    let extreme = match updated.direction {
        Direction::Long => updated.highest_price_since_entry,
        Direction::Short => updated.lowest_price_since_entry,
    };

    let candidate = match cfg.mode {
        TrailingMode::Atr { multiplier } => atr.map(|a| match updated.direction {
            Direction::Long => extreme - a * multiplier,
            Direction::Short => extreme + a * multiplier,
        }),
        TrailingMode::Percent { pct } => Some(match updated.direction {
            Direction::Long => extreme * (1.0 - pct),
            Direction::Short => extreme * (1.0 + pct),
        }),
    };

    // Cap how far the stop may lag the extreme, then ratchet: the stop only
    // moves in the favorable direction.
    if let Some(mut candidate) = candidate {
        if let Some(max_lag) = cfg.max_trail_distance {
            candidate = match updated.direction {
                Direction::Long => candidate.max(extreme - max_lag),
                Direction::Short => candidate.min(extreme + max_lag),
            };
        }
        updated.trailing_stop_price = Some(match (updated.trailing_stop_price, updated.direction)
        {
            (Some(prev), Direction::Long) => prev.max(candidate),
            (Some(prev), Direction::Short) => prev.min(candidate),
            (None, _) => candidate,
        });
    }

    let stop = match updated.trailing_stop_price {
        Some(s) => s,
        None => return (updated, None),
    };

    let crossed = match updated.direction {
        Direction::Long => candle.low <= stop,
        Direction::Short => candle.high >= stop,
    };
    if !crossed {
        return (updated, None);
    }

    updated.trailing = TrailingState::Triggered;
    let signal = Signal::exit(
        updated.direction,
        stop,
        candle.timestamp,
        ExitReason::TrailingStop,
        "trailing_stop",
    );
    (updated, Some(signal))
}
