//! Domain types for LotLab.

pub mod candle;
pub mod ids;
pub mod lot;
pub mod position;
pub mod signal;
pub mod trade;

pub use candle::{Candle, Timeframe};
pub use ids::{ConfigHash, LotId, RunId};
pub use lot::{Direction, Lot, TrailingState};
pub use position::Position;
pub use signal::{ExitReason, Signal, SignalKind};
pub use trade::ClosedTrade;

/// Symbol type alias
pub type Symbol = String;
