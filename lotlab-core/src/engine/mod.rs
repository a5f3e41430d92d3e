//! Engine — warm-up gating, the lot ledger, and the per-symbol loop.

pub mod ledger;
pub mod orchestrator;
pub mod state;
pub mod warmup;

pub use ledger::{LedgerError, LotLedger};
pub use orchestrator::run_symbol;
pub use state::{CancelToken, EquityPoint, SymbolRun};
pub use warmup::{warmup_candles, WARMUP_BUFFER};
