//! Typed identifiers and content hashes.

use serde::{Deserialize, Serialize};

/// Monotonic per-ledger lot identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct LotId(pub u64);

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Blake3 hash of a canonically-serialized strategy configuration.
///
/// Two runs with identical configs produce identical hashes, which makes
/// results comparable and cacheable across processes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigHash(pub String);

impl ConfigHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }
}

impl std::fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
