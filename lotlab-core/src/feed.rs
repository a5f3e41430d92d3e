//! Candle feed boundary — an injected, time-ordered candle source.
//!
//! The engine treats the feed as a synchronous call; an async source can
//! adapt behind the trait. Ordering violations are handled defensively by
//! [`sanitize_candles`], while gaps are internal and never an error.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::warn;

use crate::domain::{Candle, Timeframe};

#[derive(Debug, Clone, Error)]
pub enum FeedError {
    #[error("no candles for {symbol} ({timeframe:?}) in the requested range")]
    NoData { symbol: String, timeframe: Timeframe },

    #[error("feed source failure: {0}")]
    Source(String),
}

/// Historical candle source for one symbol/timeframe between two timestamps.
pub trait CandleFeed: Send + Sync {
    fn historical_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, FeedError>;
}

/// In-memory feed, keyed by symbol. Used by tests and the runner's
/// pre-loaded data path.
#[derive(Debug, Clone, Default)]
pub struct MemoryFeed {
    candles: HashMap<String, Vec<Candle>>,
}

impl MemoryFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, symbol: impl Into<String>, candles: Vec<Candle>) {
        self.candles.insert(symbol.into(), candles);
    }
}

impl CandleFeed for MemoryFeed {
    fn historical_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, FeedError> {
        let candles: Vec<Candle> = self
            .candles
            .get(symbol)
            .map(|series| {
                series
                    .iter()
                    .filter(|c| {
                        c.timeframe == timeframe && c.timestamp >= start && c.timestamp <= end
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if candles.is_empty() {
            return Err(FeedError::NoData {
                symbol: symbol.to_string(),
                timeframe,
            });
        }
        Ok(candles)
    }
}

/// Drop candles that violate the feed contract: duplicate or backward
/// timestamps, and insane OHLC rows. Returns the cleaned series and the
/// number of dropped candles. Gaps are preserved.
pub fn sanitize_candles(candles: Vec<Candle>) -> (Vec<Candle>, usize) {
    let input_len = candles.len();
    let mut cleaned: Vec<Candle> = Vec::with_capacity(input_len);
    for candle in candles {
        if !candle.is_sane() {
            warn!(
                symbol = %candle.symbol,
                timestamp = %candle.timestamp,
                "dropping insane candle"
            );
            continue;
        }
        if let Some(last) = cleaned.last() {
            if candle.timestamp <= last.timestamp {
                warn!(
                    symbol = %candle.symbol,
                    timestamp = %candle.timestamp,
                    "dropping out-of-order candle"
                );
                continue;
            }
        }
        cleaned.push(candle);
    }
    let dropped = input_len - cleaned.len();
    (cleaned, dropped)
}
