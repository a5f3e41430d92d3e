//! Candle — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// OHLCV candle for a single symbol on a single timeframe.
///
/// Immutable once emitted by the feed. The feed contract requires strictly
/// increasing timestamps per symbol; the engine drops violations defensively.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high/low bracket open and close.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }
}

/// Candle timeframe.
///
/// `periods_per_year` drives Sharpe annualization: 252 trading days, and for
/// intraday frames a 375-minute session (NSE cash hours).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    OneMinute,
    #[serde(rename = "5m")]
    FiveMinute,
    #[serde(rename = "15m")]
    FifteenMinute,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "1d")]
    OneDay,
}

impl Timeframe {
    /// Candle length in minutes (a day counts as one 375-minute session).
    pub fn minutes(&self) -> u32 {
        match self {
            Timeframe::OneMinute => 1,
            Timeframe::FiveMinute => 5,
            Timeframe::FifteenMinute => 15,
            Timeframe::OneHour => 60,
            Timeframe::OneDay => 375,
        }
    }

    /// Number of candles in a trading year, used to annualize return series.
    pub fn periods_per_year(&self) -> f64 {
        const TRADING_DAYS: f64 = 252.0;
        const SESSION_MINUTES: f64 = 375.0;
        match self {
            Timeframe::OneDay => TRADING_DAYS,
            tf => TRADING_DAYS * (SESSION_MINUTES / tf.minutes() as f64),
        }
    }
}
