//! Indicator engine — precomputed series behind an explicit registry.
//!
//! Indicators are pure functions: candle history in, numeric series out.
//! They are precomputed once before the candle loop and indexed per candle
//! through an [`IndicatorSnapshot`], which exposes the current and previous
//! values needed for crossover detection. No recomputation inside the loop.
//!
//! Multi-series indicators (MACD, Supertrend) are exposed as separate named
//! instances per output, keeping the single-series [`Indicator`] trait
//! unchanged.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod rsi;
pub mod supertrend;

pub use atr::Atr;
pub use ema::Ema;
pub use macd::{Macd, MacdOutput};
pub use rsi::Rsi;
pub use supertrend::{Supertrend, SupertrendOutput};

use std::collections::HashMap;

use crate::domain::Candle;

/// Trait for indicators.
///
/// Indicators take a full candle series and produce an output series of the
/// same length. The first `lookback()` values should be `f64::NAN` (warm-up).
///
/// No indicator value at candle t may depend on data from candle t+1 or
/// later.
pub trait Indicator: Send + Sync {
    /// Stable series key (e.g., "ema_9", "atr_14").
    fn name(&self) -> &str;

    /// Number of candles needed before the indicator produces valid output.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire candle series.
    fn compute(&self, candles: &[Candle]) -> Vec<f64>;
}

/// Container for precomputed indicator series, keyed by indicator name.
#[derive(Debug, Clone, Default)]
pub struct IndicatorSeries {
    series: HashMap<String, Vec<f64>>,
}

impl IndicatorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, values: Vec<f64>) {
        self.series.insert(name.into(), values);
    }

    /// Raw value at a candle index (may be NaN inside the warm-up prefix).
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series.get(name).and_then(|v| v.get(index).copied())
    }

    pub fn get_series(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Per-candle view for the evaluation loop.
    pub fn snapshot(&self, index: usize) -> IndicatorSnapshot<'_> {
        IndicatorSnapshot {
            series: self,
            index,
        }
    }
}

/// Read-only view of all indicator series at one candle index.
///
/// NaN values (warm-up, tainted data) are reported as `None`, so strategy
/// code can gate on plain `Option` combinators.
#[derive(Debug, Clone, Copy)]
pub struct IndicatorSnapshot<'a> {
    series: &'a IndicatorSeries,
    index: usize,
}

impl<'a> IndicatorSnapshot<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    fn finite(v: Option<f64>) -> Option<f64> {
        v.filter(|x| !x.is_nan())
    }

    /// Indicator value at the current candle.
    pub fn current(&self, name: &str) -> Option<f64> {
        Self::finite(self.series.get(name, self.index))
    }

    /// Indicator value at the previous candle (None at index 0).
    pub fn previous(&self, name: &str) -> Option<f64> {
        if self.index == 0 {
            return None;
        }
        Self::finite(self.series.get(name, self.index - 1))
    }

    /// Indicator value `k` candles back (k = 0 is the current candle).
    pub fn back(&self, name: &str, k: usize) -> Option<f64> {
        if k > self.index {
            return None;
        }
        Self::finite(self.series.get(name, self.index - k))
    }

    /// Maximum non-NaN value over `[start..=current]`. None if nothing valid.
    pub fn max_since(&self, name: &str, start: usize) -> Option<f64> {
        let series = self.series.get_series(name)?;
        if series.is_empty() {
            return None;
        }
        let end = self.index.min(series.len() - 1);
        series[start.min(end)..=end]
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc: Option<f64>, v| {
                Some(acc.map_or(v, |a| a.max(v)))
            })
    }
}

/// Explicit registry of the indicators one run needs.
///
/// Constructed at startup from the active strategy's requirements and passed
/// by reference — never a module-level singleton, so tests can build
/// isolated registries.
#[derive(Default)]
pub struct IndicatorRegistry {
    indicators: Vec<Box<dyn Indicator>>,
}

impl IndicatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an indicator; duplicate names are ignored.
    pub fn register(&mut self, indicator: Box<dyn Indicator>) {
        if self
            .indicators
            .iter()
            .any(|i| i.name() == indicator.name())
        {
            return;
        }
        self.indicators.push(indicator);
    }

    pub fn from_indicators(indicators: Vec<Box<dyn Indicator>>) -> Self {
        let mut registry = Self::new();
        for ind in indicators {
            registry.register(ind);
        }
        registry
    }

    pub fn len(&self) -> usize {
        self.indicators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indicators.is_empty()
    }

    /// Largest lookback across registered indicators.
    pub fn max_lookback(&self) -> usize {
        self.indicators
            .iter()
            .map(|i| i.lookback())
            .max()
            .unwrap_or(0)
    }

    /// Compute every registered series over the candle history.
    pub fn precompute(&self, candles: &[Candle]) -> IndicatorSeries {
        let mut out = IndicatorSeries::new();
        for indicator in &self.indicators {
            out.insert(indicator.name().to_string(), indicator.compute(candles));
        }
        out
    }
}

/// Create synthetic candles from close prices for testing.
///
/// Generates plausible OHLV: open = prev close (or close for the first
/// candle), high = max(open, close) + 1.0, low = min(open, close) - 1.0.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<Candle> {
    use crate::domain::Timeframe;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Candle {
                symbol: "TEST".to_string(),
                timeframe: Timeframe::FiveMinute,
                timestamp: base + chrono::Duration::minutes(5 * i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_insert_and_get() {
        let mut s = IndicatorSeries::new();
        s.insert("ema_9", vec![f64::NAN, 100.0, 101.0]);
        assert!(s.get("ema_9", 0).unwrap().is_nan());
        assert_eq!(s.get("ema_9", 2), Some(101.0));
        assert_eq!(s.get("ema_9", 3), None); // out of bounds
        assert_eq!(s.get("missing", 0), None);
    }

    #[test]
    fn snapshot_filters_nan() {
        let mut s = IndicatorSeries::new();
        s.insert("atr_14", vec![f64::NAN, 2.0, 2.5]);
        let snap = s.snapshot(1);
        assert_eq!(snap.current("atr_14"), Some(2.0));
        assert_eq!(snap.previous("atr_14"), None); // NaN filtered
        let snap = s.snapshot(2);
        assert_eq!(snap.previous("atr_14"), Some(2.0));
        assert_eq!(snap.back("atr_14", 2), None); // NaN at index 0
    }

    #[test]
    fn snapshot_max_since() {
        let mut s = IndicatorSeries::new();
        s.insert("atr_14", vec![f64::NAN, 2.0, 3.0, 2.5, 1.0]);
        let snap = s.snapshot(4);
        assert_eq!(snap.max_since("atr_14", 1), Some(3.0));
        assert_eq!(snap.max_since("atr_14", 3), Some(2.5));
        let snap = s.snapshot(0);
        assert_eq!(snap.max_since("atr_14", 0), None); // only NaN in range
    }

    #[test]
    fn registry_dedups_by_name() {
        let mut registry = IndicatorRegistry::new();
        registry.register(Box::new(Ema::new(9)));
        registry.register(Box::new(Ema::new(9)));
        registry.register(Box::new(Ema::new(21)));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.max_lookback(), 20);
    }

    #[test]
    fn registry_precomputes_all_series() {
        let candles = make_candles(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let registry = IndicatorRegistry::from_indicators(vec![
            Box::new(Ema::new(3)),
            Box::new(Atr::new(2)),
        ]);
        let series = registry.precompute(&candles);
        assert_eq!(series.len(), 2);
        assert!(series.get_series("ema_3").is_some());
        assert!(series.get_series("atr_2").is_some());
    }
}
