//! Supertrend — ATR-banded directional indicator.
//!
//! Inherently sequential: direction flips between support and resistance
//! depending on where the close sits relative to the bands, and the bands
//! only tighten while the trend holds.
//!
//! Exposed as two named instances so the single-series `Indicator` trait
//! stays unchanged: `supertrend_{p}_{m}` (active band) and
//! `supertrend_dir_{p}_{m}` (+1.0 trending up, -1.0 trending down).

use crate::domain::Candle;

use super::atr::{true_range, wilder_smooth};
use super::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupertrendOutput {
    /// The active band: lower band (support) in an uptrend, upper band
    /// (resistance) in a downtrend.
    Band,
    /// +1.0 / -1.0 trend direction.
    Direction,
}

#[derive(Debug, Clone)]
pub struct Supertrend {
    period: usize,
    multiplier: f64,
    output: SupertrendOutput,
    name: String,
}

impl Supertrend {
    pub fn new(period: usize, multiplier: f64, output: SupertrendOutput) -> Self {
        assert!(period >= 1, "Supertrend period must be >= 1");
        assert!(multiplier > 0.0, "Supertrend multiplier must be positive");
        let name = match output {
            SupertrendOutput::Band => format!("supertrend_{period}_{multiplier}"),
            SupertrendOutput::Direction => format!("supertrend_dir_{period}_{multiplier}"),
        };
        Self {
            period,
            multiplier,
            output,
            name,
        }
    }
}

impl Indicator for Supertrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut band = vec![f64::NAN; n];
        let mut dir = vec![f64::NAN; n];

        let atr = wilder_smooth(&true_range(candles), self.period);

        let start = match atr.iter().position(|v| !v.is_nan()) {
            Some(idx) => idx,
            None => {
                return band;
            }
        };

        let hl2 = (candles[start].high + candles[start].low) / 2.0;
        let mut upper_band = hl2 + self.multiplier * atr[start];
        let mut lower_band = hl2 - self.multiplier * atr[start];
        let mut trending_up = true;
        band[start] = lower_band;
        dir[start] = 1.0;

        for i in (start + 1)..n {
            if atr[i].is_nan()
                || candles[i].close.is_nan()
                || candles[i].high.is_nan()
                || candles[i].low.is_nan()
            {
                continue;
            }

            let hl2 = (candles[i].high + candles[i].low) / 2.0;
            let basic_upper = hl2 + self.multiplier * atr[i];
            let basic_lower = hl2 - self.multiplier * atr[i];

            let prev_close = candles[i - 1].close;

            // Bands only tighten while price stays on their side.
            upper_band = if !prev_close.is_nan() && prev_close <= upper_band {
                basic_upper.min(upper_band)
            } else {
                basic_upper
            };
            lower_band = if !prev_close.is_nan() && prev_close >= lower_band {
                basic_lower.max(lower_band)
            } else {
                basic_lower
            };

            let close = candles[i].close;
            if trending_up && close < lower_band {
                trending_up = false;
            } else if !trending_up && close > upper_band {
                trending_up = true;
            }

            band[i] = if trending_up { lower_band } else { upper_band };
            dir[i] = if trending_up { 1.0 } else { -1.0 };
        }

        match self.output {
            SupertrendOutput::Band => band,
            SupertrendOutput::Direction => dir,
        }
    }
}
