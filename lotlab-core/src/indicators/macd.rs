//! Moving Average Convergence Divergence (MACD).
//!
//! Line = EMA(fast) - EMA(slow); Signal = EMA(signal_period) of the line;
//! Histogram = Line - Signal.
//!
//! Exposed as three named instances (one per output) so the single-series
//! `Indicator` trait stays unchanged:
//! `macd_{fast}_{slow}`, `macd_signal_{fast}_{slow}_{signal}`,
//! `macd_hist_{fast}_{slow}_{signal}`.

use crate::domain::Candle;

use super::ema::ema_of_series;
use super::Indicator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
    Histogram,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdOutput) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow");
        let name = match output {
            MacdOutput::Line => format!("macd_{fast}_{slow}"),
            MacdOutput::Signal => format!("macd_signal_{fast}_{slow}_{signal}"),
            MacdOutput::Histogram => format!("macd_hist_{fast}_{slow}_{signal}"),
        };
        Self {
            fast,
            slow,
            signal,
            output,
            name,
        }
    }

    fn line(&self, closes: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        fast.iter()
            .zip(slow.iter())
            .map(|(f, s)| {
                if f.is_nan() || s.is_nan() {
                    f64::NAN
                } else {
                    f - s
                }
            })
            .collect()
    }
}

/// EMA that tolerates a NaN warm-up prefix: the seed window starts at the
/// first run of `period` consecutive valid values. The MACD line always has
/// such a prefix, so plain `ema_of_series` would taint the whole signal.
fn ema_after_prefix(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if n < period || period == 0 {
        return result;
    }

    let seed_start = (0..n).find(|&i| {
        i + period <= n && values[i..i + period].iter().all(|v| !v.is_nan())
    });
    let seed_start = match seed_start {
        Some(s) => s,
        None => return result,
    };
    let seed_end = seed_start + period;

    let seed: f64 = values[seed_start..seed_end].iter().sum::<f64>() / period as f64;
    result[seed_end - 1] = seed;

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = seed;
    for i in seed_end..n {
        if values[i].is_nan() {
            for val in result.iter_mut().skip(i) {
                *val = f64::NAN;
            }
            return result;
        }
        let ema = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = ema;
        prev = ema;
    }

    result
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdOutput::Line => self.slow.saturating_sub(1),
            MacdOutput::Signal | MacdOutput::Histogram => {
                self.slow.saturating_sub(1) + self.signal.saturating_sub(1)
            }
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let line = self.line(&closes);
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => ema_after_prefix(&line, self.signal),
            MacdOutput::Histogram => {
                let signal = ema_after_prefix(&line, self.signal);
                line.iter()
                    .zip(signal.iter())
                    .map(|(l, s)| {
                        if l.is_nan() || s.is_nan() {
                            f64::NAN
                        } else {
                            l - s
                        }
                    })
                    .collect()
            }
        }
    }
}
