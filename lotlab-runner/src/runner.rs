//! Single-symbol runner — wires feed, validation, strategy factory, the
//! engine loop, and metrics into one call.

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::info;

use lotlab_core::config::{validate, StrategyConfig, ValidationReport};
use lotlab_core::domain::Timeframe;
use lotlab_core::engine::{run_symbol, CancelToken};
use lotlab_core::execution::BacktestExecutor;
use lotlab_core::feed::{CandleFeed, FeedError};
use lotlab_core::strategy::{create_strategy, StrategyError};

use crate::report::BacktestResult;

/// Errors from the runner. A config rejection carries the full validation
/// report so callers can show every finding, not just the first.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("configuration rejected: {report}")]
    Config { report: ValidationReport },

    #[error("feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("strategy error: {0}")]
    Strategy(#[from] StrategyError),
}

/// Run one symbol end to end: validate, load candles, simulate, score.
///
/// A fatal validation report aborts before any candle is touched. Non-fatal
/// findings are logged and the run proceeds.
pub fn run_symbol_backtest(
    feed: &dyn CandleFeed,
    symbol: &str,
    timeframe: Timeframe,
    start: NaiveDateTime,
    end: NaiveDateTime,
    config: &StrategyConfig,
    cancel: &CancelToken,
) -> Result<BacktestResult, RunError> {
    let report = validate(config);
    if report.is_fatal() {
        return Err(RunError::Config { report });
    }
    if !report.is_clean() {
        info!(symbol, "non-fatal config findings: {report}");
    }

    let strategy = create_strategy(&config.strategy)?;
    let candles = feed.historical_candles(symbol, timeframe, start, end)?;
    let run = run_symbol(
        symbol,
        timeframe,
        candles,
        config,
        strategy.as_ref(),
        &BacktestExecutor,
        cancel,
    );
    Ok(BacktestResult::from_run(run, config.capital))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotlab_core::domain::Candle;
    use lotlab_core::feed::MemoryFeed;

    fn ts(i: usize) -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * i as i64)
    }

    fn flat_candles(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| Candle {
                symbol: "TCS".into(),
                timeframe: Timeframe::FiveMinute,
                timestamp: ts(i),
                open: 100.0,
                high: 100.5,
                low: 99.5,
                close: 100.0,
                volume: 1000,
            })
            .collect()
    }

    #[test]
    fn fatal_config_aborts_before_the_feed() {
        let feed = MemoryFeed::new(); // empty on purpose
        let config = StrategyConfig {
            max_loss_pct: 0.0,
            ..StrategyConfig::default()
        };
        let err = run_symbol_backtest(
            &feed,
            "TCS",
            Timeframe::FiveMinute,
            ts(0),
            ts(100),
            &config,
            &CancelToken::new(),
        )
        .unwrap_err();
        // Config error, not a feed error: validation ran first.
        assert!(matches!(err, RunError::Config { .. }));
    }

    #[test]
    fn missing_data_is_a_feed_error() {
        let feed = MemoryFeed::new();
        let err = run_symbol_backtest(
            &feed,
            "TCS",
            Timeframe::FiveMinute,
            ts(0),
            ts(100),
            &StrategyConfig::default(),
            &CancelToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, RunError::Feed(FeedError::NoData { .. })));
    }

    #[test]
    fn quiet_feed_completes_with_zero_trades() {
        let mut feed = MemoryFeed::new();
        feed.insert("TCS", flat_candles(60));
        let result = run_symbol_backtest(
            &feed,
            "TCS",
            Timeframe::FiveMinute,
            ts(0),
            ts(60),
            &StrategyConfig::default(),
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(result.total_trades, 0);
        assert_eq!(result.total_return, 0.0);
        assert!(!result.cancelled);
    }
}
