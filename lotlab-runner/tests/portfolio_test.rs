//! Multi-symbol coordination: isolation, failure containment, analytics.

use lotlab_core::config::StrategyConfig;
use lotlab_core::domain::{Candle, Timeframe};
use lotlab_core::engine::CancelToken;
use lotlab_core::feed::MemoryFeed;
use lotlab_runner::portfolio::{run_portfolio, PortfolioOptions, SymbolSpec};

fn ts(i: usize) -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
        + chrono::Duration::minutes(5 * i as i64)
}

fn candles_from_closes(symbol: &str, closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle {
            symbol: symbol.to_string(),
            timeframe: Timeframe::FiveMinute,
            timestamp: ts(i),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 1000,
        })
        .collect()
}

fn small_period_config() -> StrategyConfig {
    StrategyConfig {
        fast_ema_period: 3,
        slow_ema_period: 6,
        rsi_period: 2,
        rsi_entry_min: 0.0,
        rsi_entry_max: 100.0,
        rsi_exit_long: 101.0,
        rsi_exit_short: -1.0,
        atr_period: 2,
        atr_decline_threshold: 1.0,
        macd_fast_period: 3,
        macd_slow_period: 6,
        macd_signal_period: 3,
        supertrend_period: 3,
        ..StrategyConfig::default()
    }
}

/// Descent then rally: one long round trip per run.
fn trending_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..20).map(|i| 110.0 - i as f64).collect();
    closes.extend((1..=15).map(|i| 91.0 + 3.0 * i as f64));
    closes.extend((1..=8).map(|i| 136.0 - 4.0 * i as f64));
    closes
}

fn options() -> PortfolioOptions {
    PortfolioOptions {
        timeframe: Timeframe::FiveMinute,
        start: ts(0),
        end: ts(500),
        concurrency: 2,
    }
}

#[test]
fn independent_symbols_all_complete() {
    let mut feed = MemoryFeed::new();
    feed.insert("RELIANCE", candles_from_closes("RELIANCE", &trending_closes()));
    feed.insert("TCS", candles_from_closes("TCS", &trending_closes()));

    let specs = vec![
        SymbolSpec {
            symbol: "RELIANCE".into(),
            config: small_period_config(),
        },
        SymbolSpec {
            symbol: "TCS".into(),
            config: small_period_config(),
        },
    ];
    let result = run_portfolio(&feed, &specs, &options(), &CancelToken::new());

    assert_eq!(result.runs.len(), 2);
    assert!(result.failures.is_empty());
    for run in &result.runs {
        assert_eq!(run.total_trades, 1);
        assert!(!run.cancelled);
    }

    // Identical feeds → perfectly correlated returns.
    assert_eq!(result.stats.correlations.len(), 1);
    assert!((result.stats.correlations[0].correlation - 1.0).abs() < 1e-9);

    // Portfolio equity is the per-index sum of both curves.
    let expected: f64 = result
        .runs
        .iter()
        .map(|r| r.equity_curve.last().unwrap().equity)
        .sum();
    let got = *result.stats.portfolio_equity.last().unwrap();
    assert!((got - expected).abs() < 1e-9);
}

#[test]
fn one_failing_symbol_does_not_abort_siblings() {
    let mut feed = MemoryFeed::new();
    feed.insert("RELIANCE", candles_from_closes("RELIANCE", &trending_closes()));
    // "GHOST" has no data at all.

    let specs = vec![
        SymbolSpec {
            symbol: "RELIANCE".into(),
            config: small_period_config(),
        },
        SymbolSpec {
            symbol: "GHOST".into(),
            config: small_period_config(),
        },
    ];
    let result = run_portfolio(&feed, &specs, &options(), &CancelToken::new());

    assert_eq!(result.runs.len(), 1);
    assert_eq!(result.runs[0].symbol, "RELIANCE");
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].symbol, "GHOST");
    assert!(result.failures[0].error.contains("no candles"));
}

#[test]
fn fatal_config_is_contained_as_a_per_symbol_failure() {
    let mut feed = MemoryFeed::new();
    feed.insert("RELIANCE", candles_from_closes("RELIANCE", &trending_closes()));

    let mut bad = small_period_config();
    bad.max_lots = 99; // over the ceiling
    let specs = vec![SymbolSpec {
        symbol: "RELIANCE".into(),
        config: bad,
    }];
    let result = run_portfolio(&feed, &specs, &options(), &CancelToken::new());

    assert!(result.runs.is_empty());
    assert_eq!(result.failures.len(), 1);
    assert!(result.failures[0].error.contains("max_lots"));
}

#[test]
fn cancelled_portfolio_reports_partial_runs() {
    let mut feed = MemoryFeed::new();
    feed.insert("RELIANCE", candles_from_closes("RELIANCE", &trending_closes()));

    let cancel = CancelToken::new();
    cancel.cancel();
    let specs = vec![SymbolSpec {
        symbol: "RELIANCE".into(),
        config: small_period_config(),
    }];
    let result = run_portfolio(&feed, &specs, &options(), &cancel);

    assert_eq!(result.runs.len(), 1);
    assert!(result.runs[0].cancelled);
    assert_eq!(result.runs[0].total_trades, 0);
}

#[test]
fn zero_symbol_portfolio_is_empty_not_an_error() {
    let feed = MemoryFeed::new();
    let result = run_portfolio(&feed, &[], &options(), &CancelToken::new());
    assert!(result.runs.is_empty());
    assert!(result.failures.is_empty());
    assert!(result.stats.portfolio_equity.is_empty());
}
