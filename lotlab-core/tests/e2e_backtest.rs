//! End-to-end scenarios for the per-symbol backtest loop.

use lotlab_core::config::{ExitMode, StrategyConfig, TrailingConfig, TrailingMode};
use lotlab_core::domain::{Candle, Direction, ExitReason, Timeframe};
use lotlab_core::engine::{run_symbol, CancelToken};
use lotlab_core::execution::BacktestExecutor;
use lotlab_core::strategy::create_strategy;

fn ts(i: usize) -> chrono::NaiveDateTime {
    chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(9, 15, 0)
        .unwrap()
        + chrono::Duration::minutes(5 * i as i64)
}

fn candle(i: usize, close: f64, high: f64, low: f64) -> Candle {
    Candle {
        symbol: "RELIANCE".into(),
        timeframe: Timeframe::FiveMinute,
        timestamp: ts(i),
        open: close,
        high,
        low,
        close,
        volume: 10_000,
    }
}

fn from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| candle(i, c, c + 0.5, c - 0.5))
        .collect()
}

/// Small periods keep the warm-up short: max matching period is the slow
/// EMA (6) plus the 10-candle buffer.
fn test_config() -> StrategyConfig {
    StrategyConfig {
        strategy: "ema_gap_atr".into(),
        fast_ema_period: 3,
        slow_ema_period: 6,
        rsi_period: 2,
        rsi_entry_min: 0.0,
        rsi_entry_max: 100.0,
        rsi_exit_long: 101.0,
        rsi_exit_short: -1.0,
        atr_period: 2,
        atr_expansion_ratio: None,
        atr_reference_lookback: 2,
        atr_decline_threshold: 1.0,
        macd_fast_period: 3,
        macd_slow_period: 6,
        macd_signal_period: 3,
        supertrend_period: 3,
        supertrend_multiplier: 2.0,
        max_lots: 1,
        pyramiding_enabled: false,
        exit_mode: ExitMode::Fifo,
        position_size: 10.0,
        capital: 100_000.0,
        max_loss_pct: 0.05,
        trailing: TrailingConfig {
            enabled: false,
            mode: TrailingMode::Atr { multiplier: 2.0 },
            activation_profit: 0.01,
            max_trail_distance: None,
        },
        mis_exit_time: None,
        cnc_exit_time: None,
    }
}

fn run(candles: Vec<Candle>, config: &StrategyConfig) -> lotlab_core::engine::SymbolRun {
    let strategy = create_strategy(&config.strategy).unwrap();
    run_symbol(
        "RELIANCE",
        Timeframe::FiveMinute,
        candles,
        config,
        strategy.as_ref(),
        &BacktestExecutor,
        &CancelToken::new(),
    )
}

#[test]
fn flat_feed_produces_no_trades_and_zero_return() {
    let config = test_config();
    let candles = from_closes(&vec![100.0; 40]);
    let result = run(candles, &config);

    assert!(result.trades.is_empty());
    assert!(!result.cancelled);
    assert_eq!(result.candles_seen, 40);
    assert_eq!(result.equity_curve.len(), 40);
    for point in &result.equity_curve {
        assert_eq!(point.equity, config.capital);
    }
}

#[test]
fn single_crossover_round_trip_exits_on_ema_flip() {
    let config = test_config();
    // Long descent, sharp rally (one cross up), then a collapse (one cross
    // down while long).
    let mut closes: Vec<f64> = (0..20).map(|i| 110.0 - i as f64).collect(); // 110 → 91
    closes.extend((1..=15).map(|i| 91.0 + 3.0 * i as f64)); // 94 → 136
    closes.extend((1..=8).map(|i| 136.0 - 4.0 * i as f64)); // 132 → 104
    let result = run(from_closes(&closes), &config);

    assert_eq!(result.trades.len(), 1, "expected one round trip");
    let trade = &result.trades[0];
    assert_eq!(trade.direction, Direction::Long);
    assert_eq!(trade.exit_reason, ExitReason::EmaFlip);
    assert_eq!(trade.quantity, config.position_size);
    assert!(trade.entry_timestamp < trade.exit_timestamp);
    assert!(trade.pnl > 0.0, "rally entry should close in profit");
    assert_eq!(result.signals_rejected, 0);
}

#[test]
fn pyramiding_fills_three_lots_and_exits_fifo() {
    let mut config = test_config();
    config.max_lots = 3;
    config.pyramiding_enabled = true;
    config.atr_expansion_ratio = Some(1.05);

    // Flat base, then a climb with ranges blowing out candle after candle:
    // the crossover entry is followed by expansion-confirmed pyramids.
    let mut candles: Vec<Candle> = (0..20)
        .map(|i| candle(i, 100.0, 100.5, 99.5))
        .collect();
    for k in 1..=8 {
        let i = 19 + k;
        let close = 100.0 + 3.5 * k as f64;
        let range = 1.0 + k as f64;
        candles.push(candle(i, close, close + range / 2.0, close - range / 2.0));
    }
    let result = run(candles, &config);

    assert_eq!(result.trades.len(), 3, "one trade per pyramided lot");
    // FIFO: closed in entry order, each with its own entry price.
    let entries: Vec<f64> = result.trades.iter().map(|t| t.entry_price).collect();
    let mut sorted = entries.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(entries, sorted, "FIFO closes oldest (cheapest) lot first");
    assert_eq!(entries.len(), 3);
    assert!(entries[0] < entries[1] && entries[1] < entries[2]);

    // Force close at end of data: one price, one timestamp, all lots.
    let exit_prices: Vec<f64> = result.trades.iter().map(|t| t.exit_price).collect();
    assert!(exit_prices.windows(2).all(|w| w[0] == w[1]));
    for trade in &result.trades {
        assert_eq!(trade.exit_reason, ExitReason::EndOfData);
    }
    assert_eq!(result.signals_rejected, 0);
}

#[test]
fn trailing_stop_locks_in_profit_before_entry_price() {
    let mut config = test_config();
    config.trailing = TrailingConfig {
        enabled: true,
        mode: TrailingMode::Atr { multiplier: 2.0 },
        activation_profit: 0.01,
        max_trail_distance: None,
    };

    let mut candles: Vec<Candle> = (0..20)
        .map(|i| candle(i, 100.0, 100.5, 99.5))
        .collect();
    // Entry crossover, then a ~5% climb that arms the stop.
    for (k, close) in [101.0, 102.0, 103.0, 104.0, 105.0, 106.0]
        .iter()
        .enumerate()
    {
        let i = 20 + k;
        candles.push(candle(i, *close, close + 0.5, close - 0.5));
    }
    // Reversal: the second pullback candle crosses the ratcheted stop.
    candles.push(candle(26, 104.5, 105.0, 104.0));
    candles.push(candle(27, 103.0, 103.8, 102.6));
    let result = run(candles, &config);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::TrailingStop);
    assert_eq!(trade.direction, Direction::Long);
    // The stop fired above the entry price: profit locked in before the
    // pullback could round-trip the trade.
    assert!(trade.exit_price > trade.entry_price);
    assert!(trade.pnl > 0.0);
}

#[test]
fn cancellation_yields_partial_result() {
    let config = test_config();
    let candles = from_closes(&vec![100.0; 40]);
    let strategy = create_strategy(&config.strategy).unwrap();
    let cancel = CancelToken::new();
    cancel.cancel();

    let result = run_symbol(
        "RELIANCE",
        Timeframe::FiveMinute,
        candles,
        &config,
        strategy.as_ref(),
        &BacktestExecutor,
        &cancel,
    );

    assert!(result.cancelled);
    assert!(result.trades.is_empty());
    assert!(result.equity_curve.is_empty());
}

#[test]
fn out_of_order_candles_are_dropped_not_fatal() {
    let config = test_config();
    let mut candles = from_closes(&vec![100.0; 30]);
    // Inject a duplicate and a backward timestamp mid-feed.
    candles[10].timestamp = candles[9].timestamp;
    candles[20].timestamp = ts(3);
    let result = run(candles, &config);

    assert_eq!(result.candles_skipped, 2);
    assert_eq!(result.candles_seen, 28);
    assert!(result.trades.is_empty());
}

#[test]
fn time_cutoff_closes_an_open_position() {
    let mut config = test_config();
    config.mis_exit_time = Some("11:00".into());

    // Crossover entry well before 11:00, rally continues past the cutoff.
    // Candle 0 is 09:15; candle i is 09:15 + 5i minutes, so 11:00 is i = 21.
    let mut closes: Vec<f64> = (0..16).map(|_| 100.0).collect();
    closes.extend((1..=14).map(|i| 100.0 + 2.0 * i as f64));
    let result = run(from_closes(&closes), &config);

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::TimeExit);
    assert_eq!(trade.exit_timestamp.time(), ts(21).time());
}
