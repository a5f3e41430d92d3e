//! Performance metrics — pure functions over the trade log and equity curve.
//!
//! Every metric is a pure function: trades and/or equity in, scalar out.
//! Zero-trade inputs produce zeros, and the profit factor uses a finite
//! sentinel instead of infinity so serialized results stay valid JSON.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use lotlab_core::domain::{ClosedTrade, ExitReason, Timeframe};
use lotlab_core::engine::EquityPoint;

/// Sentinel for a profit factor with no losing trades.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Trade statistics grouped by exit reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasonBreakdown {
    pub count: usize,
    pub total_pnl: f64,
    pub avg_pnl: f64,
}

/// Aggregate performance metrics for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Total return as a fraction of initial capital.
    pub total_return: f64,
    pub total_return_percentage: f64,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,
    /// Peak-to-trough drawdown as a negative fraction.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub trade_count: usize,
    pub exit_reasons: BTreeMap<ExitReason, ReasonBreakdown>,
}

impl PerformanceMetrics {
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[ClosedTrade],
        initial_capital: f64,
        timeframe: Timeframe,
    ) -> Self {
        let total_return = total_return(equity_curve, initial_capital);
        Self {
            total_return,
            total_return_percentage: total_return * 100.0,
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            average_win: average_win(trades),
            average_loss: average_loss(trades),
            max_drawdown: max_drawdown(equity_curve),
            sharpe_ratio: sharpe_ratio(equity_curve, timeframe.periods_per_year()),
            trade_count: trades.len(),
            exit_reasons: exit_reason_breakdown(trades),
        }
    }
}

// ─── Individual metric functions ─────────────────────────────────────

/// (final - initial) / initial. Zero for an empty curve or bad capital.
pub fn total_return(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    if initial_capital <= 0.0 {
        return 0.0;
    }
    match equity_curve.last() {
        Some(last) => (last.equity - initial_capital) / initial_capital,
        None => 0.0,
    }
}

/// Fraction of trades that closed in profit. Zero trades → 0.0.
pub fn win_rate(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Gross profits / gross losses.
///
/// Zero losing trades with positive wins reports [`PROFIT_FACTOR_CAP`] — a
/// defined sentinel rather than infinity. Zero trades → 0.0.
pub fn profit_factor(trades: &[ClosedTrade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 {
            PROFIT_FACTOR_CAP
        } else {
            0.0
        };
    }
    (gross_profit / gross_loss).min(PROFIT_FACTOR_CAP)
}

/// Mean P&L of winning trades (currency). No winners → 0.0.
pub fn average_win(trades: &[ClosedTrade]) -> f64 {
    let wins: Vec<f64> = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).collect();
    if wins.is_empty() {
        return 0.0;
    }
    wins.iter().sum::<f64>() / wins.len() as f64
}

/// Mean P&L of losing trades (currency, negative). No losers → 0.0.
pub fn average_loss(trades: &[ClosedTrade]) -> f64 {
    let losses: Vec<f64> = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl)
        .collect();
    if losses.is_empty() {
        return 0.0;
    }
    losses.iter().sum::<f64>() / losses.len() as f64
}

/// Maximum drawdown as a negative fraction (e.g., -0.15 for 15%).
pub fn max_drawdown(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0].equity;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            let dd = (point.equity - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Per-period simple returns of an equity curve.
pub fn period_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .filter(|w| w[0].equity > 0.0)
        .map(|w| (w[1].equity - w[0].equity) / w[0].equity)
        .collect()
}

/// Annualized Sharpe ratio (risk-free rate 0) from per-period returns.
/// Zero variance or fewer than 2 samples → 0.0.
pub fn sharpe_ratio(equity_curve: &[EquityPoint], periods_per_year: f64) -> f64 {
    let returns = period_returns(equity_curve);
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = mean(&returns);
    let std = std_dev(&returns);
    if std < 1e-15 {
        return 0.0;
    }
    (mean / std) * periods_per_year.sqrt()
}

/// Trade count and P&L grouped by exit reason.
pub fn exit_reason_breakdown(trades: &[ClosedTrade]) -> BTreeMap<ExitReason, ReasonBreakdown> {
    let mut grouped: BTreeMap<ExitReason, (usize, f64)> = BTreeMap::new();
    for trade in trades {
        let entry = grouped.entry(trade.exit_reason).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += trade.pnl;
    }
    grouped
        .into_iter()
        .map(|(reason, (count, total_pnl))| {
            (
                reason,
                ReasonBreakdown {
                    count,
                    total_pnl,
                    avg_pnl: total_pnl / count as f64,
                },
            )
        })
        .collect()
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotlab_core::domain::{Direction, Lot, LotId};

    fn ts(i: usize) -> chrono::NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(9, 15, 0)
            .unwrap()
            + chrono::Duration::minutes(5 * i as i64)
    }

    fn trade(entry: f64, exit: f64, reason: ExitReason) -> ClosedTrade {
        let lot = Lot::open(LotId(1), Direction::Long, entry, ts(0), 0, 10.0);
        ClosedTrade::from_lot("SYM", &lot, exit, ts(5), reason)
    }

    fn equity(values: &[f64]) -> Vec<EquityPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint {
                timestamp: ts(i),
                equity,
            })
            .collect()
    }

    #[test]
    fn zero_trades_produce_zeros_not_nan() {
        let metrics = PerformanceMetrics::compute(&[], &[], 100_000.0, Timeframe::FiveMinute);
        assert_eq!(metrics.trade_count, 0);
        assert_eq!(metrics.win_rate, 0.0);
        assert_eq!(metrics.profit_factor, 0.0);
        assert_eq!(metrics.average_win, 0.0);
        assert_eq!(metrics.average_loss, 0.0);
        assert_eq!(metrics.total_return, 0.0);
        assert_eq!(metrics.sharpe_ratio, 0.0);
        assert!(metrics.exit_reasons.is_empty());
        // Must survive serialization: no NaN/inf anywhere.
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(!json.contains("null"));
    }

    #[test]
    fn profit_factor_matches_identity() {
        let trades = vec![
            trade(100.0, 110.0, ExitReason::EmaFlip),     // +100
            trade(100.0, 95.0, ExitReason::TrailingStop), // -50
            trade(100.0, 103.0, ExitReason::RsiExit),     // +30
        ];
        let pf = profit_factor(&trades);
        assert!((pf - 130.0 / 50.0).abs() < 1e-10);
    }

    #[test]
    fn profit_factor_sentinel_when_no_losses() {
        let trades = vec![trade(100.0, 110.0, ExitReason::EmaFlip)];
        assert_eq!(profit_factor(&trades), PROFIT_FACTOR_CAP);
        // Finite, JSON-safe.
        assert!(profit_factor(&trades).is_finite());
    }

    #[test]
    fn win_rate_and_averages() {
        let trades = vec![
            trade(100.0, 110.0, ExitReason::EmaFlip), // +100
            trade(100.0, 120.0, ExitReason::EmaFlip), // +200
            trade(100.0, 95.0, ExitReason::TimeExit), // -50
            trade(100.0, 100.0, ExitReason::TimeExit), // flat counts as a loss for win rate
        ];
        assert_eq!(win_rate(&trades), 0.5);
        assert_eq!(average_win(&trades), 150.0);
        assert_eq!(average_loss(&trades), -50.0);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let curve = equity(&[100_000.0, 110_000.0, 90_000.0, 95_000.0]);
        let dd = max_drawdown(&curve);
        assert!((dd - (90_000.0 - 110_000.0) / 110_000.0).abs() < 1e-10);
    }

    #[test]
    fn sharpe_positive_for_steady_gains() {
        let curve = equity(&[100.0, 101.0, 102.5, 103.0, 104.2, 105.0]);
        assert!(sharpe_ratio(&curve, 252.0) > 0.0);
    }

    #[test]
    fn sharpe_zero_for_flat_curve() {
        let curve = equity(&[100.0; 10]);
        assert_eq!(sharpe_ratio(&curve, 252.0), 0.0);
    }

    #[test]
    fn breakdown_groups_by_reason() {
        let trades = vec![
            trade(100.0, 110.0, ExitReason::EmaFlip),
            trade(100.0, 112.0, ExitReason::EmaFlip),
            trade(100.0, 95.0, ExitReason::TrailingStop),
        ];
        let breakdown = exit_reason_breakdown(&trades);
        assert_eq!(breakdown.len(), 2);
        let flips = &breakdown[&ExitReason::EmaFlip];
        assert_eq!(flips.count, 2);
        assert_eq!(flips.total_pnl, 100.0 + 120.0);
        assert_eq!(flips.avg_pnl, 110.0);
        assert_eq!(breakdown[&ExitReason::TrailingStop].count, 1);
    }
}
