//! Multi-symbol coordinator — one backtest per symbol on a bounded worker
//! pool, then cross-symbol analytics.
//!
//! Symbols are fully independent: no ledger or position state crosses the
//! worker boundary, and the join before analytics is the only
//! synchronization point. One symbol failing (for example, no data in
//! range) is recorded and must never abort its siblings.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use chrono::NaiveDateTime;

use lotlab_core::config::StrategyConfig;
use lotlab_core::domain::Timeframe;
use lotlab_core::engine::CancelToken;
use lotlab_core::feed::CandleFeed;

use crate::metrics::{mean, period_returns, std_dev};
use crate::report::BacktestResult;
use crate::runner::run_symbol_backtest;

/// One symbol plus its (possibly overridden) strategy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub symbol: String,
    pub config: StrategyConfig,
}

/// Portfolio run parameters.
#[derive(Debug, Clone)]
pub struct PortfolioOptions {
    pub timeframe: Timeframe,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Upper bound on concurrent per-symbol workers.
    pub concurrency: usize,
}

/// A per-symbol failure record. Sibling runs continue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolFailure {
    pub symbol: String,
    pub error: String,
}

/// Pairwise return correlation between two symbols.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairCorrelation {
    pub a: String,
    pub b: String,
    pub correlation: f64,
}

/// Cross-symbol analytics over the successful runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortfolioStats {
    /// Index-aligned sum of per-symbol equity curves (shorter curves carry
    /// their last value forward).
    pub portfolio_equity: Vec<f64>,
    pub correlations: Vec<PairCorrelation>,
    /// Weighted average of individual volatilities over portfolio
    /// volatility; higher means the mix diversifies more.
    pub diversification_ratio: f64,
    /// Herfindahl index over per-symbol gross P&L shares.
    pub concentration: f64,
}

/// Result of a portfolio run: per-symbol reports, failures, analytics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioResult {
    pub runs: Vec<BacktestResult>,
    pub failures: Vec<SymbolFailure>,
    pub stats: PortfolioStats,
}

/// Run every symbol, join, and compute cross-symbol statistics.
pub fn run_portfolio(
    feed: &dyn CandleFeed,
    specs: &[SymbolSpec],
    opts: &PortfolioOptions,
    cancel: &CancelToken,
) -> PortfolioResult {
    let workers = opts.concurrency.clamp(1, specs.len().max(1));

    let run_one = |spec: &SymbolSpec| {
        run_symbol_backtest(
            feed,
            &spec.symbol,
            opts.timeframe,
            opts.start,
            opts.end,
            &spec.config,
            cancel,
        )
        .map_err(|err| SymbolFailure {
            symbol: spec.symbol.clone(),
            error: err.to_string(),
        })
    };

    let outcomes: Vec<Result<BacktestResult, SymbolFailure>> =
        match rayon::ThreadPoolBuilder::new().num_threads(workers).build() {
            Ok(pool) => pool.install(|| specs.par_iter().map(run_one).collect()),
            Err(err) => {
                // Degraded but correct: run the symbols sequentially.
                warn!(%err, "worker pool unavailable; running serially");
                specs.iter().map(run_one).collect()
            }
        };

    let mut runs = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            Ok(run) => runs.push(run),
            Err(failure) => {
                warn!(symbol = %failure.symbol, error = %failure.error, "symbol run failed");
                failures.push(failure);
            }
        }
    }

    let stats = portfolio_stats(&runs);
    PortfolioResult {
        runs,
        failures,
        stats,
    }
}

/// Cross-symbol analytics over the completed runs.
pub fn portfolio_stats(runs: &[BacktestResult]) -> PortfolioStats {
    if runs.is_empty() {
        return PortfolioStats::default();
    }

    let portfolio_equity = summed_equity(runs);

    // Pairwise correlations of per-period returns.
    let per_symbol_returns: Vec<Vec<f64>> = runs
        .iter()
        .map(|r| period_returns(&r.equity_curve))
        .collect();
    let mut correlations = Vec::new();
    for i in 0..runs.len() {
        for j in (i + 1)..runs.len() {
            correlations.push(PairCorrelation {
                a: runs[i].symbol.clone(),
                b: runs[j].symbol.clone(),
                correlation: pearson(&per_symbol_returns[i], &per_symbol_returns[j]),
            });
        }
    }

    // Diversification ratio: capital-weighted individual vols over the
    // portfolio's own vol.
    let total_capital: f64 = runs.iter().map(|r| r.initial_capital).sum();
    let weighted_vol: f64 = if total_capital > 0.0 {
        runs.iter()
            .zip(&per_symbol_returns)
            .map(|(r, returns)| (r.initial_capital / total_capital) * std_dev(returns))
            .sum()
    } else {
        0.0
    };
    let portfolio_returns: Vec<f64> = portfolio_equity
        .windows(2)
        .filter(|w| w[0] > 0.0)
        .map(|w| (w[1] - w[0]) / w[0])
        .collect();
    let portfolio_vol = std_dev(&portfolio_returns);
    let diversification_ratio = if portfolio_vol > 1e-15 {
        weighted_vol / portfolio_vol
    } else {
        0.0
    };

    // Concentration: Herfindahl index over gross |P&L| shares.
    let gross: Vec<f64> = runs
        .iter()
        .map(|r| r.trades.iter().map(|t| t.pnl.abs()).sum::<f64>())
        .collect();
    let gross_total: f64 = gross.iter().sum();
    let concentration = if gross_total > 0.0 {
        gross
            .iter()
            .map(|g| (g / gross_total).powi(2))
            .sum::<f64>()
    } else {
        0.0
    };

    PortfolioStats {
        portfolio_equity,
        correlations,
        diversification_ratio,
        concentration,
    }
}

/// Index-aligned sum of equity curves; shorter curves carry their last
/// value forward so a cancelled or short run doesn't dent the total.
fn summed_equity(runs: &[BacktestResult]) -> Vec<f64> {
    let len = runs
        .iter()
        .map(|r| r.equity_curve.len())
        .max()
        .unwrap_or(0);
    (0..len)
        .map(|i| {
            runs.iter()
                .filter_map(|r| {
                    r.equity_curve
                        .get(i)
                        .or_else(|| r.equity_curve.last())
                        .map(|p| p.equity)
                })
                .sum()
        })
        .collect()
}

/// Pearson correlation over the overlapping prefix of two return series.
fn pearson(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0;
    let mut va = 0.0;
    let mut vb = 0.0;
    for i in 0..n {
        let da = a[i] - ma;
        let db = b[i] - mb;
        cov += da * db;
        va += da * da;
        vb += db * db;
    }
    if va < 1e-30 || vb < 1e-30 {
        return 0.0;
    }
    cov / (va.sqrt() * vb.sqrt())
}
