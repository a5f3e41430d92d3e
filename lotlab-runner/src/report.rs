//! BacktestResult — the complete, serializable report for one run.

use serde::{Deserialize, Serialize};

use lotlab_core::domain::{ClosedTrade, ConfigHash, Timeframe};
use lotlab_core::engine::{EquityPoint, SymbolRun};

use crate::metrics::PerformanceMetrics;

/// Aggregate of trade log, equity curve, and derived metrics for one
/// symbol's run. Read-only once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestResult {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub initial_capital: f64,

    // ── Headline statistics ──
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate: f64,
    pub total_return: f64,
    pub total_return_percentage: f64,
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub profit_factor: f64,
    pub average_win: f64,
    pub average_loss: f64,

    // ── Full detail ──
    pub metrics: PerformanceMetrics,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,

    // ── Run accounting ──
    pub cancelled: bool,
    pub warmup_candles: usize,
    pub candles_seen: usize,
    pub candles_skipped: usize,
    pub signals_rejected: usize,
    pub config_hash: ConfigHash,
}

impl BacktestResult {
    /// Assemble the report from a raw run.
    pub fn from_run(run: SymbolRun, initial_capital: f64) -> Self {
        let metrics = PerformanceMetrics::compute(
            &run.equity_curve,
            &run.trades,
            initial_capital,
            run.timeframe,
        );
        let winning_trades = run.trades.iter().filter(|t| t.is_winner()).count();
        Self {
            symbol: run.symbol,
            timeframe: run.timeframe,
            initial_capital,
            total_trades: run.trades.len(),
            winning_trades,
            losing_trades: run.trades.len() - winning_trades,
            win_rate: metrics.win_rate,
            total_return: metrics.total_return,
            total_return_percentage: metrics.total_return_percentage,
            max_drawdown: metrics.max_drawdown,
            sharpe_ratio: metrics.sharpe_ratio,
            profit_factor: metrics.profit_factor,
            average_win: metrics.average_win,
            average_loss: metrics.average_loss,
            metrics,
            trades: run.trades,
            equity_curve: run.equity_curve,
            cancelled: run.cancelled,
            warmup_candles: run.warmup_candles,
            candles_seen: run.candles_seen,
            candles_skipped: run.candles_skipped,
            signals_rejected: run.signals_rejected,
            config_hash: run.config_hash,
        }
    }

    /// Realized P&L over the whole run.
    pub fn realized_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    /// Persist the full report as pretty-printed JSON.
    pub fn save_json(&self, path: &std::path::Path) -> anyhow::Result<()> {
        use anyhow::Context;
        let json = serde_json::to_string_pretty(self)
            .with_context(|| format!("serializing result for {}", self.symbol))?;
        std::fs::write(path, json)
            .with_context(|| format!("writing result to {}", path.display()))?;
        Ok(())
    }
}
