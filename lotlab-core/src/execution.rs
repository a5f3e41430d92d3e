//! Order execution boundary.
//!
//! In backtest mode every order fills at the requested price. The trait is
//! the contract a live execution provider must honor, so the engine can be
//! pointed at a real broker without changing the candle loop.

use thiserror::Error;

use crate::domain::Direction;

#[derive(Debug, Clone, Error)]
pub enum ExecutionError {
    #[error("order rejected: {0}")]
    Rejected(String),
}

/// Result of a filled order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillResult {
    pub price: f64,
    pub quantity: f64,
}

pub trait OrderExecutor: Send + Sync {
    fn place_order(
        &self,
        direction: Direction,
        quantity: f64,
        price: f64,
    ) -> Result<FillResult, ExecutionError>;
}

/// Backtest executor: always fills at the signal price.
#[derive(Debug, Clone, Copy, Default)]
pub struct BacktestExecutor;

impl OrderExecutor for BacktestExecutor {
    fn place_order(
        &self,
        _direction: Direction,
        quantity: f64,
        price: f64,
    ) -> Result<FillResult, ExecutionError> {
        Ok(FillResult { price, quantity })
    }
}
