//! LotLab Core — candle-driven strategy backtesting engine.
//!
//! This crate contains the heart of the simulator:
//! - Domain types (candles, lots, positions, signals, closed trades)
//! - Precomputed indicator engine with an explicit registry
//! - Strategy evaluators behind one trait, selected by a name-keyed factory
//! - Per-lot trailing-stop state machine
//! - The lot ledger: pyramiding limits and FIFO/LIFO exit matching
//! - The per-symbol backtest loop with warm-up gating and cancellation
//! - Injected feed and order-execution boundaries

pub mod config;
pub mod domain;
pub mod engine;
pub mod execution;
pub mod feed;
pub mod indicators;
pub mod strategy;
pub mod trailing;
