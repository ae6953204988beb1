//! DICECAST: High/Low dice outcome history and prediction engine.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod history;
pub mod signals;
pub mod strategy;
pub mod backtest;
pub mod stats;
pub mod engine;
pub mod feed;
pub mod storage;
