//! Historical replay: combined backtests, confidence calibration, and
//! single-strategy comparison.

pub mod calibration;
pub mod runner;
pub mod strategy;
