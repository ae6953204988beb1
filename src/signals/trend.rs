//! Trend signal.
//!
//! Bets on reversal when one side dominates the window or has just
//! strung three rounds together; otherwise follows the majority.

use crate::signals::count_high;
use crate::types::{Classification, OutcomeRecord, Vote};

/// Share of the window above which a side is considered overextended.
pub const DOMINANCE_SHARE: f64 = 0.6;
/// How many trailing rounds are checked for a short run.
pub const TAIL_LEN: usize = 5;
/// Length of the trailing run that triggers a reversal.
pub const RUN_LEN: usize = 3;

pub fn analyze(window: &[OutcomeRecord]) -> Vote {
    if window.is_empty() {
        return Vote::Abstain;
    }

    let n = window.len() as f64;
    let highs = count_high(window);
    let lows = window.len() - highs;

    if highs as f64 / n > DOMINANCE_SHARE {
        return Vote::Low;
    }
    if lows as f64 / n > DOMINANCE_SHARE {
        return Vote::High;
    }

    let tail = &window[window.len().saturating_sub(TAIL_LEN)..];
    for class in Classification::ALL {
        if ends_with_run(tail, class, RUN_LEN) {
            return class.opposite().into();
        }
    }

    Classification::majority(highs, lows).into()
}

/// Whether the last `count` records all carry `class`.
fn ends_with_run(records: &[OutcomeRecord], class: Classification, count: usize) -> bool {
    records.len() >= count
        && records[records.len() - count..]
            .iter()
            .all(|r| r.classification == class)
}
