//! Distribution (mean-reversion) signal.
//!
//! The expected sum of three fair dice is 10.5; a window that has run
//! hot or cold is expected to drift back.

use crate::types::{OutcomeRecord, Vote};

/// Expected value of the sum of three fair dice.
pub const EXPECTED_SUM: f64 = 10.5;

pub fn analyze(window: &[OutcomeRecord]) -> Vote {
    if window.is_empty() {
        return Vote::Abstain;
    }

    let mean = window.iter().map(|r| r.sum as f64).sum::<f64>() / window.len() as f64;

    if mean > EXPECTED_SUM {
        Vote::Low
    } else if mean < EXPECTED_SUM {
        Vote::High
    } else {
        Vote::Abstain
    }
}
