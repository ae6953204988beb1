//! Signal analyzers.
//!
//! Five independent heuristics, each mapping the recent window to a
//! vote on the next round. Analyzers are deterministic and may abstain;
//! every random element lives in the combiner.

pub mod cycle;
pub mod distribution;
pub mod heat;
pub mod pattern;
pub mod trend;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::history::HistoryStore;
use crate::types::{Classification, OutcomeRecord, SignalMethod, Vote};

/// One analyzer's vote, tagged with the method that cast it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalVote {
    pub method: SignalMethod,
    pub vote: Vote,
}

/// Run every analyzer over `window` (the tail of `history`).
pub fn evaluate_all(window: &[OutcomeRecord], history: &HistoryStore) -> Vec<SignalVote> {
    let votes: Vec<SignalVote> = SignalMethod::ALL
        .iter()
        .map(|&method| SignalVote {
            method,
            vote: evaluate(method, window, history),
        })
        .collect();

    debug!(
        window = window.len(),
        trend = %votes[0].vote,
        cycle = %votes[1].vote,
        pattern = %votes[2].vote,
        distribution = %votes[3].vote,
        heat = %votes[4].vote,
        "Signals evaluated"
    );

    votes
}

/// Run a single analyzer.
pub fn evaluate(method: SignalMethod, window: &[OutcomeRecord], history: &HistoryStore) -> Vote {
    match method {
        SignalMethod::Trend => trend::analyze(window),
        SignalMethod::Cycle => cycle::analyze(window),
        SignalMethod::Pattern => pattern::analyze(window, history),
        SignalMethod::Distribution => distribution::analyze(window),
        SignalMethod::Heat => heat::analyze(window),
    }
}

/// Count High records; Low is the remainder.
pub(crate) fn count_high<'a, I>(records: I) -> usize
where
    I: IntoIterator<Item = &'a OutcomeRecord>,
{
    records
        .into_iter()
        .filter(|r| r.classification == Classification::High)
        .count()
}
