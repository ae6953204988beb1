//! Prediction pipeline: window selection feeding the signal vote.

pub mod combiner;
pub mod random;

use tracing::debug;

use crate::config::EngineConfig;
use crate::history::HistoryStore;
use crate::signals::{self, SignalVote};
use crate::types::Prediction;
use combiner::{AbstainPolicy, PredictionCombiner};
use random::RandomSource;

/// Default number of trailing rounds handed to the analyzers.
pub const WINDOW_SIZE: usize = 20;
/// Below this many rounds every prediction is a coin flip.
pub const MIN_HISTORY: usize = 10;

// ---------------------------------------------------------------------------
// Predictor
// ---------------------------------------------------------------------------

/// Pipelines window selection → signal analyzers → weighted combiner.
///
/// Stateless apart from its settings: the same history always yields the
/// same votes, and only the combiner's draws from `rng` vary.
#[derive(Debug, Clone)]
pub struct Predictor {
    window_size: usize,
    min_history: usize,
    combiner: PredictionCombiner,
}

impl Default for Predictor {
    fn default() -> Self {
        Self::new(WINDOW_SIZE, MIN_HISTORY, AbstainPolicy::default())
    }
}

impl Predictor {
    pub fn new(window_size: usize, min_history: usize, policy: AbstainPolicy) -> Self {
        Self {
            window_size: window_size.max(1),
            min_history,
            combiner: PredictionCombiner::new(policy),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.window_size, config.min_history, config.abstain_policy)
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn min_history(&self) -> usize {
        self.min_history
    }

    /// Analyzer votes for the current history, or `None` while the history
    /// is too short for analysis.
    pub fn signals(&self, history: &HistoryStore) -> Option<Vec<SignalVote>> {
        if history.len() < self.min_history {
            return None;
        }
        let window = history.window(self.window_size);
        Some(signals::evaluate_all(&window, history))
    }

    /// Predict the next round. Never fails; degrades to a coin flip.
    pub fn predict(&self, history: &HistoryStore, rng: &mut dyn RandomSource) -> Prediction {
        match self.signals(history) {
            Some(votes) => self.combiner.combine(&votes, rng),
            None => {
                debug!(
                    rounds = history.len(),
                    required = self.min_history,
                    "History too short for analysis; coin flip"
                );
                PredictionCombiner::fallback(Vec::new(), rng)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
