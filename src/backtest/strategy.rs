//! Single-strategy comparison.
//!
//! Scores simplified, never-abstaining versions of each heuristic on
//! their own over a sliding 20-round window, so they can be compared
//! against each other and against the weighted combination.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::history::HistoryStore;
use crate::signals::count_high;
use crate::signals::distribution::EXPECTED_SUM;
use crate::types::{percentage, Classification, OutcomeRecord, SignalMethod};

/// Sliding window length for standalone replays.
pub const STRATEGY_WINDOW: usize = 20;
/// N-gram length used by the standalone pattern matcher.
const NGRAM: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StandaloneStrategy {
    TrendFollowing,
    CycleReversal,
    PatternMatching,
    MeanReversion,
    HeatAnalysis,
}

impl StandaloneStrategy {
    pub const ALL: [StandaloneStrategy; 5] = [
        StandaloneStrategy::TrendFollowing,
        StandaloneStrategy::CycleReversal,
        StandaloneStrategy::PatternMatching,
        StandaloneStrategy::MeanReversion,
        StandaloneStrategy::HeatAnalysis,
    ];

    /// The combiner signal this strategy simplifies.
    pub fn method(&self) -> SignalMethod {
        match self {
            StandaloneStrategy::TrendFollowing => SignalMethod::Trend,
            StandaloneStrategy::CycleReversal => SignalMethod::Cycle,
            StandaloneStrategy::PatternMatching => SignalMethod::Pattern,
            StandaloneStrategy::MeanReversion => SignalMethod::Distribution,
            StandaloneStrategy::HeatAnalysis => SignalMethod::Heat,
        }
    }

    pub fn weight(&self) -> f64 {
        self.method().weight()
    }

    /// Predict the round after `window`. Always answers.
    pub fn predict(&self, window: &[OutcomeRecord]) -> Classification {
        match self {
            StandaloneStrategy::TrendFollowing => {
                let highs = count_high(window);
                if highs as f64 > window.len() as f64 / 2.0 {
                    Classification::High
                } else {
                    Classification::Low
                }
            }
            StandaloneStrategy::CycleReversal => window
                .last()
                .map(|r| r.classification.opposite())
                .unwrap_or(Classification::High),
            StandaloneStrategy::PatternMatching => ngram_follower(window),
            StandaloneStrategy::MeanReversion => {
                let mean = window.iter().map(|r| r.sum as f64).sum::<f64>() / window.len().max(1) as f64;
                if mean > EXPECTED_SUM {
                    Classification::Low
                } else {
                    Classification::High
                }
            }
            StandaloneStrategy::HeatAnalysis => {
                let recent = &window[window.len().saturating_sub(10)..];
                let highs = count_high(recent);
                if highs > 7 {
                    Classification::Low
                } else {
                    Classification::High
                }
            }
        }
    }
}

impl fmt::Display for StandaloneStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StandaloneStrategy::TrendFollowing => "trend_following",
            StandaloneStrategy::CycleReversal => "cycle_reversal",
            StandaloneStrategy::PatternMatching => "pattern_matching",
            StandaloneStrategy::MeanReversion => "mean_reversion",
            StandaloneStrategy::HeatAnalysis => "heat_analysis",
        };
        f.write_str(name)
    }
}

/// Majority follower of earlier occurrences of the trailing 3-gram.
/// Defaults to High when the window is short or the 3-gram is new.
fn ngram_follower(window: &[OutcomeRecord]) -> Classification {
    if window.len() < 5 {
        return Classification::High;
    }
    let classes: Vec<Classification> = window.iter().map(|r| r.classification).collect();
    let n = classes.len();
    let tail = &classes[n - NGRAM..];

    let followers: Vec<Classification> = (0..n - NGRAM)
        .filter(|&i| &classes[i..i + NGRAM] == tail)
        .map(|i| classes[i + NGRAM])
        .collect();

    if followers.is_empty() {
        return Classification::High;
    }
    let highs = followers.iter().filter(|c| **c == Classification::High).count();
    if highs as f64 > followers.len() as f64 / 2.0 {
        Classification::High
    } else {
        Classification::Low
    }
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyResult {
    pub strategy: StandaloneStrategy,
    pub weight: f64,
    pub total: usize,
    pub correct: usize,
    /// Percent, two decimals.
    pub accuracy: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyComparison {
    pub results: Vec<StrategyResult>,
    /// Highest accuracy; on a tie the strategy listed last wins.
    pub best: Option<StandaloneStrategy>,
    /// Accuracy of the weighted combination from the latest backtest.
    pub combined_accuracy: f64,
}

/// Replay one strategy: predict round `i` from rounds `i-20..i`.
pub fn score(strategy: StandaloneStrategy, history: &HistoryStore) -> StrategyResult {
    let records = history.records();
    let (mut total, mut correct) = (0, 0);

    if records.len() >= STRATEGY_WINDOW {
        for i in STRATEGY_WINDOW..records.len() {
            let predicted = strategy.predict(&records[i - STRATEGY_WINDOW..i]);
            total += 1;
            if predicted == records[i].classification {
                correct += 1;
            }
        }
    }

    StrategyResult {
        strategy,
        weight: strategy.weight(),
        total,
        correct,
        accuracy: percentage(correct, total),
    }
}

/// Score every standalone strategy over the full history.
pub fn compare(history: &HistoryStore, combined_accuracy: f64) -> StrategyComparison {
    let results: Vec<StrategyResult> = StandaloneStrategy::ALL
        .iter()
        .map(|&s| score(s, history))
        .collect();

    let best = pick_best(&results);

    StrategyComparison {
        results,
        best,
        combined_accuracy,
    }
}

/// Most accurate strategy, later entries winning ties. `None` when
/// nothing was scored.
pub fn pick_best(results: &[StrategyResult]) -> Option<StandaloneStrategy> {
    results
        .iter()
        .fold(None::<&StrategyResult>, |best, r| match best {
            Some(b) if b.accuracy > r.accuracy => Some(b),
            _ => Some(r),
        })
        .filter(|r| r.total > 0)
        .map(|r| r.strategy)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::fixtures::{from_pattern, store_from};

    #[test]
    fn test_short_history_scores_nothing() {
        let store = store_from(&from_pattern("HLHLHLHLHL"));
        let result = score(StandaloneStrategy::TrendFollowing, &store);
        assert_eq!(result.total, 0);
        assert_eq!(result.accuracy, 0.0);
        assert!(compare(&store, 0.0).best.is_none());
    }

    #[test]
    fn test_cycle_reversal_on_alternating_history() {
        let store = store_from(&from_pattern(&"HL".repeat(20)));
        let result = score(StandaloneStrategy::CycleReversal, &store);
        assert_eq!(result.total, 20);
        assert_eq!(result.correct, 20);
        assert_eq!(result.accuracy, 100.0);
    }

    #[test]
    fn test_compare_picks_best() {
        let store = store_from(&from_pattern(&"HL".repeat(20)));
        let comparison = compare(&store, 55.0);
        assert_eq!(comparison.results.len(), 5);
        // Cycle reversal and pattern matching both call every round here.
        let perfect: Vec<StandaloneStrategy> = comparison
            .results
            .iter()
            .filter(|r| r.accuracy == 100.0)
            .map(|r| r.strategy)
            .collect();
        assert_eq!(
            perfect,
            vec![StandaloneStrategy::CycleReversal, StandaloneStrategy::PatternMatching]
        );
        assert_eq!(comparison.best, Some(StandaloneStrategy::PatternMatching));
        assert_eq!(comparison.combined_accuracy, 55.0);
    }

    fn result(strategy: StandaloneStrategy, total: usize, correct: usize) -> StrategyResult {
        StrategyResult {
            strategy,
            weight: strategy.weight(),
            total,
            correct,
            accuracy: percentage(correct, total),
        }
    }

    #[test]
    fn test_best_prefers_later_strategy_on_tie() {
        let results = vec![
            result(StandaloneStrategy::TrendFollowing, 40, 22),
            result(StandaloneStrategy::CycleReversal, 40, 30),
            result(StandaloneStrategy::PatternMatching, 40, 18),
            result(StandaloneStrategy::MeanReversion, 40, 30),
            result(StandaloneStrategy::HeatAnalysis, 40, 20),
        ];
        assert_eq!(pick_best(&results), Some(StandaloneStrategy::MeanReversion));

        let strict = vec![
            result(StandaloneStrategy::TrendFollowing, 40, 31),
            result(StandaloneStrategy::CycleReversal, 40, 30),
        ];
        assert_eq!(pick_best(&strict), Some(StandaloneStrategy::TrendFollowing));
    }

    #[test]
    fn test_best_needs_scored_rounds() {
        let results: Vec<StrategyResult> =
            StandaloneStrategy::ALL.iter().map(|&s| result(s, 0, 0)).collect();
        assert_eq!(pick_best(&results), None);
        assert_eq!(pick_best(&[]), None);
    }

    #[test]
    fn test_ngram_follower() {
        // Trailing HLH appeared once before, followed by L.
        assert_eq!(ngram_follower(&from_pattern("HLHLLLHLH")), Classification::Low);
        assert_eq!(ngram_follower(&from_pattern("HHH")), Classification::High);
        assert_eq!(ngram_follower(&from_pattern("LLLLLH")), Classification::High);
    }

    #[test]
    fn test_heat_defaults_high() {
        let window = from_pattern("HHHHHLLLLL");
        assert_eq!(StandaloneStrategy::HeatAnalysis.predict(&window), Classification::High);
        let hot = from_pattern("HHHHHHHHLL");
        assert_eq!(StandaloneStrategy::HeatAnalysis.predict(&hot), Classification::Low);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(StandaloneStrategy::MeanReversion.to_string(), "mean_reversion");
        assert_eq!(StandaloneStrategy::TrendFollowing.weight(), 0.35);
    }
}
