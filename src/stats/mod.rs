//! Read-only statistics over the stored history.

pub mod patterns;

use serde::{Deserialize, Serialize};

use crate::history::HistoryStore;
use crate::types::{percentage, round_dp, Classification, PredictionStats};

/// Number of dice combinations listed in a snapshot.
pub const TOP_COMBINATIONS: usize = 10;

/// Count, share and shape of one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassSummary {
    pub classification: Classification,
    pub count: usize,
    pub percentage: f64,
    pub average_sum: f64,
    pub longest_streak: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationCount {
    /// Sorted dice, e.g. `"3-3-4"`.
    pub key: String,
    pub count: u32,
}

/// Label of a sum bucket. Only 10 is a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SumLabel {
    High,
    Low,
    Tie,
}

impl SumLabel {
    pub fn for_sum(sum: u8) -> Self {
        match sum {
            s if s > 10 => SumLabel::High,
            s if s < 10 => SumLabel::Low,
            _ => SumLabel::Tie,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SumBucket {
    pub sum: u8,
    pub count: u32,
    pub percentage: f64,
    pub label: SumLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_rounds: usize,
    pub high: ClassSummary,
    pub low: ClassSummary,
    pub sum_distribution: Vec<SumBucket>,
    pub top_combinations: Vec<CombinationCount>,
    pub prediction_stats: PredictionStats,
}

pub struct StatsReporter;

impl StatsReporter {
    pub fn snapshot(history: &HistoryStore, prediction_stats: &PredictionStats) -> StatsSnapshot {
        StatsSnapshot {
            total_rounds: history.len(),
            high: Self::class_summary(history, Classification::High),
            low: Self::class_summary(history, Classification::Low),
            sum_distribution: Self::sum_buckets(history),
            top_combinations: Self::top_combinations(history, TOP_COMBINATIONS),
            prediction_stats: prediction_stats.clone(),
        }
    }

    pub fn class_summary(history: &HistoryStore, class: Classification) -> ClassSummary {
        let sums: Vec<u32> = history
            .iter()
            .filter(|r| r.classification == class)
            .map(|r| r.sum as u32)
            .collect();
        let average_sum = if sums.is_empty() {
            0.0
        } else {
            round_dp(sums.iter().sum::<u32>() as f64 / sums.len() as f64, 2)
        };

        ClassSummary {
            classification: class,
            count: sums.len(),
            percentage: percentage(sums.len(), history.len()),
            average_sum,
            longest_streak: Self::longest_streak(history, class),
        }
    }

    /// Longest consecutive stretch of `class` anywhere in the history.
    pub fn longest_streak(history: &HistoryStore, class: Classification) -> usize {
        let (mut longest, mut current) = (0, 0);
        for record in history.iter() {
            if record.classification == class {
                current += 1;
                longest = longest.max(current);
            } else {
                current = 0;
            }
        }
        longest
    }

    /// Non-empty sum buckets, most frequent first.
    pub fn sum_buckets(history: &HistoryStore) -> Vec<SumBucket> {
        let mut buckets: Vec<SumBucket> = history
            .sum_distribution()
            .into_iter()
            .filter(|&(_, count)| count > 0)
            .map(|(sum, count)| SumBucket {
                sum,
                count,
                percentage: percentage(count as usize, history.len()),
                label: SumLabel::for_sum(sum),
            })
            .collect();
        // Stable: equal counts stay in ascending sum order.
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
        buckets
    }

    /// The `n` most frequent combinations ever appended, count descending.
    pub fn top_combinations(history: &HistoryStore, n: usize) -> Vec<CombinationCount> {
        let mut combos: Vec<CombinationCount> = history
            .combination_counts()
            .iter()
            .map(|(key, &count)| CombinationCount {
                key: key.clone(),
                count,
            })
            .collect();
        combos.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.key.cmp(&b.key)));
        combos.truncate(n);
        combos
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
