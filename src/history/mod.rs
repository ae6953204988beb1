//! Bounded outcome history.
//!
//! Stores the most recent rounds in arrival order and keeps two derived
//! aggregates alongside: a per-sum histogram that tracks the stored
//! window exactly, and a dice-combination tally that only ever grows.

pub mod sequence;

use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

use crate::types::{Outcome, OutcomeRecord};

/// Default cap on stored rounds.
pub const MAX_HISTORY: usize = 500;

/// Highest possible sum of three dice (index bound for the histogram).
const MAX_SUM: usize = 18;

// ---------------------------------------------------------------------------
// HistoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HistoryStore {
    records: VecDeque<OutcomeRecord>,
    capacity: usize,
    /// `sum_distribution[v]` == number of stored records with sum `v`.
    sum_distribution: [u32; MAX_SUM + 1],
    /// Appends per sorted-dice key. Not decremented on eviction.
    combination_counts: BTreeMap<String, u32>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(MAX_HISTORY)
    }
}

impl HistoryStore {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity + 1),
            capacity,
            sum_distribution: [0; MAX_SUM + 1],
            combination_counts: BTreeMap::new(),
        }
    }

    /// Build a store by appending `outcomes` in order.
    pub fn replay<I: IntoIterator<Item = Outcome>>(capacity: usize, outcomes: I) -> Self {
        let mut store = Self::new(capacity);
        for outcome in outcomes {
            store.append(outcome);
        }
        store
    }

    /// Normalise and store one round, evicting the oldest record when the
    /// cap is exceeded. Returns the stored record.
    pub fn append(&mut self, outcome: Outcome) -> OutcomeRecord {
        let record = OutcomeRecord::from_outcome(outcome);

        self.records.push_back(record.clone());
        self.sum_distribution[record.sum as usize] += 1;

        if self.records.len() > self.capacity {
            if let Some(evicted) = self.records.pop_front() {
                let slot = &mut self.sum_distribution[evicted.sum as usize];
                *slot = slot.saturating_sub(1);
                debug!(round_id = evicted.round_id, sum = evicted.sum, "Evicted oldest round");
            }
        }

        *self
            .combination_counts
            .entry(record.dice.combination_key())
            .or_insert(0) += 1;

        record
    }

    /// The last `n` records in chronological order (fewer if history is shorter).
    pub fn window(&self, n: usize) -> Vec<OutcomeRecord> {
        self.tail(n).cloned().collect()
    }

    /// Iterator over the last `n` records, oldest first.
    pub fn tail(&self, n: usize) -> impl DoubleEndedIterator<Item = &OutcomeRecord> {
        self.records.range(self.records.len().saturating_sub(n)..)
    }

    /// Oldest first; `.rev()` walks back from the newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &OutcomeRecord> {
        self.records.iter()
    }

    /// All stored records, oldest first.
    pub fn records(&self) -> Vec<OutcomeRecord> {
        self.records.iter().cloned().collect()
    }

    pub fn get(&self, index: usize) -> Option<&OutcomeRecord> {
        self.records.get(index)
    }

    pub fn last(&self) -> Option<&OutcomeRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored records with the given sum (0 outside 3..=18).
    pub fn sum_count(&self, sum: u8) -> u32 {
        self.sum_distribution.get(sum as usize).copied().unwrap_or(0)
    }

    /// `(sum, count)` for every possible sum 3..=18, including zeros.
    pub fn sum_distribution(&self) -> Vec<(u8, u32)> {
        (3..=MAX_SUM as u8).map(|s| (s, self.sum_count(s))).collect()
    }

    /// Lifetime append counts per sorted-dice key.
    pub fn combination_counts(&self) -> &BTreeMap<String, u32> {
        &self.combination_counts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
