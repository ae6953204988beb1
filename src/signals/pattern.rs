//! Dice-shape recall.
//!
//! Finds earlier rounds that rolled the same (sorted) dice as the newest
//! round and predicts the majority of what came right after them. Scans
//! the whole history, not just the window: O(history) per call.

use crate::history::HistoryStore;
use crate::types::{Classification, OutcomeRecord, Vote};

/// Below this many rounds in the window the signal abstains.
pub const MIN_WINDOW: usize = 5;

pub fn analyze(window: &[OutcomeRecord], history: &HistoryStore) -> Vote {
    if window.len() < MIN_WINDOW {
        return Vote::Abstain;
    }
    let Some(latest) = window.last() else {
        return Vote::Abstain;
    };

    let followers = followers_of(&latest.pattern_key, history);
    if followers.is_empty() {
        return Vote::Abstain;
    }

    let highs = followers.iter().filter(|c| **c == Classification::High).count();
    Classification::majority(highs, followers.len() - highs).into()
}

/// Classifications of the rounds right after each stored round with
/// `pattern_key`, excluding the newest round itself.
pub fn followers_of(pattern_key: &str, history: &HistoryStore) -> Vec<Classification> {
    let newest = history.len().saturating_sub(1);
    history
        .iter()
        .enumerate()
        .filter(|(idx, r)| *idx != newest && r.pattern_key == pattern_key)
        .filter_map(|(idx, _)| history.get(idx + 1))
        .map(|r| r.classification)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::fixtures::store_from;
    use crate::types::{Dice, Outcome};

    fn rec(id: u64, d: (u8, u8, u8)) -> OutcomeRecord {
        OutcomeRecord::from_outcome(Outcome::now(id, Dice::new(d.0, d.1, d.2).unwrap()))
    }

    #[test]
    fn test_follows_matching_shapes() {
        // (3,3,4) appears at 0 and 3 (as 4,3,3); both followed by High.
        let records = vec![
            rec(0, (3, 3, 4)),
            rec(1, (6, 6, 6)),
            rec(2, (1, 1, 2)),
            rec(3, (4, 3, 3)),
            rec(4, (5, 5, 5)),
            rec(5, (3, 4, 3)),
        ];
        let store = store_from(&records);
        assert_eq!(
            followers_of(&records[5].pattern_key, &store),
            vec![Classification::High, Classification::High]
        );
        assert_eq!(analyze(&records, &store), Vote::High);
    }

    #[test]
    fn test_no_prior_shape_abstains() {
        let records = vec![
            rec(0, (1, 1, 1)),
            rec(1, (2, 2, 2)),
            rec(2, (3, 3, 3)),
            rec(3, (4, 4, 4)),
            rec(4, (5, 5, 5)),
        ];
        let store = store_from(&records);
        assert_eq!(analyze(&records, &store), Vote::Abstain);
    }

    #[test]
    fn test_tie_goes_low() {
        let records = vec![
            rec(0, (1, 2, 3)),
            rec(1, (6, 6, 6)),
            rec(2, (1, 2, 3)),
            rec(3, (1, 1, 1)),
            rec(4, (1, 2, 3)),
        ];
        let store = store_from(&records);
        assert_eq!(analyze(&records, &store), Vote::Low);
    }

    #[test]
    fn test_scans_beyond_window() {
        let mut records = vec![rec(0, (2, 2, 6)), rec(1, (6, 5, 6))];
        for id in 2..30 {
            records.push(rec(id, (1, 1, 1)));
        }
        records.push(rec(30, (6, 2, 2)));
        let store = store_from(&records);
        let window = store.window(20);
        assert_eq!(analyze(&window, &store), Vote::High);
    }

    #[test]
    fn test_short_window_abstains() {
        let records = vec![rec(0, (1, 2, 3)), rec(1, (1, 2, 3))];
        let store = store_from(&records);
        assert_eq!(analyze(&records, &store), Vote::Abstain);
    }
}
