//! Cycle signal.
//!
//! Looks for short repeating classification sequences (length 2–4) by
//! comparing the newest `L` rounds against the `L` rounds before them,
//! and predicts whatever followed the matches. With no match it bets on
//! a reversal of the newest round.
//!
//! Matching is a linear scan per candidate length, O(window²) in the
//! worst case; the window is capped at 20 so this stays trivial.

use serde::{Deserialize, Serialize};

use crate::types::{Classification, OutcomeRecord, Vote};

/// Below this many rounds the signal abstains.
pub const MIN_WINDOW: usize = 4;
/// Candidate cycle lengths, shortest first.
pub const CYCLE_LENGTHS: [usize; 3] = [2, 3, 4];

/// A candidate cycle and what it predicts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleMatch {
    pub length: usize,
    pub next: Classification,
    /// Share of the majority follower among all followers, in percent.
    pub confidence: f64,
    pub occurrences: usize,
}

pub fn analyze(window: &[OutcomeRecord]) -> Vote {
    if window.len() < MIN_WINDOW {
        return Vote::Abstain;
    }

    let classes: Vec<Classification> = window.iter().map(|r| r.classification).collect();
    let n = classes.len();

    let candidates = CYCLE_LENGTHS
        .iter()
        .filter(|&&len| n >= len * 2)
        .filter_map(|&len| extract_cycle(&classes[n - len..], &classes[n - 2 * len..n - len]));

    match most_confident(candidates) {
        Some(found) => found.next.into(),
        None => classes[n - 1].opposite().into(),
    }
}

/// Find every occurrence of `sequence` inside `lookback` that has a
/// follower still inside `lookback`, and tally those followers.
pub fn extract_cycle(sequence: &[Classification], lookback: &[Classification]) -> Option<CycleMatch> {
    let length = sequence.len();
    if length == 0 || lookback.len() < length {
        return None;
    }

    let followers: Vec<Classification> = (0..=lookback.len() - length)
        .filter(|&i| &lookback[i..i + length] == sequence && i + length < lookback.len())
        .map(|i| lookback[i + length])
        .collect();

    if followers.is_empty() {
        return None;
    }

    let total = followers.len();
    let highs = followers.iter().filter(|c| **c == Classification::High).count();
    let next = if highs as f64 > total as f64 / 2.0 {
        Classification::High
    } else {
        Classification::Low
    };

    Some(CycleMatch {
        length,
        next,
        confidence: highs.max(total - highs) as f64 / total as f64 * 100.0,
        occurrences: total,
    })
}

/// Highest confidence wins; on a tie the later candidate replaces the earlier.
fn most_confident<I: IntoIterator<Item = CycleMatch>>(candidates: I) -> Option<CycleMatch> {
    candidates.into_iter().fold(None, |best, candidate| match best {
        Some(b) if b.confidence > candidate.confidence => Some(b),
        _ => Some(candidate),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::fixtures::from_pattern;
    use Classification::{High as H, Low as L};

    #[test]
    fn test_short_window_abstains() {
        assert_eq!(analyze(&from_pattern("HLH")), Vote::Abstain);
    }

    #[test]
    fn test_adjacent_halves_fall_back_to_reversal() {
        // The halves match for every length, but a half of exactly L
        // rounds never contains a follower, so the reversal fallback wins.
        assert_eq!(analyze(&from_pattern("HLHLHLHL")), Vote::High);
        assert_eq!(analyze(&from_pattern("LLLLLLLLLH")), Vote::Low);
    }

    #[test]
    fn test_extract_tallies_followers() {
        let found = extract_cycle(&[H, L], &[H, L, H, L, H]).unwrap();
        assert_eq!(found.length, 2);
        assert_eq!(found.next, H);
        assert_eq!(found.occurrences, 2);
        assert!((found.confidence - 100.0).abs() < 1e-10);
    }

    #[test]
    fn test_extract_split_followers_goes_low() {
        let found = extract_cycle(&[H, H], &[H, H, H, H, L]).unwrap();
        // Matches at 0, 1, 2 with followers H, H, L.
        assert_eq!(found.occurrences, 3);
        assert_eq!(found.next, H);

        let tied = extract_cycle(&[L], &[L, H, L, L]).unwrap();
        // Followers of L: H (i=0), L (i=2).
        assert_eq!(tied.next, L);
        assert!((tied.confidence - 50.0).abs() < 1e-10);
    }

    #[test]
    fn test_extract_lookback_of_exact_length() {
        assert!(extract_cycle(&[H, L], &[H, L]).is_none());
        assert!(extract_cycle(&[H, L], &[H]).is_none());
        assert!(extract_cycle(&[], &[H, L]).is_none());
    }

    #[test]
    fn test_most_confident_prefers_later_on_tie() {
        let make = |length, confidence| CycleMatch { length, next: H, confidence, occurrences: 1 };
        let best = most_confident(vec![make(2, 50.0), make(3, 100.0), make(4, 100.0)]).unwrap();
        assert_eq!(best.length, 4);
        let best = most_confident(vec![make(2, 100.0), make(3, 50.0)]).unwrap();
        assert_eq!(best.length, 2);
        assert!(most_confident(Vec::new()).is_none());
    }
}
