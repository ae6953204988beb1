//! Heat signal: cools an overheated side down, warms a cold one up.

use crate::signals::count_high;
use crate::types::{OutcomeRecord, Vote};

/// Trailing rounds considered.
pub const HEAT_SPAN: usize = 10;
/// Fewer trailing rounds than this and the signal abstains.
pub const MIN_SPAN: usize = 5;
pub const HOT_SHARE: f64 = 0.7;
pub const COLD_SHARE: f64 = 0.3;

pub fn analyze(window: &[OutcomeRecord]) -> Vote {
    let recent = &window[window.len().saturating_sub(HEAT_SPAN)..];
    if recent.len() < MIN_SPAN {
        return Vote::Abstain;
    }

    let high_share = count_high(recent) as f64 / recent.len() as f64;

    if high_share > HOT_SHARE {
        Vote::Low
    } else if high_share < COLD_SHARE {
        Vote::High
    } else {
        Vote::Abstain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::fixtures::from_pattern;

    #[test]
    fn test_hot_predicts_low() {
        // Only the last ten count: 8/10 High.
        let window = from_pattern("LLLLLLLLLLHHHHLHHHLH");
        assert_eq!(analyze(&window), Vote::Low);
    }

    #[test]
    fn test_cold_predicts_high() {
        let window = from_pattern("HHHHHHHHHHLLLLHLLLLL");
        assert_eq!(analyze(&window), Vote::High);
    }

    #[test]
    fn test_boundaries_abstain() {
        // Exactly 70% and exactly 30% are neither hot nor cold.
        assert_eq!(analyze(&from_pattern("HHHHHHHLLL")), Vote::Abstain);
        assert_eq!(analyze(&from_pattern("HHHLLLLLLL")), Vote::Abstain);
    }

    #[test]
    fn test_short_window_abstains() {
        assert_eq!(analyze(&from_pattern("HHHH")), Vote::Abstain);
        assert_eq!(analyze(&from_pattern("HHHHH")), Vote::Low);
    }
}
