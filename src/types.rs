//! Shared types for the DICECAST engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that history, signal, strategy,
//! and backtest modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Smallest legal die face.
pub const MIN_FACE: u8 = 1;
/// Largest legal die face.
pub const MAX_FACE: u8 = 6;
/// Sums strictly above this value classify as High.
pub const HIGH_THRESHOLD: u8 = 10;
/// Length of the truncated hex digest used as a pattern key.
pub const PATTERN_KEY_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Binary label derived from the dice sum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Classification {
    High,
    Low,
}

impl Classification {
    /// Both classifications (useful for iteration).
    pub const ALL: [Classification; 2] = [Classification::High, Classification::Low];

    /// Classify a dice sum. Only sums above 10 are High; 10 itself is Low.
    pub fn from_sum(sum: u8) -> Self {
        if sum > HIGH_THRESHOLD {
            Classification::High
        } else {
            Classification::Low
        }
    }

    /// The opposite classification.
    pub fn opposite(&self) -> Self {
        match self {
            Classification::High => Classification::Low,
            Classification::Low => Classification::High,
        }
    }

    /// Majority of two counts. A tie resolves to Low.
    pub fn majority(highs: usize, lows: usize) -> Self {
        if highs > lows {
            Classification::High
        } else {
            Classification::Low
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::High => write!(f, "HIGH"),
            Classification::Low => write!(f, "LOW"),
        }
    }
}

// ---------------------------------------------------------------------------
// Dice
// ---------------------------------------------------------------------------

/// Three validated dice faces, in the order they were observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[u8; 3]", into = "[u8; 3]")]
pub struct Dice([u8; 3]);

impl Dice {
    /// Validate three faces. Every face must lie in 1..=6.
    pub fn new(d1: u8, d2: u8, d3: u8) -> Result<Self, EngineError> {
        let faces = [d1, d2, d3];
        if let Some(bad) = faces.iter().find(|f| !(MIN_FACE..=MAX_FACE).contains(*f)) {
            return Err(EngineError::InvalidInput(format!(
                "die face {bad} outside {MIN_FACE}..={MAX_FACE} in {d1}-{d2}-{d3}"
            )));
        }
        Ok(Self(faces))
    }

    pub fn faces(&self) -> [u8; 3] {
        self.0
    }

    pub fn sum(&self) -> u8 {
        self.0.iter().sum()
    }

    /// Faces in ascending order.
    pub fn sorted(&self) -> [u8; 3] {
        let mut faces = self.0;
        faces.sort_unstable();
        faces
    }

    /// Order-independent combination key, e.g. `"3-3-4"`.
    pub fn combination_key(&self) -> String {
        let [a, b, c] = self.sorted();
        format!("{a}-{b}-{c}")
    }

    /// Truncated SHA-256 fingerprint of the sorted faces.
    pub fn pattern_key(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.combination_key().as_bytes());
        let digest = hex::encode(hasher.finalize());
        digest[..PATTERN_KEY_LEN].to_string()
    }
}

impl TryFrom<[u8; 3]> for Dice {
    type Error = EngineError;

    fn try_from(faces: [u8; 3]) -> Result<Self, Self::Error> {
        Dice::new(faces[0], faces[1], faces[2])
    }
}

impl From<Dice> for [u8; 3] {
    fn from(dice: Dice) -> Self {
        dice.0
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c] = self.0;
        write!(f, "{a}-{b}-{c}")
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A resolved round as reported by the feed, before normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub round_id: u64,
    pub dice: Dice,
    pub observed_at: DateTime<Utc>,
}

impl Outcome {
    /// An outcome observed right now.
    pub fn now(round_id: u64, dice: Dice) -> Self {
        Self {
            round_id,
            dice,
            observed_at: Utc::now(),
        }
    }
}

/// Normalised representation of one observed round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub round_id: u64,
    pub dice: Dice,
    /// d1 + d2 + d3, always in 3..=18.
    pub sum: u8,
    pub classification: Classification,
    pub observed_at: DateTime<Utc>,
    /// Fingerprint of the sorted dice; equal for every permutation.
    pub pattern_key: String,
}

impl OutcomeRecord {
    pub fn from_outcome(outcome: Outcome) -> Self {
        let sum = outcome.dice.sum();
        Self {
            round_id: outcome.round_id,
            dice: outcome.dice,
            sum,
            classification: Classification::from_sum(sum),
            observed_at: outcome.observed_at,
            pattern_key: outcome.dice.pattern_key(),
        }
    }

    /// Strip derived fields, e.g. to replay this round into a fresh store.
    pub fn to_outcome(&self) -> Outcome {
        Outcome {
            round_id: self.round_id,
            dice: self.dice,
            observed_at: self.observed_at,
        }
    }
}

impl fmt::Display for OutcomeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} = {} ({}) [{}]",
            self.round_id, self.dice, self.sum, self.classification, self.pattern_key,
        )
    }
}

/// Three consecutive rounds sharing one classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceRun {
    /// Round id of the first of the three anchor records.
    pub start_round_id: u64,
    pub length: usize,
    pub detected_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Signals and predictions
// ---------------------------------------------------------------------------

/// A single analyzer's opinion about the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vote {
    High,
    Low,
    /// Not enough supporting data to hold an opinion.
    Abstain,
}

impl Vote {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            Vote::High => Some(Classification::High),
            Vote::Low => Some(Classification::Low),
            Vote::Abstain => None,
        }
    }

    pub fn is_abstain(&self) -> bool {
        matches!(self, Vote::Abstain)
    }
}

impl From<Classification> for Vote {
    fn from(c: Classification) -> Self {
        match c {
            Classification::High => Vote::High,
            Classification::Low => Vote::Low,
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vote::High => write!(f, "HIGH"),
            Vote::Low => write!(f, "LOW"),
            Vote::Abstain => write!(f, "ABSTAIN"),
        }
    }
}

/// The five heuristics that vote on the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMethod {
    Trend,
    Cycle,
    Pattern,
    Distribution,
    Heat,
}

impl SignalMethod {
    /// All methods in evaluation order.
    pub const ALL: [SignalMethod; 5] = [
        SignalMethod::Trend,
        SignalMethod::Cycle,
        SignalMethod::Pattern,
        SignalMethod::Distribution,
        SignalMethod::Heat,
    ];

    /// Fixed consensus weight. The five weights sum to 1.0.
    pub fn weight(&self) -> f64 {
        match self {
            SignalMethod::Trend => 0.35,
            SignalMethod::Cycle => 0.25,
            SignalMethod::Pattern => 0.20,
            SignalMethod::Distribution => 0.15,
            SignalMethod::Heat => 0.05,
        }
    }
}

impl fmt::Display for SignalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalMethod::Trend => write!(f, "trend"),
            SignalMethod::Cycle => write!(f, "cycle"),
            SignalMethod::Pattern => write!(f, "pattern"),
            SignalMethod::Distribution => write!(f, "distribution"),
            SignalMethod::Heat => write!(f, "heat"),
        }
    }
}

/// One row of a prediction's per-analyzer breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteBreakdown {
    pub method: SignalMethod,
    pub vote: Vote,
    pub weight: f64,
    /// Side the weight was credited to; differs from `vote` only when an
    /// abstention was resolved at random.
    pub resolved: Option<Classification>,
}

/// Adjusted bucket scores after perturbation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Scores {
    pub high: f64,
    pub low: f64,
}

/// The combiner's final answer for the next round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub classification: Classification,
    /// Vote margin mapped into [55, 95]; not a calibrated probability.
    pub confidence: f64,
    pub breakdown: Vec<VoteBreakdown>,
    pub scores: Scores,
    /// True when the result is a coin flip (too little history or no votes).
    pub fallback: bool,
    pub generated_at: DateTime<Utc>,
}

impl Prediction {
    /// The raw analyzer votes, in evaluation order.
    pub fn votes(&self) -> Vec<(SignalMethod, Vote)> {
        self.breakdown.iter().map(|b| (b.method, b.vote)).collect()
    }
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} @ {:.1}% (high {:.3} | low {:.3}){}",
            self.classification,
            self.confidence,
            self.scores.high,
            self.scores.low,
            if self.fallback { " [fallback]" } else { "" },
        )
    }
}

// ---------------------------------------------------------------------------
// Prediction accounting
// ---------------------------------------------------------------------------

/// Win/lose streak counters over a sequence of scored predictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakStats {
    pub current_win: u32,
    pub max_win: u32,
    pub current_lose: u32,
    pub max_lose: u32,
}

impl StreakStats {
    /// Fold one scored prediction into the counters.
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.current_win += 1;
            self.current_lose = 0;
            self.max_win = self.max_win.max(self.current_win);
        } else {
            self.current_lose += 1;
            self.current_win = 0;
            self.max_lose = self.max_lose.max(self.current_lose);
        }
    }

    /// Streaks recomputed from scratch over an ordered sequence.
    pub fn from_results<I: IntoIterator<Item = bool>>(results: I) -> Self {
        let mut streaks = Self::default();
        for correct in results {
            streaks.record(correct);
        }
        streaks
    }
}

/// Engine-wide prediction accounting.
///
/// Written by two independent paths: the live comparison updates
/// `streaks` once per resolved round, while every backtest adds to the
/// totals, replaces `accuracy`, and overwrites `streaks` wholesale.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PredictionStats {
    pub total_predictions: u64,
    pub correct_predictions: u64,
    pub wrong_predictions: u64,
    /// Percentage from the most recent backtest.
    pub accuracy: f64,
    pub streaks: StreakStats,
}

/// Result of comparing a cached prediction with the resolved round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionCheck {
    pub round_id: u64,
    pub predicted: Classification,
    pub actual: Classification,
    pub correct: bool,
    pub confidence: f64,
    pub checked_at: DateTime<Utc>,
}

impl fmt::Display for PredictionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} predicted {} @ {:.1}%, actual {} ({})",
            self.round_id,
            self.predicted,
            self.confidence,
            self.actual,
            if self.correct { "HIT" } else { "MISS" },
        )
    }
}

// ---------------------------------------------------------------------------
// Numeric helpers
// ---------------------------------------------------------------------------

/// Round to `dp` decimal places.
pub fn round_dp(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}

/// `part / whole` as a percentage with two decimals; 0 for an empty whole.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_dp(part as f64 / whole as f64 * 100.0, 2)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for DICECAST.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Insufficient data: need {required} rounds, have {available}")]
    InsufficientData { required: usize, available: usize },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- Classification tests --

    #[test]
    fn test_classification_boundary() {
        assert_eq!(Classification::from_sum(3), Classification::Low);
        assert_eq!(Classification::from_sum(10), Classification::Low);
        assert_eq!(Classification::from_sum(11), Classification::High);
        assert_eq!(Classification::from_sum(18), Classification::High);
    }

    #[test]
    fn test_classification_opposite() {
        assert_eq!(Classification::High.opposite(), Classification::Low);
        assert_eq!(Classification::Low.opposite(), Classification::High);
    }

    #[test]
    fn test_majority_tie_is_low() {
        assert_eq!(Classification::majority(3, 3), Classification::Low);
        assert_eq!(Classification::majority(4, 3), Classification::High);
        assert_eq!(Classification::majority(0, 0), Classification::Low);
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(format!("{}", Classification::High), "HIGH");
        assert_eq!(format!("{}", Classification::Low), "LOW");
    }

    // -- Dice tests --

    #[test]
    fn test_dice_rejects_out_of_range() {
        assert!(matches!(Dice::new(0, 3, 4), Err(EngineError::InvalidInput(_))));
        assert!(matches!(Dice::new(1, 7, 4), Err(EngineError::InvalidInput(_))));
        assert!(Dice::new(1, 6, 3).is_ok());
    }

    #[test]
    fn test_pattern_key_is_order_independent() {
        let a = Dice::new(3, 3, 4).unwrap();
        let b = Dice::new(4, 3, 3).unwrap();
        let c = Dice::new(3, 4, 3).unwrap();
        assert_eq!(a.pattern_key(), b.pattern_key());
        assert_eq!(a.pattern_key(), c.pattern_key());
        assert_eq!(a.pattern_key().len(), PATTERN_KEY_LEN);
    }

    #[test]
    fn test_pattern_key_distinguishes_shapes() {
        let a = Dice::new(3, 3, 4).unwrap();
        let b = Dice::new(3, 4, 4).unwrap();
        assert_ne!(a.pattern_key(), b.pattern_key());
    }

    #[test]
    fn test_combination_key_sorted() {
        let dice = Dice::new(6, 1, 4).unwrap();
        assert_eq!(dice.combination_key(), "1-4-6");
        assert_eq!(format!("{dice}"), "6-1-4");
    }

    #[test]
    fn test_dice_deserialize_validates() {
        let ok: Dice = serde_json::from_str("[2,5,6]").unwrap();
        assert_eq!(ok.sum(), 13);
        assert!(serde_json::from_str::<Dice>("[2,5,9]").is_err());
    }

    // -- OutcomeRecord tests --

    #[test]
    fn test_record_derives_fields() {
        let dice = Dice::new(5, 5, 1).unwrap();
        let record = OutcomeRecord::from_outcome(Outcome::now(42, dice));
        assert_eq!(record.sum, 11);
        assert_eq!(record.classification, Classification::High);
        assert_eq!(record.pattern_key, dice.pattern_key());
        assert_eq!(record.to_outcome().dice, dice);
    }

    // -- Streak tests --

    #[test]
    fn test_streaks_from_results() {
        let streaks = StreakStats::from_results([true, true, false, false, false, true]);
        assert_eq!(streaks.max_win, 2);
        assert_eq!(streaks.max_lose, 3);
        assert_eq!(streaks.current_win, 1);
        assert_eq!(streaks.current_lose, 0);
    }

    #[test]
    fn test_streaks_empty() {
        assert_eq!(StreakStats::from_results(Vec::new()), StreakStats::default());
    }

    // -- Helper tests --

    #[test]
    fn test_round_dp() {
        assert_eq!(round_dp(12.345, 1), 12.3);
        assert_eq!(round_dp(66.666_666, 2), 66.67);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(percentage(1, 3), 33.33);
        assert_eq!(percentage(5, 0), 0.0);
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::InsufficientData { required: 110, available: 108 };
        assert_eq!(err.to_string(), "Insufficient data: need 110 rounds, have 108");
    }
}
