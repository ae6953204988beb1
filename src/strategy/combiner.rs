//! Weighted-consensus combiner.
//!
//! Accumulates each non-abstaining vote's weight into a High or Low
//! bucket, nudges the buckets apart by a small symmetric random amount,
//! and maps the final margin into a bounded confidence score.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::signals::SignalVote;
use crate::strategy::random::{coin_flip, RandomSource};
use crate::types::{round_dp, Classification, Prediction, Scores, VoteBreakdown};

pub const CONFIDENCE_FLOOR: f64 = 55.0;
pub const CONFIDENCE_CEILING: f64 = 95.0;
/// Confidence reported for a coin-flip prediction (midpoint of the band).
pub const FALLBACK_CONFIDENCE: f64 = (CONFIDENCE_FLOOR + CONFIDENCE_CEILING) / 2.0;
/// Half-width of the symmetric perturbation added to the scores.
pub const PERTURBATION: f64 = 0.05;

/// What to do with an analyzer that abstains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbstainPolicy {
    /// Abstentions carry no weight.
    Ignore,
    /// Each abstention's weight goes to a side chosen by coin flip.
    #[default]
    RandomVote,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PredictionCombiner {
    policy: AbstainPolicy,
}

impl PredictionCombiner {
    pub fn new(policy: AbstainPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AbstainPolicy {
        self.policy
    }

    /// Merge analyzer votes into one prediction.
    ///
    /// When every analyzer abstains the result is a coin-flip fallback
    /// whatever the policy, with every breakdown row left unresolved.
    pub fn combine(&self, votes: &[SignalVote], rng: &mut dyn RandomSource) -> Prediction {
        if votes.iter().all(|v| v.vote.is_abstain()) {
            debug!("Every analyzer abstained; falling back to a coin flip");
            let breakdown = votes
                .iter()
                .map(|v| VoteBreakdown {
                    method: v.method,
                    vote: v.vote,
                    weight: v.method.weight(),
                    resolved: None,
                })
                .collect();
            return Self::fallback(breakdown, rng);
        }

        let mut scores = Scores::default();
        let mut breakdown = Vec::with_capacity(votes.len());

        for v in votes {
            let weight = v.method.weight();
            let resolved = match (v.vote.classification(), self.policy) {
                (Some(class), _) => Some(class),
                (None, AbstainPolicy::Ignore) => None,
                (None, AbstainPolicy::RandomVote) => Some(coin_flip(rng)),
            };

            match resolved {
                Some(Classification::High) => scores.high += weight,
                Some(Classification::Low) => scores.low += weight,
                None => {}
            }

            breakdown.push(VoteBreakdown {
                method: v.method,
                vote: v.vote,
                weight,
                resolved,
            });
        }

        let nudge = rng.next_unit() * (2.0 * PERTURBATION) - PERTURBATION;
        scores.high += nudge;
        scores.low -= nudge;

        let classification = if scores.high > scores.low {
            Classification::High
        } else {
            Classification::Low
        };
        let confidence = clamp_confidence((scores.high - scores.low).abs() * 100.0);

        debug!(
            prediction = %classification,
            confidence,
            high = format!("{:.3}", scores.high),
            low = format!("{:.3}", scores.low),
            "Votes combined"
        );

        Prediction {
            classification,
            confidence,
            breakdown,
            scores,
            fallback: false,
            generated_at: Utc::now(),
        }
    }

    /// Coin-flip prediction at the fixed fallback confidence.
    pub fn fallback(breakdown: Vec<VoteBreakdown>, rng: &mut dyn RandomSource) -> Prediction {
        Prediction {
            classification: coin_flip(rng),
            confidence: FALLBACK_CONFIDENCE,
            breakdown,
            scores: Scores::default(),
            fallback: true,
            generated_at: Utc::now(),
        }
    }
}

/// Round to one decimal and clamp into `[55, 95]`.
pub fn clamp_confidence(raw: f64) -> f64 {
    round_dp(raw, 1).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEILING)
}
