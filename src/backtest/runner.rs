//! Historical backtesting engine.
//!
//! Replays the stored history chronologically. At every step it rebuilds
//! a fresh history from the rounds seen so far, runs the full prediction
//! pipeline on it, and scores the prediction against the round that
//! actually followed.
//!
//! Each step re-appends its whole prefix, so a run costs
//! O(sample_size × history). Both are capped at 500, and rebuilding
//! keeps every step independent of the live engine state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::backtest::calibration::{
    BandWinRate, CalibrationPoint, Calibrator, CategorySummary,
};
use crate::config::BacktestConfig;
use crate::history::HistoryStore;
use crate::strategy::random::RandomSource;
use crate::strategy::Predictor;
use crate::types::{
    percentage, round_dp, Classification, EngineError, OutcomeRecord, SignalMethod, StreakStats,
};

// ---------------------------------------------------------------------------
// Backtest results
// ---------------------------------------------------------------------------

/// One replayed prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestStep {
    pub round_id: u64,
    pub predicted: Classification,
    pub actual: Classification,
    pub correct: bool,
    pub confidence: f64,
    /// When the scored round was originally observed.
    pub observed_at: DateTime<Utc>,
}

/// Per-method accuracy row.
///
/// Per-method outcomes are not tracked yet, so these rows are filled with
/// random placeholder values and always carry `measured: false`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodPerformance {
    pub method: SignalMethod,
    pub usage: u32,
    pub accuracy: f64,
    pub measured: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    High,
    Medium,
    Low,
}

/// Human-facing reading of a backtest's overall accuracy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub level: RecommendationLevel,
    pub message: String,
    pub action: Option<String>,
}

impl Recommendation {
    pub fn from_accuracy(total_tests: usize, accuracy: f64) -> Self {
        let (level, message, action) = if total_tests == 0 || accuracy <= 0.0 {
            (RecommendationLevel::Low, "Needs more data", None)
        } else if accuracy >= 70.0 {
            (
                RecommendationLevel::High,
                "High backtest accuracy",
                Some("Predictions track recent history closely; keep monitoring"),
            )
        } else if accuracy >= 60.0 {
            (
                RecommendationLevel::Medium,
                "Moderate backtest accuracy, use with caution",
                Some("Combine with other analysis"),
            )
        } else {
            (
                RecommendationLevel::Low,
                "Low backtest accuracy, do not rely on predictions",
                Some("Reference only"),
            )
        };
        Self {
            level,
            message: message.to_string(),
            action: action.map(str::to_string),
        }
    }
}

/// Complete backtest performance report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub sample_size: usize,
    pub total_tests: usize,
    pub correct: usize,
    pub wrong: usize,
    /// Percent, two decimals.
    pub accuracy: f64,
    pub win_rate_by_band: Vec<BandWinRate>,
    pub confidence_distribution: Vec<CategorySummary>,
    /// Placeholder values; see [`MethodPerformance`].
    pub method_performance: Vec<MethodPerformance>,
    /// Recomputed from the replayed sequence only.
    pub streaks: StreakStats,
    /// The newest `display_steps` steps.
    pub recent_steps: Vec<BacktestStep>,
    pub recommendation: Recommendation,
    pub generated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Backtester
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Backtester {
    predictor: Predictor,
    config: BacktestConfig,
    /// Capacity of each rebuilt history.
    capacity: usize,
}

impl Backtester {
    pub fn new(predictor: Predictor, config: BacktestConfig, capacity: usize) -> Self {
        Self {
            predictor,
            config,
            capacity,
        }
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Rounds of history a run of `sample_size` needs.
    pub fn required_rounds(&self, sample_size: usize) -> usize {
        sample_size + self.config.warmup
    }

    /// Replay the newest `sample_size + warmup` rounds.
    pub fn run(
        &self,
        history: &HistoryStore,
        sample_size: usize,
        rng: &mut dyn RandomSource,
    ) -> Result<BacktestReport, EngineError> {
        let required = self.required_rounds(sample_size);
        if history.len() < required {
            return Err(EngineError::InsufficientData {
                required,
                available: history.len(),
            });
        }

        let slice: Vec<&OutcomeRecord> = history.tail(required).collect();
        let mut steps = Vec::with_capacity(sample_size);

        for i in self.config.warmup..slice.len() {
            let replayed =
                HistoryStore::replay(self.capacity, slice[..i].iter().map(|r| r.to_outcome()));
            let prediction = self.predictor.predict(&replayed, rng);
            let actual = slice[i];

            steps.push(BacktestStep {
                round_id: actual.round_id,
                predicted: prediction.classification,
                actual: actual.classification,
                correct: prediction.classification == actual.classification,
                confidence: prediction.confidence,
                observed_at: actual.observed_at,
            });
        }

        let report = self.summarise(sample_size, steps, rng);

        info!(
            sample_size,
            tests = report.total_tests,
            accuracy = format!("{:.2}%", report.accuracy),
            max_win = report.streaks.max_win,
            max_lose = report.streaks.max_lose,
            "Backtest complete"
        );

        Ok(report)
    }

    fn summarise(
        &self,
        sample_size: usize,
        steps: Vec<BacktestStep>,
        rng: &mut dyn RandomSource,
    ) -> BacktestReport {
        let total_tests = steps.len();
        let correct = steps.iter().filter(|s| s.correct).count();
        let accuracy = percentage(correct, total_tests);

        let mut calibrator = Calibrator::new();
        calibrator.add_points(steps.iter().map(|s| CalibrationPoint {
            confidence: s.confidence,
            correct: s.correct,
        }));
        let calibration = calibrator.report();

        let streaks = StreakStats::from_results(steps.iter().map(|s| s.correct));
        let keep_from = steps.len().saturating_sub(self.config.display_steps);
        let recent_steps = steps[keep_from..].to_vec();

        BacktestReport {
            sample_size,
            total_tests,
            correct,
            wrong: total_tests - correct,
            accuracy,
            win_rate_by_band: calibration.win_rate_by_band,
            confidence_distribution: calibration.confidence_distribution,
            method_performance: placeholder_method_performance(rng),
            streaks,
            recent_steps,
            recommendation: Recommendation::from_accuracy(total_tests, accuracy),
            generated_at: Utc::now(),
        }
    }
}

/// Random stand-in rows: usage 10..=29, accuracy 60–90%.
fn placeholder_method_performance(rng: &mut dyn RandomSource) -> Vec<MethodPerformance> {
    SignalMethod::ALL
        .iter()
        .map(|&method| MethodPerformance {
            method,
            usage: 10 + (rng.next_unit() * 20.0) as u32,
            accuracy: round_dp(rng.next_unit() * 30.0 + 60.0, 2),
            measured: false,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
