//! Core engine: the single owner of history, runs, and prediction accounting.
//!
//! The feed drives it through two calls. `record_outcome` stores a resolved
//! round and scores the prediction cached for it, and `start_round`
//! predicts the round that just opened and caches the answer.

pub mod tracker;

use tracing::{debug, info, warn};

use crate::backtest::runner::{BacktestReport, Backtester};
use crate::backtest::strategy::{self, StrategyComparison};
use crate::config::{AppConfig, BacktestConfig, EngineConfig};
use crate::history::sequence::SequenceDetector;
use crate::history::HistoryStore;
use crate::signals::SignalVote;
use crate::stats::patterns::{self, PatternAnalysis};
use crate::stats::{StatsReporter, StatsSnapshot};
use crate::storage::EngineSnapshot;
use crate::strategy::random::{RandomSource, SeededRandom};
use crate::strategy::Predictor;
use crate::types::{
    Dice, EngineError, Outcome, OutcomeRecord, Prediction, PredictionCheck, PredictionStats,
    SequenceRun,
};
use tracker::AccuracyTracker;

pub struct PredictionEngine {
    config: EngineConfig,
    history: HistoryStore,
    sequences: SequenceDetector,
    predictor: Predictor,
    backtester: Backtester,
    stats: PredictionStats,
    tracker: AccuracyTracker,
    /// Prediction cached by `start_round`, scored by the next resolution.
    pending: Option<(u64, Prediction)>,
    last_check: Option<PredictionCheck>,
    rng: Box<dyn RandomSource>,
}

impl PredictionEngine {
    pub fn new(config: EngineConfig, backtest: BacktestConfig, rng: Box<dyn RandomSource>) -> Self {
        let predictor = Predictor::from_config(&config);
        let backtester = Backtester::new(predictor.clone(), backtest, config.max_history);
        Self {
            history: HistoryStore::new(config.max_history),
            sequences: SequenceDetector::new(config.max_runs_per_class),
            predictor,
            backtester,
            stats: PredictionStats::default(),
            tracker: AccuracyTracker::default(),
            pending: None,
            last_check: None,
            rng,
            config,
        }
    }

    /// Engine seeded from `config.engine.seed`, or from entropy.
    pub fn from_config(config: &AppConfig) -> Self {
        let rng = Box::new(SeededRandom::from_option(config.engine.seed));
        Self::new(config.engine.clone(), config.backtest.clone(), rng)
    }

    /// Rebuild an engine from a saved snapshot.
    ///
    /// Rounds are re-appended in order, so sum counts and runs are derived
    /// afresh. Combination counts only cover the saved rounds.
    pub fn restore(
        config: EngineConfig,
        backtest: BacktestConfig,
        snapshot: EngineSnapshot,
        rng: Box<dyn RandomSource>,
    ) -> Self {
        let mut engine = Self::new(config, backtest, rng);
        for record in &snapshot.records {
            engine.store(record.to_outcome());
        }
        engine.stats = snapshot.stats;
        info!(
            id = %snapshot.id,
            rounds = engine.history.len(),
            "Engine restored from snapshot"
        );
        engine
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot::new(self.history.records(), self.stats.clone())
    }

    // -- Feed operations ----------------------------------------------------

    /// Store a resolved round. Dice outside 1..=6 are rejected before any
    /// state changes.
    pub fn record_outcome(&mut self, round_id: u64, d1: u8, d2: u8, d3: u8) -> Result<OutcomeRecord, EngineError> {
        let dice = Dice::new(d1, d2, d3).map_err(|e| {
            warn!(round_id, d1, d2, d3, error = %e, "Rejected outcome");
            e
        })?;
        Ok(self.ingest(Outcome::now(round_id, dice)))
    }

    /// Store an already-validated round and score any cached prediction.
    pub fn ingest(&mut self, outcome: Outcome) -> OutcomeRecord {
        let record = self.store(outcome);

        if let Some((predicted_for, prediction)) = self.pending.take() {
            if predicted_for != record.round_id {
                debug!(predicted_for, round_id = record.round_id, "Cached prediction was for another round");
            }
            let check = self.tracker.reconcile(&mut self.stats, &prediction, &record);
            self.last_check = Some(check);
        }

        info!(
            round_id = record.round_id,
            dice = %record.dice,
            sum = record.sum,
            classification = %record.classification,
            pattern_key = %record.pattern_key,
            rounds = self.history.len(),
            "Round resolved"
        );
        record
    }

    /// Predict the round that just opened and cache it for scoring.
    pub fn start_round(&mut self, round_id: u64) -> Prediction {
        let prediction = self.predict_next();
        info!(
            round_id,
            prediction = %prediction.classification,
            confidence = prediction.confidence,
            fallback = prediction.fallback,
            "Round started"
        );
        self.pending = Some((round_id, prediction.clone()));
        prediction
    }

    /// Predict the next round. Never fails; falls back to a coin flip
    /// while history is short.
    ///
    /// Takes `&mut self` only to draw from the engine's random source.
    pub fn predict_next(&mut self) -> Prediction {
        self.predictor.predict(&self.history, self.rng.as_mut())
    }

    /// Analyzer votes without the random combination step, or `None` while
    /// history is too short.
    pub fn signal_votes(&self) -> Option<Vec<SignalVote>> {
        self.predictor.signals(&self.history)
    }

    // -- Read paths ---------------------------------------------------------

    pub fn statistics(&self) -> StatsSnapshot {
        StatsReporter::snapshot(&self.history, &self.stats)
    }

    pub fn pattern_analysis(&self) -> PatternAnalysis {
        patterns::analyze(&self.history, &self.sequences)
    }

    /// Backtest the newest `sample_size` rounds.
    ///
    /// Not read-only: a successful run adds its counts to the prediction
    /// totals, replaces the accuracy, and overwrites the streak counters
    /// that the live path maintains.
    pub fn simulate(&mut self, sample_size: usize) -> Result<BacktestReport, EngineError> {
        let report = self
            .backtester
            .run(&self.history, sample_size, self.rng.as_mut())?;

        self.stats.total_predictions += report.total_tests as u64;
        self.stats.correct_predictions += report.correct as u64;
        self.stats.wrong_predictions += report.wrong as u64;
        self.stats.accuracy = report.accuracy;
        self.stats.streaks = report.streaks;

        Ok(report)
    }

    /// Score each simplified strategy on its own against the history.
    pub fn compare_strategies(&self) -> StrategyComparison {
        strategy::compare(&self.history, self.stats.accuracy)
    }

    // -- Accessors ----------------------------------------------------------

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn sequences(&self) -> &SequenceDetector {
        &self.sequences
    }

    pub fn prediction_stats(&self) -> &PredictionStats {
        &self.stats
    }

    pub fn tracker(&self) -> &AccuracyTracker {
        &self.tracker
    }

    pub fn last_check(&self) -> Option<&PredictionCheck> {
        self.last_check.as_ref()
    }

    pub fn pending_prediction(&self) -> Option<&Prediction> {
        self.pending.as_ref().map(|(_, p)| p)
    }

    pub fn default_sample_size(&self) -> usize {
        self.backtester.config().default_sample_size
    }

    fn store(&mut self, outcome: Outcome) -> OutcomeRecord {
        let record = self.history.append(outcome);
        if let Some(run) = self.sequences.on_append(&self.history) {
            log_run(&run, &record);
        }
        record
    }
}

fn log_run(run: &SequenceRun, record: &OutcomeRecord) {
    debug!(
        class = %record.classification,
        start_round_id = run.start_round_id,
        length = run.length,
        "Run of identical outcomes"
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
