//! Feed replay scenarios through the public engine API.

use dicecast::feed::{self, FeedAction, FeedReader};
use dicecast::history::MAX_HISTORY;
use dicecast::stats::SumLabel;
use dicecast::types::{Classification, Dice, EngineError};

use crate::{feed_rounds, neutral_engine};

#[test]
fn test_three_highs_create_one_run() {
    let mut engine = neutral_engine();
    engine.record_outcome(1, 1, 2, 3).unwrap();
    engine.record_outcome(2, 6, 5, 4).unwrap();
    engine.record_outcome(3, 6, 6, 1).unwrap();
    engine.record_outcome(4, 5, 5, 5).unwrap();

    let runs = engine.sequences().runs(Classification::High);
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].start_round_id, 2);
    assert_eq!(runs[0].length, 3);
    assert!(engine.sequences().runs(Classification::Low).is_empty());
}

#[test]
fn test_nine_rounds_is_random_fallback() {
    let mut engine = neutral_engine();
    feed_rounds(&mut engine, 0..9);
    let prediction = engine.predict_next();
    assert!(prediction.fallback);
    assert!(prediction.breakdown.is_empty());
    assert!(engine.signal_votes().is_none());

    feed_rounds(&mut engine, 9..10);
    let prediction = engine.predict_next();
    assert!(!prediction.fallback);
    assert_eq!(prediction.breakdown.len(), 5);
}

#[test]
fn test_simulate_requires_sample_plus_warmup() {
    let mut engine = neutral_engine();
    feed_rounds(&mut engine, 0..108);
    assert_eq!(
        engine.simulate(100).unwrap_err(),
        EngineError::InsufficientData { required: 110, available: 108 }
    );

    feed_rounds(&mut engine, 108..109);
    assert!(matches!(
        engine.simulate(100),
        Err(EngineError::InsufficientData { available: 109, .. })
    ));

    feed_rounds(&mut engine, 109..110);
    let report = engine.simulate(100).unwrap();
    assert_eq!(report.total_tests, 100);
}

#[test]
fn test_permuted_dice_share_pattern_key() {
    let a = Dice::new(3, 3, 4).unwrap();
    let b = Dice::new(4, 3, 3).unwrap();
    assert_eq!(a.pattern_key(), b.pattern_key());
    assert_eq!(a.pattern_key().len(), 8);

    let mut engine = neutral_engine();
    let first = engine.record_outcome(1, 3, 3, 4).unwrap();
    let second = engine.record_outcome(2, 4, 3, 3).unwrap();
    assert_eq!(first.pattern_key, second.pattern_key);
    assert_eq!(engine.history().combination_counts().get("3-3-4"), Some(&2));
}

#[test]
fn test_cap_and_combination_asymmetry() {
    let mut engine = neutral_engine();
    engine.record_outcome(0, 1, 1, 1).unwrap();
    feed_rounds(&mut engine, 1..(MAX_HISTORY as u64 + 1));

    let history = engine.history();
    assert_eq!(history.len(), MAX_HISTORY);
    assert_eq!(history.get(0).unwrap().round_id, 1);
    // The evicted sum-3 round no longer counts in the sum distribution,
    // but its combination is still remembered.
    let stored_ones = history.iter().filter(|r| r.dice.faces() == [1, 1, 1]).count() as u32;
    assert_eq!(history.sum_count(3), stored_ones);
    assert_eq!(history.combination_counts().get("1-1-1").copied(), Some(stored_ones + 1));
}

#[test]
fn test_backtest_is_deterministic_with_fixed_randomness() {
    let mut a = neutral_engine();
    let mut b = neutral_engine();
    feed_rounds(&mut a, 0..150);
    for record in a.history().iter() {
        b.ingest(record.to_outcome());
    }

    let first = a.simulate(100).unwrap();
    let second = b.simulate(100).unwrap();
    assert_eq!(first.accuracy, second.accuracy);
    assert_eq!(first.win_rate_by_band, second.win_rate_by_band);
    assert_eq!(first.confidence_distribution, second.confidence_distribution);

    let again = a.simulate(100).unwrap();
    assert_eq!(again.accuracy, first.accuracy);
    assert_eq!(again.win_rate_by_band, first.win_rate_by_band);
}

#[test]
fn test_live_and_backtest_streak_writers() {
    let mut engine = neutral_engine();
    feed_rounds(&mut engine, 0..120);

    for id in 120..125 {
        let prediction = engine.start_round(id);
        let (d1, d2, d3) = match prediction.classification {
            Classification::High => (6, 6, 6),
            Classification::Low => (1, 1, 2),
        };
        engine.record_outcome(id, d1, d2, d3).unwrap();
    }
    let live = engine.prediction_stats().streaks;
    assert_eq!(live.current_win, 5);
    assert_eq!(engine.tracker().recent_accuracy(5), 100.0);

    let report = engine.simulate(100).unwrap();
    assert_eq!(engine.prediction_stats().streaks, report.streaks);
    assert_eq!(engine.prediction_stats().total_predictions, 100);
}

#[test]
fn test_statistics_snapshot() {
    let mut engine = neutral_engine();
    engine.record_outcome(1, 6, 3, 1).unwrap();
    engine.record_outcome(2, 6, 4, 1).unwrap();
    engine.record_outcome(3, 2, 2, 1).unwrap();

    let stats = engine.statistics();
    assert_eq!(stats.total_rounds, 3);
    assert_eq!(stats.high.count, 1);
    assert_eq!(stats.low.count, 2);
    let tie = stats.sum_distribution.iter().find(|b| b.sum == 10).unwrap();
    assert_eq!(tie.label, SumLabel::Tie);
    assert_eq!(stats.top_combinations.len(), 3);
}

#[test]
fn test_feed_replay() {
    let lines: &[u8] = b"{\"event\":\"round_resolved\",\"round_id\":1,\"dice\":[2,3,4]}\n\
        {\"event\":\"round_started\",\"round_id\":2}\n\
        {\"event\":\"round_resolved\",\"round_id\":2,\"dice\":[6,6,6]}\n\
        {\"event\":\"round_resolved\",\"round_id\":3,\"dice\":[0,6,6]}\n\
        not an event\n";

    let mut engine = neutral_engine();
    let mut recorded = 0;
    let mut rejected = 0;

    tokio_test::block_on(async {
        let mut reader = FeedReader::new(lines);
        while let Some(event) = reader.next_event().await.unwrap() {
            match feed::apply_event(&mut engine, event) {
                Ok(FeedAction::Recorded(_)) => recorded += 1,
                Ok(FeedAction::Predicted(p)) => assert!(p.fallback),
                Err(_) => rejected += 1,
            }
        }
        assert_eq!(reader.skipped(), 1);
    });

    assert_eq!(recorded, 2);
    assert_eq!(rejected, 1);
    assert_eq!(engine.history().len(), 2);
    assert_eq!(engine.last_check().unwrap().round_id, 2);
}
