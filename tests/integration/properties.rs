//! Property checks over arbitrary round sequences.

use proptest::prelude::*;

use dicecast::config::{BacktestConfig, EngineConfig};
use dicecast::engine::PredictionEngine;
use dicecast::history::sequence::MAX_RUNS_PER_CLASS;
use dicecast::history::HistoryStore;
use dicecast::strategy::random::SeededRandom;
use dicecast::types::{Classification, Dice, Outcome};

fn dice_strategy() -> impl Strategy<Value = (u8, u8, u8)> {
    (1u8..=6, 1u8..=6, 1u8..=6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn history_stays_bounded_and_consistent(
        capacity in 1usize..40,
        rounds in prop::collection::vec(dice_strategy(), 0..120),
    ) {
        let mut store = HistoryStore::new(capacity);
        for (i, (a, b, c)) in rounds.iter().enumerate() {
            store.append(Outcome::now(i as u64, Dice::new(*a, *b, *c).unwrap()));
            prop_assert!(store.len() <= capacity);
            let total: u32 = store.sum_distribution().iter().map(|(_, n)| n).sum();
            prop_assert_eq!(total as usize, store.len());
        }

        // FIFO: the survivors are exactly the newest `len` appends, in order.
        let first = rounds.len().saturating_sub(capacity) as u64;
        let ids: Vec<u64> = store.iter().map(|r| r.round_id).collect();
        let expected: Vec<u64> = (first..rounds.len() as u64).collect();
        prop_assert_eq!(ids, expected);
    }

    #[test]
    fn classification_is_a_function_of_sum((a, b, c) in dice_strategy()) {
        let dice = Dice::new(a, b, c).unwrap();
        let expected = if a + b + c > 10 { Classification::High } else { Classification::Low };
        prop_assert_eq!(Classification::from_sum(dice.sum()), expected);
        let swapped = Dice::new(c, a, b).unwrap();
        prop_assert_eq!(dice.pattern_key(), swapped.pattern_key());
    }

    #[test]
    fn runs_are_bounded_and_genuine(rounds in prop::collection::vec(dice_strategy(), 0..200)) {
        let mut engine = PredictionEngine::new(
            EngineConfig::default(),
            BacktestConfig::default(),
            Box::new(SeededRandom::from_seed(1)),
        );
        for (i, (a, b, c)) in rounds.iter().enumerate() {
            engine.record_outcome(i as u64, *a, *b, *c).unwrap();
        }

        for class in Classification::ALL {
            let runs = engine.sequences().runs(class);
            prop_assert!(runs.len() <= MAX_RUNS_PER_CLASS);
            for run in runs {
                let anchor: Vec<Classification> = engine
                    .history()
                    .iter()
                    .skip_while(|r| r.round_id != run.start_round_id)
                    .take(3)
                    .map(|r| r.classification)
                    .collect();
                prop_assert_eq!(anchor, vec![class; 3]);
            }
        }
    }

    #[test]
    fn confidence_stays_in_band(
        rounds in prop::collection::vec(dice_strategy(), 0..80),
        seed in any::<u64>(),
    ) {
        let mut engine = PredictionEngine::new(
            EngineConfig::default(),
            BacktestConfig::default(),
            Box::new(SeededRandom::from_seed(seed)),
        );
        for (i, (a, b, c)) in rounds.iter().enumerate() {
            engine.record_outcome(i as u64, *a, *b, *c).unwrap();
        }

        let first = engine.predict_next();
        let second = engine.predict_next();
        prop_assert!((55.0..=95.0).contains(&first.confidence));
        prop_assert!((55.0..=95.0).contains(&second.confidence));
        prop_assert_eq!(first.votes(), second.votes());
    }

    #[test]
    fn invalid_dice_never_mutate(bad in 7u8..=255, good in 1u8..=6) {
        let mut engine = PredictionEngine::new(
            EngineConfig::default(),
            BacktestConfig::default(),
            Box::new(SeededRandom::from_seed(0)),
        );
        prop_assert!(engine.record_outcome(1, good, bad, good).is_err());
        prop_assert!(engine.record_outcome(1, 0, good, good).is_err());
        prop_assert!(engine.history().is_empty());
    }
}
