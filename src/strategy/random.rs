//! Injectable randomness.
//!
//! The combiner's perturbation and coin-flip fallbacks draw from a
//! `RandomSource` so that tests and backtests can pin them down.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::types::Classification;

/// Source of uniform draws in `[0, 1)`.
#[cfg_attr(test, mockall::automock)]
pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;
}

/// Uniform choice between High and Low.
pub fn coin_flip(rng: &mut dyn RandomSource) -> Classification {
    if rng.next_unit() > 0.5 {
        Classification::High
    } else {
        Classification::Low
    }
}

/// `StdRng`-backed source, seeded explicitly or from OS entropy.
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn from_entropy() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Seeded when `seed` is set, entropy otherwise.
    pub fn from_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::from_seed(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Always returns the same draw.
///
/// `FixedRandom::neutral()` yields 0.5: zero perturbation, and every
/// coin flip lands on Low. Used to switch randomness off.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(f64);

impl FixedRandom {
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0 - f64::EPSILON))
    }

    pub fn neutral() -> Self {
        Self(0.5)
    }
}

impl RandomSource for FixedRandom {
    fn next_unit(&mut self) -> f64 {
        self.0
    }
}
