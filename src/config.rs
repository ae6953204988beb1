//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default matching the engine's built-in constants,
//! so a partial (or missing) file is fine.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::history::sequence::MAX_RUNS_PER_CLASS;
use crate::history::MAX_HISTORY;
use crate::strategy::combiner::AbstainPolicy;
use crate::strategy::{MIN_HISTORY, WINDOW_SIZE};

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub backtest: BacktestConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on stored rounds.
    pub max_history: usize,
    /// Trailing rounds handed to the analyzers.
    pub window_size: usize,
    /// Below this many rounds predictions are coin flips.
    pub min_history: usize,
    pub max_runs_per_class: usize,
    /// Fixed RNG seed; entropy when absent.
    pub seed: Option<u64>,
    pub abstain_policy: AbstainPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_history: MAX_HISTORY,
            window_size: WINDOW_SIZE,
            min_history: MIN_HISTORY,
            max_runs_per_class: MAX_RUNS_PER_CLASS,
            seed: None,
            abstain_policy: AbstainPolicy::RandomVote,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct BacktestConfig {
    /// Rounds of context before the first scored step.
    pub warmup: usize,
    /// Trailing steps included in a report.
    pub display_steps: usize,
    pub default_sample_size: usize,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            warmup: 10,
            display_steps: 20,
            default_sample_size: 100,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    pub enabled: bool,
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            snapshot_path: "dicecast_snapshot.json".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct FeedConfig {
    /// JSON-lines event file; stdin when unset.
    pub input: Option<String>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            info!(path, "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }
}
