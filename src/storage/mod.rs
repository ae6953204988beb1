//! Persistence layer.
//!
//! Saves and loads engine snapshots to/from a JSON file. A snapshot holds
//! only the raw rounds and the prediction accounting; every derived
//! counter is rebuilt on restore by re-appending the rounds.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::{OutcomeRecord, PredictionStats};

/// Default snapshot file path.
pub const DEFAULT_SNAPSHOT_FILE: &str = "dicecast_snapshot.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    /// Stored rounds, oldest first.
    pub records: Vec<OutcomeRecord>,
    pub stats: PredictionStats,
}

impl EngineSnapshot {
    pub fn new(records: Vec<OutcomeRecord>, stats: PredictionStats) -> Self {
        Self {
            id: Uuid::new_v4(),
            saved_at: Utc::now(),
            records,
            stats,
        }
    }
}

/// Save an engine snapshot to a JSON file.
pub fn save_snapshot(snapshot: &EngineSnapshot, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(snapshot)
        .context("Failed to serialise engine snapshot")?;

    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write snapshot to {path}"))?;

    debug!(path, id = %snapshot.id, rounds = snapshot.records.len(), "Snapshot saved");
    Ok(())
}

/// Load an engine snapshot from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_snapshot(path: Option<&str>) -> Result<Option<EngineSnapshot>> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved snapshot found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot from {path}"))?;

    let snapshot: EngineSnapshot = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse snapshot from {path}"))?;

    info!(
        path,
        id = %snapshot.id,
        rounds = snapshot.records.len(),
        saved_at = %snapshot.saved_at,
        "Snapshot loaded from disk"
    );

    Ok(Some(snapshot))
}

/// Delete the snapshot file (for testing or reset).
pub fn delete_snapshot(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_SNAPSHOT_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to delete snapshot file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
