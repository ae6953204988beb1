//! DICECAST: outcome history and prediction engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the engine from its snapshot (or creates a fresh one), replays
//! feed events until input ends or Ctrl+C, then reports and saves.

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::io::{self, AsyncBufRead, BufReader};
use tracing::{error, info, warn};

use dicecast::config::AppConfig;
use dicecast::engine::PredictionEngine;
use dicecast::feed::{self, FeedAction, FeedReader};
use dicecast::storage;
use dicecast::strategy::random::SeededRandom;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    init_logging();

    let cfg = AppConfig::load_or_default("config.toml")?;
    info!(
        max_history = cfg.engine.max_history,
        window_size = cfg.engine.window_size,
        policy = ?cfg.engine.abstain_policy,
        seeded = cfg.engine.seed.is_some(),
        "DICECAST starting up"
    );

    // -- Restore or create the engine --------------------------------------

    let snapshot_path = cfg.storage.snapshot_path.as_str();
    let mut engine = match restore_snapshot(&cfg)? {
        Some(snapshot) => PredictionEngine::restore(
            cfg.engine.clone(),
            cfg.backtest.clone(),
            snapshot,
            Box::new(SeededRandom::from_option(cfg.engine.seed)),
        ),
        None => PredictionEngine::from_config(&cfg),
    };

    // -- Replay the feed -----------------------------------------------------

    let input: Box<dyn AsyncBufRead + Unpin> = match cfg.feed.input.as_deref() {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open feed input {path}"))?;
            info!(path, "Reading feed from file");
            Box::new(BufReader::new(file))
        }
        None => {
            info!("Reading feed from stdin");
            Box::new(BufReader::new(io::stdin()))
        }
    };
    let mut reader = FeedReader::new(input);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering feed loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            next = reader.next_event() => {
                match next {
                    Ok(Some(event)) => match feed::apply_event(&mut engine, event) {
                        Ok(FeedAction::Predicted(prediction)) => {
                            println!("{prediction}");
                        }
                        Ok(FeedAction::Recorded(record)) => {
                            if let Some(check) = engine.last_check().filter(|c| c.round_id == record.round_id) {
                                println!("{check}");
                            }
                        }
                        Err(e) => warn!(error = %e, "Feed event rejected"),
                    },
                    Ok(None) => {
                        info!(skipped = reader.skipped(), "Feed input exhausted");
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "Feed read failed");
                        break;
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // -- Report --------------------------------------------------------------

    print_json("statistics", &engine.statistics())?;
    print_json("pattern_analysis", &engine.pattern_analysis())?;

    let sample_size = engine.default_sample_size();
    match engine.simulate(sample_size) {
        Ok(report) => print_json("backtest", &report)?,
        Err(e) => warn!(error = %e, "Backtest skipped"),
    }
    print_json("strategy_comparison", &engine.compare_strategies())?;

    if cfg.storage.enabled {
        storage::save_snapshot(&engine.snapshot(), Some(snapshot_path))?;
    }
    info!(
        rounds = engine.history().len(),
        accuracy = format!("{:.2}%", engine.prediction_stats().accuracy),
        "DICECAST shut down cleanly."
    );

    Ok(())
}

fn restore_snapshot(cfg: &AppConfig) -> Result<Option<storage::EngineSnapshot>> {
    if !cfg.storage.enabled {
        return Ok(None);
    }
    storage::load_snapshot(Some(&cfg.storage.snapshot_path))
}

fn print_json<T: Serialize>(label: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialise {label}"))?;
    println!("== {label} ==\n{json}");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("dicecast=info"));

    let json_logging = std::env::var("DICECAST_LOG_JSON").is_ok();

    // Logs go to stderr so stdout stays clean for reports.
    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
