//! Forage engine binary.
//!
//! This is the main entry point that wires together configuration, the
//! population spawner, and the multi-epoch runner.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `forage-config.yaml` (or `FORAGE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Seed the generation-0 population
//! 4. Assemble the simulation state and worker pool
//! 5. Run the epoch loop
//! 6. Log the result and, when `FORAGE_REPORT` is set, write a JSON report

mod error;

use std::path::PathBuf;

use forage_core::config::{LoggingConfig, SimulationConfig};
use forage_core::epoch::EpochSummary;
use forage_core::runner::{self, EpochCallback, SimulationResult};
use forage_core::spawner;
use forage_core::tick::SimulationState;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Config file looked up in the working directory.
const DEFAULT_CONFIG_PATH: &str = "forage-config.yaml";

/// Overrides the config file location.
const ENV_CONFIG: &str = "FORAGE_CONFIG";

/// Where to write the JSON run report, if set.
const ENV_REPORT: &str = "FORAGE_REPORT";

/// Logs the greedy / non-greedy split after every epoch.
struct ProgressCallback;

impl EpochCallback for ProgressCallback {
    fn on_epoch(&mut self, summary: &EpochSummary, state: &SimulationState) {
        info!(
            epoch = summary.epoch,
            population = state.population(),
            greedy = summary.greedy_end,
            non_greedy = summary.non_greedy_end(),
            deaths = summary.generation.deaths,
            births = summary.generation.births,
            "Progress"
        );
    }
}

/// Application entry point for the Forage engine.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulation itself fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;

    info!("forage-engine starting");
    match &source {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        epochs = config.world.epochs,
        food_per_epoch = config.world.food_per_epoch,
        food_lockup_ticks = config.world.food_lockup_ticks,
        initial_blobs = config.population.initial_blobs,
        greedy_fraction = config.population.greedy_fraction,
        sensing_radius = config.blobs.sensing_radius,
        step_size = config.blobs.step_size,
        "Configuration resolved"
    );

    // 3. Seed the population.
    let blobs = spawner::seed_population(&config.population, &config.blobs)
        .map_err(EngineError::from)?;

    // 4. Assemble simulation state.
    let mut state =
        SimulationState::new(config.world.clone(), blobs).map_err(EngineError::from)?;
    info!(
        workers = state.pool.current_num_threads(),
        "Simulation state assembled, entering epoch loop"
    );

    // 5. Run the simulation.
    let mut callback = ProgressCallback;
    let result = runner::run_simulation(&mut state, &mut callback)
        .await
        .map_err(EngineError::from)?;

    // 6. Log results.
    runner::log_simulation_end(&result);
    if let Ok(path) = std::env::var(ENV_REPORT) {
        write_report(&result, &path)?;
    }

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "forage-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration.
///
/// Reads `FORAGE_CONFIG` if set, otherwise `forage-config.yaml` in the
/// working directory. A missing default file falls back to built-in
/// defaults; environment overrides and validation apply either way.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let explicit = std::env::var(ENV_CONFIG).ok().map(PathBuf::from);
    let path = explicit
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if explicit.is_some() || path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        let mut config = SimulationConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok((config, None))
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .map_err(|e| EngineError::Logging {
            message: format!("invalid log filter {:?}: {e}", logging.level),
        })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Write the run result as pretty-printed JSON.
fn write_report(result: &SimulationResult, path: &str) -> Result<(), EngineError> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json).map_err(|source| EngineError::ReportIo {
        path: path.to_owned(),
        source,
    })?;
    info!(path, epochs = result.epochs.len(), "Report written");
    Ok(())
}
