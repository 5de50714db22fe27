//! Multi-epoch simulation runner.
//!
//! This module provides [`run_simulation`], the top-level async function
//! that drives the epoch loop:
//!
//! - **Bounded run**: stop after `world.epochs` epochs
//! - **Extinction**: stop early once the population is empty
//! - **Pacing**: optional real-time pause between epochs
//! - **Observation**: an [`EpochCallback`] sees every finished epoch
//!
//! The runner wraps the single-epoch [`run_epoch`] function and adds the
//! control plane around it.
//!
//! [`run_epoch`]: crate::epoch::run_epoch

use serde::Serialize;
use tracing::{info, warn};

use crate::epoch::{self, EpochSummary, FoodLayout};
use crate::tick::{SimulationState, TickError};

/// Errors that can occur during the simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// An epoch failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Why the simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationEndReason {
    /// Every configured epoch ran.
    EpochsCompleted,
    /// The population died out.
    Extinction,
}

/// Result of the simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: SimulationEndReason,
    /// One summary per completed epoch, in order.
    pub epochs: Vec<EpochSummary>,
    /// Total ticks across all epochs.
    pub total_ticks: u64,
    /// Population when the run ended.
    pub final_population: usize,
}

/// Callback invoked after each epoch completes.
pub trait EpochCallback: Send {
    /// Called after an epoch and its lifecycle update.
    fn on_epoch(&mut self, summary: &EpochSummary, state: &SimulationState);
}

/// A no-op epoch callback.
pub struct NoOpCallback;

impl EpochCallback for NoOpCallback {
    fn on_epoch(&mut self, _summary: &EpochSummary, _state: &SimulationState) {}
}

/// Run epochs until the configured count is reached or the population dies
/// out. Each epoch scatters `world.food_per_epoch` food sites.
///
/// Must be called from a multi-threaded tokio runtime: epochs run through
/// [`tokio::task::block_in_place`].
///
/// # Errors
///
/// Returns [`RunnerError`] if an epoch fails unrecoverably.
pub async fn run_simulation(
    state: &mut SimulationState,
    callback: &mut dyn EpochCallback,
) -> Result<SimulationResult, RunnerError> {
    let epochs = state.config.epochs;
    let food_per_epoch = usize::try_from(state.config.food_per_epoch).unwrap_or(usize::MAX);
    let interval_ms = state.config.epoch_interval_ms;

    let mut summaries: Vec<EpochSummary> = Vec::new();
    let mut total_ticks: u64 = 0;

    info!(
        epochs,
        food_per_epoch,
        population = state.population(),
        greedy = state.greedy_count(),
        workers = state.pool.current_num_threads(),
        "Simulation starting"
    );

    for _ in 0..epochs {
        // --- Check extinction (before epoch) ---
        if state.population() == 0 {
            info!(epochs_run = state.epochs_run, "Population extinct");
            return Ok(finish(SimulationEndReason::Extinction, summaries, total_ticks, state));
        }

        // --- Execute epoch ---
        // The epoch blocks on the rayon pool, so keep it off the async
        // worker's scheduler while it runs.
        let summary = tokio::task::block_in_place(|| {
            let mut rng = rand::rng();
            epoch::run_epoch(state, FoodLayout::Scattered(food_per_epoch), &mut rng)
        })?;
        total_ticks = total_ticks.saturating_add(summary.ticks);

        // --- Notify callback ---
        callback.on_epoch(&summary, state);
        summaries.push(summary);

        // --- Sleep for epoch interval ---
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }

    let reason = if state.population() == 0 {
        SimulationEndReason::Extinction
    } else {
        SimulationEndReason::EpochsCompleted
    };
    Ok(finish(reason, summaries, total_ticks, state))
}

fn finish(
    end_reason: SimulationEndReason,
    epochs: Vec<EpochSummary>,
    total_ticks: u64,
    state: &SimulationState,
) -> SimulationResult {
    SimulationResult {
        end_reason,
        epochs,
        total_ticks,
        final_population: state.population(),
    }
}

/// Log the simulation end sequence.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        epochs = result.epochs.len(),
        total_ticks = result.total_ticks,
        final_population = result.final_population,
        "Simulation ended"
    );

    if let Some(last) = result.epochs.last() {
        info!(
            epoch = last.epoch,
            greedy = last.greedy_end,
            non_greedy = last.non_greedy_end(),
            "Final epoch summary"
        );
    } else {
        warn!("Simulation ended with no epochs executed");
    }
}
