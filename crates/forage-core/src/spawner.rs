//! Population seeding.
//!
//! Before the first epoch the spawner creates `initial_blobs` generation-0
//! blobs. `initial_blobs × greedy_fraction`, rounded half to even, of them
//! are greedy and the rest share. All of them share one [`ProximitySensor`] and the
//! configured step size. Placement happens later, per epoch.

use std::sync::Arc;

use forage_agents::{AgentError, Blob, BlobTraits};
use forage_world::{ProximitySensor, Sensor, WorldError};
use tracing::info;

use crate::config::{BlobConfig, PopulationConfig};

/// Errors that can occur while seeding the population.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    /// The sensor could not be built.
    #[error("sensor error: {source}")]
    Sensor {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Blob traits were rejected.
    #[error("blob traits error: {source}")]
    Traits {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

/// How many of `total` blobs are greedy for a given fraction.
///
/// The fraction is clamped into `[0, 1]` and the product rounded to the
/// nearest whole blob, ties going to the even count.
pub fn greedy_count(total: u32, fraction: f64) -> u32 {
    let product = (f64::from(total) * fraction.clamp(0.0, 1.0)).round_ties_even();
    // The product lies in [0, total] so the cast cannot truncate or wrap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let greedy = product as u32;
    greedy.min(total)
}

/// Create the generation-0 population.
pub fn seed_population(
    population: &PopulationConfig,
    blobs: &BlobConfig,
) -> Result<Vec<Blob>, SpawnError> {
    let sensor: Arc<dyn Sensor> = Arc::new(ProximitySensor::new(blobs.sensing_radius)?);
    let greedy_traits = BlobTraits::new(true, blobs.step_size, Arc::clone(&sensor))?;
    let sharing_traits = BlobTraits::new(false, blobs.step_size, sensor)?;

    let total = population.initial_blobs;
    let greedy = greedy_count(total, population.greedy_fraction);

    let seeded: Vec<Blob> = (0..total)
        .map(|i| {
            let traits = if i < greedy {
                greedy_traits.clone()
            } else {
                sharing_traits.clone()
            };
            Blob::seed(traits)
        })
        .collect();

    info!(
        total,
        greedy,
        non_greedy = total.saturating_sub(greedy),
        sensing_radius = blobs.sensing_radius,
        step_size = blobs.step_size,
        "Population seeded"
    );

    Ok(seeded)
}
