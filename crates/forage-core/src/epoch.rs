//! The epoch controller.
//!
//! An epoch places every blob on the rim, scatters food, runs ticks until
//! every blob is home, and then applies the lifecycle rule to produce the
//! next population.
//!
//! Blobs are shuffled and then spaced evenly around the rim: with `n` blobs
//! the `i`-th one (0-based) sits at angle `2π·(i + 1) / n`.
//!
//! If an epoch runs for `max_ticks_per_epoch` ticks, the remaining food is
//! discarded and every blob is recalled. The recalled blobs then get as many
//! ticks as the longest walk home needs; an epoch still unfinished after
//! that fails with [`TickError::Stalled`].

use core::f64::consts::TAU;
use std::collections::BTreeMap;

use forage_agents::{Blob, GenerationReport, next_generation};
use forage_types::BlobId;
use forage_world::{FoodSite, Position};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{info, warn};

use crate::tick::{self, SimulationState, TickError};

/// Where the epoch's food goes.
#[derive(Debug, Clone, PartialEq)]
pub enum FoodLayout {
    /// This many sites at uniformly random radius and angle.
    Scattered(usize),
    /// Exactly these positions.
    Fixed(Vec<Position>),
}

/// What happened during one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EpochSummary {
    /// Epoch index, starting at 0.
    pub epoch: u64,
    /// Ticks the epoch took.
    pub ticks: u64,
    /// Population at the start of the epoch.
    pub population_start: usize,
    /// Greedy blobs at the start of the epoch.
    pub greedy_start: usize,
    /// Food sites placed.
    pub food_placed: usize,
    /// Food sites eaten.
    pub food_eaten: usize,
    /// Whether the tick limit forced a recall.
    pub tick_limit_hit: bool,
    /// Blob updates that failed across all ticks.
    pub agent_failures: usize,
    /// Deaths, survivals, and births.
    pub generation: GenerationReport,
    /// Population after the lifecycle update.
    pub population_end: usize,
    /// Greedy blobs after the lifecycle update.
    pub greedy_end: usize,
}

impl EpochSummary {
    /// Non-greedy blobs after the lifecycle update.
    pub const fn non_greedy_end(&self) -> usize {
        self.population_end.saturating_sub(self.greedy_end)
    }
}

/// Run one full epoch and update the population.
///
/// The gate is closed and the board cleared before returning, whether or
/// not the epoch succeeded.
pub fn run_epoch<R: Rng + ?Sized>(
    state: &mut SimulationState,
    layout: FoodLayout,
    rng: &mut R,
) -> Result<EpochSummary, TickError> {
    let epoch = state.epochs_run;
    let population_start = state.population();
    let greedy_start = state.greedy_count();

    place_blobs(state, rng);
    let food_placed = place_food(state, layout, rng);

    state.gate.open(epoch);
    info!(
        epoch,
        population = population_start,
        greedy = greedy_start,
        food = food_placed,
        "Epoch started"
    );

    let outcome = drive_to_home(state, epoch);

    state.gate.close();
    state.food.clear();
    state.arbitration.clear()?;
    let progress = outcome?;

    let blobs = std::mem::take(&mut state.blobs);
    let (next, generation) = next_generation(blobs.into_values());
    state.blobs = next.into_iter().map(|blob| (blob.id(), blob)).collect();
    state.epochs_run = state.epochs_run.saturating_add(1);

    let summary = EpochSummary {
        epoch,
        ticks: progress.ticks,
        population_start,
        greedy_start,
        food_placed,
        food_eaten: progress.food_eaten,
        tick_limit_hit: progress.tick_limit_hit,
        agent_failures: progress.agent_failures,
        generation,
        population_end: state.population(),
        greedy_end: state.greedy_count(),
    };

    info!(
        epoch,
        ticks = summary.ticks,
        food_eaten = summary.food_eaten,
        greedy = summary.greedy_end,
        non_greedy = summary.non_greedy_end(),
        "Epoch complete"
    );

    Ok(summary)
}

/// Counters gathered while ticking.
#[derive(Debug, Default)]
struct Progress {
    ticks: u64,
    food_eaten: usize,
    tick_limit_hit: bool,
    agent_failures: usize,
}

/// Tick until every blob is home.
fn drive_to_home(state: &mut SimulationState, epoch: u64) -> Result<Progress, TickError> {
    let limit = state.config.max_ticks_per_epoch;
    let mut deadline: Option<u64> = None;
    let mut progress = Progress::default();

    while !state.all_home() {
        if deadline.is_some_and(|deadline| progress.ticks >= deadline) {
            return Err(TickError::Stalled {
                epoch,
                ticks: progress.ticks,
            });
        }
        if progress.ticks >= limit && deadline.is_none() {
            progress.tick_limit_hit = true;
            let discarded = state.food.len();
            state.food.clear();
            state.arbitration.clear()?;
            let recalled = tick::recall_blobs(&mut state.blobs)?;
            let drain = drain_budget(&state.blobs);
            deadline = Some(progress.ticks.saturating_add(drain));
            warn!(
                epoch,
                ticks = progress.ticks,
                recalled,
                discarded_food = discarded,
                drain_budget = drain,
                "Tick limit reached, recalling blobs"
            );
        }

        let summary = tick::run_tick(state)?;
        progress.ticks = summary.tick;
        progress.food_eaten = progress.food_eaten.saturating_add(summary.food_consumed);
        progress.agent_failures = progress
            .agent_failures
            .saturating_add(summary.failures.len());
    }

    Ok(progress)
}

/// Ticks the slowest recalled blob needs to walk home, plus one for
/// rounding. A homeward blob closes a full step per tick along a chord, so
/// the walk cannot take longer than this.
fn drain_budget(blobs: &BTreeMap<BlobId, Blob>) -> u64 {
    blobs
        .values()
        .map(|blob| {
            let steps = (blob.position().distance(blob.home()) / blob.traits().step_size()).ceil();
            // Distances are at most 2 and step sizes positive, so this is a
            // small non-negative whole number.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let steps = steps as u64;
            steps.saturating_add(1)
        })
        .max()
        .unwrap_or(0)
}

/// Shuffle the population and space it evenly around the rim. Each blob's
/// home is where it starts.
fn place_blobs<R: Rng + ?Sized>(state: &mut SimulationState, rng: &mut R) {
    let mut order: Vec<BlobId> = state.blobs.keys().copied().collect();
    if order.is_empty() {
        return;
    }
    order.shuffle(rng);

    // Populations are far below 2^52, so the conversions are exact.
    #[allow(clippy::cast_precision_loss)]
    let spacing = TAU / order.len() as f64;
    for (slot, id) in order.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let angle = spacing * (slot as f64 + 1.0);
        if let Some(blob) = state.blobs.get_mut(id) {
            blob.reset_for_epoch(Position::on_boundary(angle));
        }
    }
}

/// Put the epoch's food on the board. Returns how many sites were placed.
fn place_food<R: Rng + ?Sized>(
    state: &mut SimulationState,
    layout: FoodLayout,
    rng: &mut R,
) -> usize {
    let sites: Vec<FoodSite> = match layout {
        FoodLayout::Scattered(count) => (0..count)
            .map(|_| FoodSite::new(Position::random_in_disk(rng)))
            .collect(),
        FoodLayout::Fixed(positions) => positions.into_iter().map(FoodSite::new).collect(),
    };
    let placed = sites.len();
    state.food = sites.into_iter().map(|site| (site.id(), site)).collect();
    placed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use forage_agents::{Blob, BlobTraits};
    use forage_types::RewardLevel;
    use forage_world::ProximitySensor;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::config::WorldConfig;

    fn blob(greedy: bool, step: f64, sensing: f64) -> Blob {
        let sensor = Arc::new(ProximitySensor::new(sensing).unwrap());
        Blob::seed(BlobTraits::new(greedy, step, sensor).unwrap())
    }

    fn state(blobs: Vec<Blob>, max_ticks: u64) -> SimulationState {
        let config = WorldConfig {
            workers: 2,
            max_ticks_per_epoch: max_ticks,
            ..WorldConfig::default()
        };
        SimulationState::new(config, blobs).unwrap()
    }

    #[test]
    fn blobs_are_spaced_evenly_on_the_rim() {
        let blobs = (0..4).map(|_| blob(false, 0.1, 0.1)).collect();
        let mut state = state(blobs, 100);
        let mut rng = SmallRng::seed_from_u64(1);

        place_blobs(&mut state, &mut rng);

        let mut angles: Vec<f64> = state.blobs.values().map(|b| b.home().angle()).collect();
        angles.sort_by(f64::total_cmp);
        let expected = [0.0, TAU / 4.0, TAU / 2.0, 3.0 * TAU / 4.0];
        for (angle, want) in angles.iter().zip(expected) {
            assert!((angle - want).abs() < 1e-9, "angle {angle} != {want}");
        }
        for b in state.blobs.values() {
            assert!((b.home().radius() - 1.0).abs() < 1e-12);
            assert_eq!(b.position(), b.home());
        }
    }

    #[test]
    fn scattered_food_lands_inside_the_disk() {
        let mut state = state(Vec::new(), 100);
        let mut rng = SmallRng::seed_from_u64(9);

        let placed = place_food(&mut state, FoodLayout::Scattered(25), &mut rng);

        assert_eq!(placed, 25);
        assert_eq!(state.food.len(), 25);
        assert!(state.food.values().all(|f| f.position().radius() < 1.0));
    }

    #[test]
    fn no_food_means_everyone_dies() {
        let blobs = (0..3).map(|_| blob(false, 0.2, 0.1)).collect();
        let mut state = state(blobs, 100);
        let mut rng = SmallRng::seed_from_u64(2);

        let summary = run_epoch(&mut state, FoodLayout::Fixed(Vec::new()), &mut rng).unwrap();

        assert_eq!(summary.population_start, 3);
        assert_eq!(summary.generation.deaths, 3);
        assert_eq!(summary.population_end, 0);
        assert!(state.blobs.is_empty());
        assert!(!state.gate.is_open());
        assert_eq!(state.epochs_run, 1);
    }

    #[test]
    fn tick_limit_recalls_and_discards_food() {
        // Tiny sensors and steps: nobody gets near the centre before the
        // limit, and wandering blobs folded back across the disk still have
        // to make the long walk home.
        for seed in 0..10 {
            let blobs = (0..5).map(|_| blob(false, 0.01, 0.001)).collect();
            let mut state = state(blobs, 20);
            let mut rng = SmallRng::seed_from_u64(seed);

            let summary = run_epoch(
                &mut state,
                FoodLayout::Fixed(vec![Position::ORIGIN]),
                &mut rng,
            )
            .unwrap();

            assert!(summary.tick_limit_hit);
            assert_eq!(summary.food_eaten, 0);
            assert!(summary.ticks > 20);
            assert_eq!(summary.generation.deaths, 5);
            assert_eq!(summary.population_end, 0);
            assert!(state.food.is_empty());
            assert!(!state.gate.is_open());
        }
    }

    #[test]
    fn drain_budget_for_blobs_at_home_is_one_tick() {
        let blobs: BTreeMap<BlobId, Blob> = (0..3)
            .map(|_| blob(false, 0.1, 0.1))
            .map(|mut b| {
                b.reset_for_epoch(Position::on_boundary(1.0));
                (b.id(), b)
            })
            .collect();
        assert_eq!(drain_budget(&blobs), 1);
        assert_eq!(drain_budget(&BTreeMap::new()), 0);
    }

    #[test]
    fn empty_population_finishes_immediately() {
        let mut state = state(Vec::new(), 100);
        let mut rng = SmallRng::seed_from_u64(5);

        let summary = run_epoch(&mut state, FoodLayout::Scattered(3), &mut rng).unwrap();

        assert_eq!(summary.ticks, 0);
        assert_eq!(summary.population_end, 0);
        assert_eq!(summary.generation.births, 0);
    }

    #[test]
    fn survivors_are_reset_for_the_next_epoch() {
        let blobs = vec![blob(false, 1.0, 1.0), blob(false, 1.0, 1.0)];
        let mut state = state(blobs, 100);
        let mut rng = SmallRng::seed_from_u64(6);

        let first = run_epoch(
            &mut state,
            FoodLayout::Fixed(vec![Position::ORIGIN]),
            &mut rng,
        )
        .unwrap();
        assert_eq!(first.generation.survivors, 2);

        for b in state.blobs.values() {
            assert_eq!(b.reward(), RewardLevel::Half);
        }

        let second = run_epoch(
            &mut state,
            FoodLayout::Fixed(vec![Position::ORIGIN]),
            &mut rng,
        )
        .unwrap();
        assert_eq!(second.epoch, 1);
        assert_eq!(second.generation.survivors, 2);
        assert_eq!(state.population(), 2);
    }
}
