//! Tick cycle: the fork-join loop that advances one epoch by one step.
//!
//! Each tick runs through these phases:
//!
//! 1. **Gate** -- advance the [`TickGate`] and mint the tick's token. A
//!    closed gate is fatal: no world query may happen outside an epoch.
//!
//! 2. **Agents** -- snapshot blob and food positions, then run every blob's
//!    [`Blob::process_next`] in parallel on the rayon pool against the same
//!    [`WorldView`]. The only shared write is a claim through the
//!    [`ArbitratorStore`]. A blob whose update returns an error or panics is
//!    recorded as an [`AgentFailure`]; the others keep their results. World
//!    errors that break the tick for everyone (closed gate, stale token,
//!    poisoned lock) abort the tick instead.
//!
//! 3. **Arbitration** -- advance every arbitrator. Each [`Resolution`]
//!    raises its claimants' rewards and sends them home.
//!
//! 4. **Cleanup** -- drop consumed food.
//!
//! 5. **Recall** -- once no food remains, every blob that is not already
//!    homeward or home is sent home.
//!
//! [`TickGate`]: forage_world::TickGate

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};

use forage_agents::{AgentError, Blob};
use forage_types::{BlobId, FoodId};
use forage_world::{
    ArbitratorStore, BlobSnapshot, FoodSite, FoodSnapshot, Resolution, TickGate, WorldError,
    WorldView,
};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::WorldConfig;

/// Errors that can occur during tick execution.
///
/// All of these abort the epoch. Per-blob faults are not errors; they are
/// reported as [`AgentFailure`]s.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A world operation failed: closed gate, stale token, or a broken
    /// arbitration invariant.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A blob rejected a command from the tick cycle.
    #[error("agent error for {blob}: {source}")]
    Agent {
        /// The blob that rejected the command.
        blob: BlobId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// An arbitrator awarded food to a blob that is not in the population.
    #[error("food {food} awarded to unknown blob {blob}")]
    UnknownClaimant {
        /// The awarded blob.
        blob: BlobId,
        /// The food site that resolved.
        food: FoodId,
    },

    /// The worker pool could not be built.
    #[error("thread pool error: {source}")]
    ThreadPool {
        /// The underlying rayon error.
        #[from]
        source: rayon::ThreadPoolBuildError,
    },

    /// Blobs failed to reach home even after being recalled.
    #[error("epoch {epoch} stalled after {ticks} ticks")]
    Stalled {
        /// The stalled epoch.
        epoch: u64,
        /// Ticks run before giving up.
        ticks: u64,
    },
}

/// A blob whose update failed during the agent phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentFailure {
    /// The failing blob.
    pub blob: BlobId,
    /// The error or panic message.
    pub message: String,
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The epoch this tick belongs to.
    pub epoch: u64,
    /// The tick number within the epoch, starting at 1.
    pub tick: u64,
    /// Blobs in the population.
    pub population: usize,
    /// Blobs home at the end of the tick.
    pub home: usize,
    /// Food sites consumed and removed this tick.
    pub food_consumed: usize,
    /// Food sites left on the board.
    pub food_remaining: usize,
    /// Blobs sent home because the food ran out.
    pub recalled: usize,
    /// Blobs whose update failed.
    pub failures: Vec<AgentFailure>,
}

impl TickSummary {
    /// Whether every blob is home.
    pub const fn all_home(&self) -> bool {
        self.home == self.population
    }
}

/// The mutable simulation state passed through the tick cycle.
#[derive(Debug)]
pub struct SimulationState {
    /// The population, keyed by id.
    pub blobs: BTreeMap<BlobId, Blob>,
    /// Food on the board, keyed by id.
    pub food: BTreeMap<FoodId, FoodSite>,
    /// Per-food claim table.
    pub arbitration: ArbitratorStore,
    /// Guards world access to the running epoch.
    pub gate: TickGate,
    /// Workers for the agent phase.
    pub pool: rayon::ThreadPool,
    /// World settings.
    pub config: WorldConfig,
    /// Epochs completed so far.
    pub epochs_run: u64,
}

impl SimulationState {
    /// Assemble a state around an initial population. The gate starts
    /// closed and the board empty.
    pub fn new(config: WorldConfig, blobs: Vec<Blob>) -> Result<Self, TickError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.workers)
            .thread_name(|index| format!("forage-agent-{index}"))
            .build()?;
        let arbitration = ArbitratorStore::new(config.food_lockup_ticks)?;
        Ok(Self {
            blobs: blobs.into_iter().map(|blob| (blob.id(), blob)).collect(),
            food: BTreeMap::new(),
            arbitration,
            gate: TickGate::new(),
            pool,
            config,
            epochs_run: 0,
        })
    }

    /// Blobs in the population.
    pub fn population(&self) -> usize {
        self.blobs.len()
    }

    /// Greedy blobs in the population.
    pub fn greedy_count(&self) -> usize {
        self.blobs.values().filter(|blob| blob.is_greedy()).count()
    }

    /// Whether every blob is home. True for an empty population.
    pub fn all_home(&self) -> bool {
        self.blobs.values().all(Blob::is_home)
    }
}

/// Execute one complete tick of the running epoch.
pub fn run_tick(state: &mut SimulationState) -> Result<TickSummary, TickError> {
    let SimulationState {
        blobs,
        food,
        arbitration,
        gate,
        pool,
        ..
    } = state;

    // --- Phase 1: Gate ---
    let tick = gate.advance()?;
    let token = gate.issue()?;
    let epoch = token.epoch();

    // --- Phase 2: Agents ---
    let blob_snapshots: Vec<BlobSnapshot> = blobs.values().map(Blob::snapshot).collect();
    let food_snapshots: Vec<FoodSnapshot> = food.values().map(FoodSite::snapshot).collect();
    let failures = {
        let view = WorldView::new(gate, token, &blob_snapshots, &food_snapshots, arbitration)?;
        pool.install(|| {
            blobs
                .par_iter_mut()
                .filter_map(|(id, blob)| update_blob(*id, blob, &view))
                .collect::<Result<Vec<AgentFailure>, TickError>>()
        })?
    };
    for failure in &failures {
        warn!(epoch, tick, blob = %failure.blob, error = %failure.message, "Blob update failed");
    }

    // --- Phase 3: Arbitration ---
    let resolutions = arbitration.advance_all()?;
    apply_resolutions(blobs, food, &resolutions)?;

    // --- Phase 4: Cleanup ---
    let before = food.len();
    food.retain(|_, site| !site.is_consumed());
    let food_consumed = before.saturating_sub(food.len());

    // --- Phase 5: Recall ---
    let recalled = if food.is_empty() {
        recall_blobs(blobs)?
    } else {
        0
    };

    let home = blobs.values().filter(|blob| blob.is_home()).count();
    debug!(
        epoch,
        tick,
        population = blobs.len(),
        home,
        food_consumed,
        food_remaining = food.len(),
        recalled,
        "Tick complete"
    );

    Ok(TickSummary {
        epoch,
        tick,
        population: blobs.len(),
        home,
        food_consumed,
        food_remaining: food.len(),
        recalled,
        failures,
    })
}

/// Send every blob that is not already homeward or home back home.
/// Returns how many were recalled.
pub fn recall_blobs(blobs: &mut BTreeMap<BlobId, Blob>) -> Result<usize, TickError> {
    let mut recalled: usize = 0;
    for (id, blob) in blobs.iter_mut() {
        if blob.state().is_returning() {
            continue;
        }
        blob.send_home()
            .map_err(|source| TickError::Agent { blob: *id, source })?;
        recalled = recalled.saturating_add(1);
    }
    Ok(recalled)
}

/// Run one blob's update, turning errors and panics into a failure record.
/// Errors that break the tick for every blob are passed up instead.
fn update_blob(
    id: BlobId,
    blob: &mut Blob,
    view: &WorldView<'_>,
) -> Option<Result<AgentFailure, TickError>> {
    match catch_unwind(AssertUnwindSafe(|| blob.process_next(view))) {
        Ok(Ok(())) => None,
        Ok(Err(err)) if err.is_tick_fault() => Some(Err(TickError::Agent {
            blob: id,
            source: err,
        })),
        Ok(Err(err)) => Some(Ok(AgentFailure {
            blob: id,
            message: err.to_string(),
        })),
        Err(payload) => Some(Ok(AgentFailure {
            blob: id,
            message: format!("panicked: {}", panic_message(&*payload)),
        })),
    }
}

/// Hand each resolved food site's rewards to its claimants and mark the
/// site consumed.
fn apply_resolutions(
    blobs: &mut BTreeMap<BlobId, Blob>,
    food: &mut BTreeMap<FoodId, FoodSite>,
    resolutions: &[Resolution],
) -> Result<(), TickError> {
    for resolution in resolutions {
        for award in &resolution.awards {
            let blob = blobs
                .get_mut(&award.blob)
                .ok_or(TickError::UnknownClaimant {
                    blob: award.blob,
                    food: resolution.food,
                })?;
            blob.raise_reward(award.reward);
            blob.send_home().map_err(|source| TickError::Agent {
                blob: award.blob,
                source,
            })?;
            debug!(blob = %award.blob, food = %resolution.food, reward = %award.reward, "Reward granted");
        }
        if let Some(site) = food.get_mut(&resolution.food) {
            site.consume();
        }
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::{Arc, Mutex};

    use forage_agents::{BlobState, BlobTraits};
    use forage_types::RewardLevel;
    use forage_world::{Position, ProximitySensor, SenseResult, Sensor};

    use super::*;

    #[derive(Debug)]
    struct PanickingSensor;

    impl Sensor for PanickingSensor {
        fn sense(
            &self,
            _blob: &BlobSnapshot,
            _view: &WorldView<'_>,
        ) -> Result<SenseResult, WorldError> {
            panic!("sensor exploded");
        }
    }

    /// Fails every query with a fixed world error.
    #[derive(Debug)]
    struct FailingSensor(fn() -> WorldError);

    impl Sensor for FailingSensor {
        fn sense(
            &self,
            _blob: &BlobSnapshot,
            _view: &WorldView<'_>,
        ) -> Result<SenseResult, WorldError> {
            Err((self.0)())
        }
    }

    /// Remembers every blob position it was shown and senses nothing.
    #[derive(Debug, Default)]
    struct RecordingSensor {
        seen: Mutex<Vec<BTreeMap<BlobId, Position>>>,
    }

    impl Sensor for RecordingSensor {
        fn sense(
            &self,
            _blob: &BlobSnapshot,
            view: &WorldView<'_>,
        ) -> Result<SenseResult, WorldError> {
            let everyone = view
                .blobs_near(Position::ORIGIN, 2.0)?
                .into_iter()
                .map(|b| (b.id, b.position))
                .collect();
            self.seen.lock().unwrap().push(everyone);
            Ok(SenseResult::default())
        }
    }

    fn traits(greedy: bool, step: f64, sensing: f64) -> BlobTraits {
        BlobTraits::new(greedy, step, Arc::new(ProximitySensor::new(sensing).unwrap())).unwrap()
    }

    fn blob_at(home: Position, traits: BlobTraits) -> Blob {
        let mut blob = Blob::seed(traits);
        blob.reset_for_epoch(home);
        blob
    }

    fn config() -> WorldConfig {
        WorldConfig {
            workers: 2,
            ..WorldConfig::default()
        }
    }

    fn open_state(blobs: Vec<Blob>, food: Vec<FoodSite>) -> SimulationState {
        let mut state = SimulationState::new(config(), blobs).unwrap();
        state.food = food.into_iter().map(|site| (site.id(), site)).collect();
        state.gate.open(0);
        state
    }

    #[test]
    fn tick_outside_epoch_is_fatal() {
        let mut state = SimulationState::new(config(), Vec::new()).unwrap();
        let err = run_tick(&mut state).unwrap_err();
        assert!(matches!(
            err,
            TickError::World {
                source: WorldError::Inactive
            }
        ));
    }

    #[test]
    fn lone_claimant_eats_after_lockup() {
        let food = FoodSite::new(Position::new(0.45, 0.0));
        let food_id = food.id();
        let blob = blob_at(Position::new(0.5, 0.0), traits(false, 0.1, 0.2));
        let blob_id = blob.id();
        let mut state = open_state(vec![blob], vec![food]);

        let first = run_tick(&mut state).unwrap();
        assert_eq!(first.tick, 1);
        assert_eq!(
            state.blobs.get(&blob_id).unwrap().state(),
            BlobState::AtFood { food: food_id }
        );

        run_tick(&mut state).unwrap();
        assert_eq!(state.food.len(), 1);

        let third = run_tick(&mut state).unwrap();
        assert_eq!(third.food_consumed, 1);
        assert_eq!(third.food_remaining, 0);
        assert!(state.food.is_empty());
        let blob = state.blobs.get(&blob_id).unwrap();
        assert_eq!(blob.reward(), RewardLevel::Full);
        assert!(blob.is_homeward());
        assert!(state.arbitration.is_empty().unwrap());
    }

    #[test]
    fn empty_board_recalls_everyone_in_the_same_tick() {
        let blobs = vec![
            blob_at(Position::on_boundary(0.0), traits(true, 0.1, 0.1)),
            blob_at(Position::on_boundary(2.0), traits(false, 0.1, 0.1)),
            blob_at(Position::on_boundary(4.0), traits(false, 0.1, 0.1)),
        ];
        let mut state = open_state(blobs, Vec::new());

        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.recalled, 3);
        assert!(state.blobs.values().all(|b| b.state().is_returning()));
    }

    #[test]
    fn last_food_consumed_recalls_searchers() {
        let food = FoodSite::new(Position::new(0.45, 0.0));
        let eater = blob_at(Position::new(0.5, 0.0), traits(false, 0.1, 0.2));
        let wanderer = blob_at(Position::on_boundary(3.0), traits(false, 0.05, 0.05));
        let wanderer_id = wanderer.id();
        let mut state = open_state(vec![eater, wanderer], vec![food]);

        for _ in 0..2 {
            let summary = run_tick(&mut state).unwrap();
            assert_eq!(summary.recalled, 0);
        }
        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.recalled, 1);
        assert!(state.blobs.get(&wanderer_id).unwrap().is_homeward());
    }

    #[test]
    fn panicking_blob_does_not_sink_the_tick() {
        let broken = BlobTraits::new(false, 0.1, Arc::new(PanickingSensor)).unwrap();
        let bad = blob_at(Position::on_boundary(1.0), broken);
        let bad_id = bad.id();
        let food = FoodSite::new(Position::new(0.45, 0.0));
        let food_id = food.id();
        let good = blob_at(Position::new(0.5, 0.0), traits(true, 0.1, 0.2));
        let good_id = good.id();
        let mut state = open_state(vec![bad, good], vec![food]);

        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.failures.len(), 1);
        let failure = summary.failures.first().unwrap();
        assert_eq!(failure.blob, bad_id);
        assert!(failure.message.contains("sensor exploded"));
        assert_eq!(
            state.blobs.get(&good_id).unwrap().state(),
            BlobState::AtFood { food: food_id }
        );
    }

    #[test]
    fn every_blob_senses_the_pre_tick_positions() {
        let sensor = Arc::new(RecordingSensor::default());
        let shared = BlobTraits::new(false, 0.1, Arc::clone(&sensor) as Arc<dyn Sensor>).unwrap();
        let blobs = vec![
            blob_at(Position::on_boundary(0.0), shared.clone()),
            blob_at(Position::on_boundary(2.0), shared),
        ];
        // Far from both blobs so nobody is recalled.
        let food = FoodSite::new(Position::new(0.9, 4.0));
        let mut state = open_state(blobs, vec![food]);

        for _ in 0..3 {
            let before: BTreeMap<BlobId, Position> = state
                .blobs
                .values()
                .map(|b| (b.id(), b.snapshot().position))
                .collect();
            sensor.seen.lock().unwrap().clear();

            run_tick(&mut state).unwrap();

            let seen = sensor.seen.lock().unwrap();
            assert_eq!(seen.len(), 2);
            assert!(seen.iter().all(|observed| *observed == before));
            for blob in state.blobs.values() {
                assert_ne!(Some(&blob.position()), before.get(&blob.id()));
            }
        }
    }

    #[test]
    fn sensor_fault_is_recorded_per_blob() {
        let broken = BlobTraits::new(
            false,
            0.1,
            Arc::new(FailingSensor(|| WorldError::InvalidParameter {
                name: "sensing_radius",
                reason: "negative".to_owned(),
            })),
        )
        .unwrap();
        let bad = blob_at(Position::on_boundary(1.0), broken);
        let bad_id = bad.id();
        let good = blob_at(Position::on_boundary(3.0), traits(false, 0.1, 0.1));
        let food = FoodSite::new(Position::new(0.2, 0.0));
        let mut state = open_state(vec![bad, good], vec![food]);

        let summary = run_tick(&mut state).unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures.first().unwrap().blob, bad_id);
    }

    #[test]
    fn tick_fault_inside_a_blob_aborts_the_tick() {
        let broken = BlobTraits::new(
            false,
            0.1,
            Arc::new(FailingSensor(|| WorldError::LockPoisoned {
                context: "arbitrator table".to_owned(),
            })),
        )
        .unwrap();
        let bad = blob_at(Position::on_boundary(1.0), broken);
        let bad_id = bad.id();
        let mut state = open_state(vec![bad], vec![FoodSite::new(Position::ORIGIN)]);

        let err = run_tick(&mut state).unwrap_err();

        assert!(matches!(
            err,
            TickError::Agent {
                blob,
                source: AgentError::World {
                    source: WorldError::LockPoisoned { .. },
                    ..
                },
            } if blob == bad_id
        ));
    }

    #[test]
    fn recall_skips_returning_blobs() {
        let mut homeward = blob_at(Position::on_boundary(0.0), traits(false, 0.1, 0.1));
        homeward.send_home().unwrap();
        let searching = blob_at(Position::on_boundary(1.0), traits(false, 0.1, 0.1));
        let mut blobs: BTreeMap<BlobId, Blob> = [homeward, searching]
            .into_iter()
            .map(|b| (b.id(), b))
            .collect();

        assert_eq!(recall_blobs(&mut blobs).unwrap(), 1);
        assert_eq!(recall_blobs(&mut blobs).unwrap(), 0);
    }

    #[test]
    fn panic_payloads_are_readable() {
        let static_payload: Box<dyn Any + Send> = Box::new("boom");
        let owned_payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let opaque_payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*static_payload), "boom");
        assert_eq!(panic_message(&*owned_payload), "bang");
        assert_eq!(panic_message(&*opaque_payload), "unknown panic");
    }
}
