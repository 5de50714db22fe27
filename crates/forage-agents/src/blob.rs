//! Blobs: the foraging agents.
//!
//! A [`Blob`] owns its position, home, behavior state, and reward. Its
//! [`BlobTraits`] (greediness, step size, sensor) are fixed for life and
//! shared with its descendants.
//!
//! [`Blob::process_next`] is the single per-tick dispatch over
//! [`BlobState`]. It only mutates the blob itself; the one shared effect it
//! can have is a claim recorded through the [`WorldView`].

use std::sync::Arc;

use forage_types::{BlobId, BlobStatus, RewardLevel};
use forage_world::{BlobSnapshot, Claimant, FoodSnapshot, Position, Sensor, WorldError, WorldView};
use tracing::debug;

use crate::error::AgentError;
use crate::state::BlobState;

/// Behavioral parameters fixed at creation and inherited by descendants.
#[derive(Debug, Clone)]
pub struct BlobTraits {
    /// Whether the blob refuses to share food.
    greedy: bool,
    /// Distance covered per tick.
    step_size: f64,
    /// How the blob perceives its surroundings.
    sensor: Arc<dyn Sensor>,
}

impl BlobTraits {
    /// Bundle a blob's parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidTraits`] if `step_size` is not a
    /// positive finite number.
    pub fn new(greedy: bool, step_size: f64, sensor: Arc<dyn Sensor>) -> Result<Self, AgentError> {
        if !step_size.is_finite() || step_size <= 0.0 {
            return Err(AgentError::InvalidTraits {
                reason: format!("step size must be positive and finite, got {step_size}"),
            });
        }
        Ok(Self {
            greedy,
            step_size,
            sensor,
        })
    }

    /// Whether the blob refuses to share.
    pub const fn greedy(&self) -> bool {
        self.greedy
    }

    /// Distance covered per tick.
    pub const fn step_size(&self) -> f64 {
        self.step_size
    }

    /// The blob's sensor.
    pub fn sensor(&self) -> &dyn Sensor {
        self.sensor.as_ref()
    }
}

/// A foraging agent.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Stable identity.
    id: BlobId,
    /// Immutable parameters.
    traits: BlobTraits,
    /// 0 for seeded blobs, parent + 1 for descendants.
    generation: u32,
    /// The blob this one descends from, if any.
    parent: Option<BlobId>,
    /// Current position.
    position: Position,
    /// Where the blob returns to at the end of the epoch.
    home: Position,
    /// Behavior state.
    state: BlobState,
    /// Reward earned this epoch.
    reward: RewardLevel,
}

impl Blob {
    /// Create a generation-0 blob at the origin, searching, with no reward.
    /// Position and home are assigned when an epoch places it.
    pub fn seed(traits: BlobTraits) -> Self {
        Self {
            id: BlobId::new(),
            traits,
            generation: 0,
            parent: None,
            position: Position::ORIGIN,
            home: Position::ORIGIN,
            state: BlobState::Searching,
            reward: RewardLevel::None,
        }
    }

    /// Create a descendant: fresh id, same traits, starting at this blob's
    /// home with a clean state and no reward.
    pub fn descend(&self) -> Self {
        Self {
            id: BlobId::new(),
            traits: self.traits.clone(),
            generation: self.generation.saturating_add(1),
            parent: Some(self.id),
            position: self.home,
            home: self.home,
            state: BlobState::Searching,
            reward: RewardLevel::None,
        }
    }

    /// The blob's identifier.
    pub const fn id(&self) -> BlobId {
        self.id
    }

    /// Immutable parameters.
    pub const fn traits(&self) -> &BlobTraits {
        &self.traits
    }

    /// Whether the blob refuses to share.
    pub const fn is_greedy(&self) -> bool {
        self.traits.greedy
    }

    /// Generation number.
    pub const fn generation(&self) -> u32 {
        self.generation
    }

    /// Parent blob, if this is a descendant.
    pub const fn parent(&self) -> Option<BlobId> {
        self.parent
    }

    /// Current position.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Home position.
    pub const fn home(&self) -> Position {
        self.home
    }

    /// Current behavior state.
    pub const fn state(&self) -> BlobState {
        self.state
    }

    /// Tag of the current behavior state.
    pub const fn status(&self) -> BlobStatus {
        self.state.status()
    }

    /// Reward earned this epoch.
    pub const fn reward(&self) -> RewardLevel {
        self.reward
    }

    /// Whether the blob is home.
    pub const fn is_home(&self) -> bool {
        matches!(self.state, BlobState::Home)
    }

    /// Whether the blob is walking home.
    pub const fn is_homeward(&self) -> bool {
        matches!(self.state, BlobState::Homeward)
    }

    /// This blob as seen by others at the start of a tick.
    pub const fn snapshot(&self) -> BlobSnapshot {
        BlobSnapshot {
            id: self.id,
            position: self.position,
        }
    }

    /// This blob as a food claimant.
    pub const fn claimant(&self) -> Claimant {
        Claimant {
            blob: self.id,
            greedy: self.traits.greedy,
        }
    }

    /// Prepare for a new epoch: stand at `home`, start searching, forget any
    /// reward.
    pub const fn reset_for_epoch(&mut self, home: Position) {
        self.position = home;
        self.home = home;
        self.state = BlobState::Searching;
        self.reward = RewardLevel::None;
    }

    /// Raise the reward to `reward`. Lower levels are ignored. Returns
    /// whether the reward changed.
    pub fn raise_reward(&mut self, reward: RewardLevel) -> bool {
        if reward > self.reward {
            self.reward = reward;
            true
        } else {
            false
        }
    }

    /// Turn the blob toward home.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::AlreadyHome`] if the blob is already home.
    pub fn send_home(&mut self) -> Result<(), AgentError> {
        if self.is_home() {
            return Err(AgentError::AlreadyHome(self.id));
        }
        self.state = BlobState::Homeward;
        Ok(())
    }

    /// Run one tick of behavior against `view`.
    pub fn process_next(&mut self, view: &WorldView<'_>) -> Result<(), AgentError> {
        match self.state {
            BlobState::Searching => self.search(view),
            // The arbitrator decides when a parked blob leaves.
            BlobState::AtFood { .. } | BlobState::Home => Ok(()),
            BlobState::Homeward => {
                self.walk_home();
                Ok(())
            }
        }
    }

    /// Searching: claim reachable food, otherwise approach visible food,
    /// otherwise wander.
    fn search(&mut self, view: &WorldView<'_>) -> Result<(), AgentError> {
        let step = self.traits.step_size;
        let sensed = self
            .traits
            .sensor
            .sense(&self.snapshot(), view)
            .map_err(|source| self.world_error(source))?;

        let mut available: Vec<FoodSnapshot> = Vec::with_capacity(sensed.food.len());
        for food in sensed.food {
            let open = view
                .is_available(food.id)
                .map_err(|source| self.world_error(source))?;
            if open {
                available.push(food);
            }
        }

        if available.is_empty() {
            self.position.random_step(step, &mut rand::rng());
            return Ok(());
        }

        let here = self.position;
        let (reachable, distant): (Vec<FoodSnapshot>, Vec<FoodSnapshot>) = available
            .into_iter()
            .partition(|food| here.distance(food.position) <= step);

        for food in &reachable {
            let claimed = view
                .try_claim(food.id, self.claimant())
                .map_err(|source| self.world_error(source))?;
            if claimed {
                debug!(blob = %self.id, food = %food.id, greedy = self.traits.greedy, "Blob claimed food");
                self.state = BlobState::AtFood { food: food.id };
                self.position = food.position;
                return Ok(());
            }
        }

        match distant.first() {
            Some(target) => self.position.step_toward(target.position, step),
            None => self.position.random_step(step, &mut rand::rng()),
        }
        Ok(())
    }

    /// Homeward: step toward home, snapping onto it once within one step.
    fn walk_home(&mut self) {
        let step = self.traits.step_size;
        if self.position.distance(self.home) <= step {
            self.position = self.home;
            self.state = BlobState::Home;
        } else {
            self.position.step_toward(self.home, step);
        }
    }

    const fn world_error(&self, source: WorldError) -> AgentError {
        AgentError::World {
            blob: self.id,
            source,
        }
    }
}
