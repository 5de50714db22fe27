//! The read-only world view handed to every blob during the agent phase.
//!
//! All blobs in a tick see the same pre-tick snapshot of positions. The only
//! shared state they may change through the view is the arbitration table,
//! and that goes through [`ArbitratorStore::try_claim`]'s per-food lock.
//!
//! [`ArbitratorStore::try_claim`]: crate::arbitration::ArbitratorStore::try_claim

use forage_types::{BlobId, FoodId};

use crate::arbitration::{ArbitratorStore, Claimant};
use crate::error::WorldError;
use crate::gate::{TickGate, TickToken};
use crate::position::Position;

/// Where a blob stood at the start of the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlobSnapshot {
    /// The blob.
    pub id: BlobId,
    /// Its pre-tick position.
    pub position: Position,
}

/// Where a live food site sits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodSnapshot {
    /// The food site.
    pub id: FoodId,
    /// Its position.
    pub position: Position,
}

/// A tick-scoped view of the world.
///
/// Every query re-validates the view's [`TickToken`] against the gate, so a
/// view can only be used inside the tick it was built for.
#[derive(Debug, Clone, Copy)]
pub struct WorldView<'a> {
    /// The tick this view belongs to.
    token: TickToken,
    /// The gate that issued the token.
    gate: &'a TickGate,
    /// Live blobs at the start of the tick.
    blobs: &'a [BlobSnapshot],
    /// Live food sites at the start of the tick.
    food: &'a [FoodSnapshot],
    /// Shared claim table.
    arbitration: &'a ArbitratorStore,
}

impl<'a> WorldView<'a> {
    /// Build a view for `token`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::Inactive`] if the gate is closed or
    /// [`WorldError::StaleToken`] if `token` is not the current tick's.
    pub fn new(
        gate: &'a TickGate,
        token: TickToken,
        blobs: &'a [BlobSnapshot],
        food: &'a [FoodSnapshot],
        arbitration: &'a ArbitratorStore,
    ) -> Result<Self, WorldError> {
        gate.check(token)?;
        Ok(Self {
            token,
            gate,
            blobs,
            food,
            arbitration,
        })
    }

    /// The tick this view belongs to.
    pub const fn token(&self) -> TickToken {
        self.token
    }

    /// Blobs within `radius` of `center` (inclusive), including any blob
    /// standing exactly on `center`.
    pub fn blobs_near(
        &self,
        center: Position,
        radius: f64,
    ) -> Result<Vec<BlobSnapshot>, WorldError> {
        self.ensure_active()?;
        Ok(self
            .blobs
            .iter()
            .filter(|b| b.position.distance(center) <= radius)
            .copied()
            .collect())
    }

    /// Food sites within `radius` of `center` (inclusive).
    pub fn food_near(&self, center: Position, radius: f64) -> Result<Vec<FoodSnapshot>, WorldError> {
        self.ensure_active()?;
        Ok(self
            .food
            .iter()
            .filter(|f| f.position.distance(center) <= radius)
            .copied()
            .collect())
    }

    /// Whether `food` can still take a claim.
    pub fn is_available(&self, food: FoodId) -> Result<bool, WorldError> {
        self.ensure_active()?;
        self.arbitration.is_available(food)
    }

    /// Claim `food`. `Ok(false)` means the site is full.
    pub fn try_claim(&self, food: FoodId, claimant: Claimant) -> Result<bool, WorldError> {
        self.ensure_active()?;
        self.arbitration.try_claim(food, claimant)
    }

    fn ensure_active(&self) -> Result<(), WorldError> {
        self.gate.check(self.token)
    }
}
