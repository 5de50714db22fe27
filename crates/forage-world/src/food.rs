//! Food sites and their life-state.
//!
//! A [`FoodSite`] is created during per-epoch placement and starts
//! [`FoodState::Available`]. Its arbitrator flips it to
//! [`FoodState::Consumed`] once the lockup period elapses, and the tick
//! cycle removes it from the board at the end of that same tick.

use forage_types::{FoodId, FoodState};

use crate::position::Position;
use crate::view::FoodSnapshot;

/// A single food site on the disk.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodSite {
    /// Stable identity, also the key into the arbitration table.
    id: FoodId,
    /// Where the food sits. Food never moves.
    position: Position,
    /// Available until its arbitrator resolves it.
    state: FoodState,
}

impl FoodSite {
    /// Create an available food site at `position` with a fresh id.
    pub fn new(position: Position) -> Self {
        Self {
            id: FoodId::new(),
            position,
            state: FoodState::Available,
        }
    }

    /// The food site's identifier.
    pub const fn id(&self) -> FoodId {
        self.id
    }

    /// Where the food sits.
    pub const fn position(&self) -> Position {
        self.position
    }

    /// Current life-state.
    pub const fn state(&self) -> FoodState {
        self.state
    }

    /// Whether the site has been eaten.
    pub const fn is_consumed(&self) -> bool {
        matches!(self.state, FoodState::Consumed)
    }

    /// Mark the site eaten. Idempotent.
    pub const fn consume(&mut self) {
        self.state = FoodState::Consumed;
    }

    /// Read-only copy for the per-tick world view.
    pub const fn snapshot(&self) -> FoodSnapshot {
        FoodSnapshot {
            id: self.id,
            position: self.position,
        }
    }
}
