//! Behavior states for a blob.
//!
//! ```text
//! Searching ──claim──▶ AtFood ──(arbitrator resolves)──▶ Homeward ──▶ Home
//!     └─────────────(food exhausted / recall)──────────────▲
//! ```
//!
//! `AtFood` is the one state a blob cannot leave by itself: its arbitrator
//! sends it home when the food resolves.

use forage_types::{BlobStatus, FoodId};

/// Where a blob is in its epoch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BlobState {
    /// Wandering, sensing, and trying to claim food.
    #[default]
    Searching,
    /// Parked on a claimed food site until it resolves.
    AtFood {
        /// The claimed food site.
        food: FoodId,
    },
    /// Walking back toward home.
    Homeward,
    /// Home for the rest of the epoch.
    Home,
}

impl BlobState {
    /// The state's tag.
    pub const fn status(self) -> BlobStatus {
        match self {
            Self::Searching => BlobStatus::Searching,
            Self::AtFood { .. } => BlobStatus::AtFood,
            Self::Homeward => BlobStatus::Homeward,
            Self::Home => BlobStatus::Home,
        }
    }

    /// Whether the blob is home or on its way there.
    pub const fn is_returning(self) -> bool {
        matches!(self, Self::Homeward | Self::Home)
    }
}
