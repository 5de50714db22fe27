//! Enumeration types for the Forage simulation.

use serde::{Deserialize, Serialize};

/// How much a blob ate during the current epoch.
///
/// The derived ordering (`None < Half < Full`) is meaningful: rewards only
/// ever move upward within an epoch.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RewardLevel {
    /// Nothing eaten. The blob dies at the end of the epoch.
    #[default]
    None,
    /// Shared a food site. The blob survives into the next epoch.
    Half,
    /// Ate a whole food site. The blob is replaced by two descendants.
    Full,
}

impl core::fmt::Display for RewardLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Half => write!(f, "half"),
            Self::Full => write!(f, "full"),
        }
    }
}

/// Life-state of a food site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodState {
    /// Still on the board and claimable.
    #[default]
    Available,
    /// Resolved by its arbitrator; removed at the end of the tick.
    Consumed,
}

/// Tag of a blob's behavior state, without the state's payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlobStatus {
    /// Wandering and looking for food.
    Searching,
    /// Sitting on a claimed food site, waiting for arbitration.
    AtFood,
    /// Walking back to its home position.
    Homeward,
    /// Home. Nothing more happens this epoch.
    Home,
}

impl core::fmt::Display for BlobStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Searching => write!(f, "searching"),
            Self::AtFood => write!(f, "at_food"),
            Self::Homeward => write!(f, "homeward"),
            Self::Home => write!(f, "home"),
        }
    }
}
