//! Error types for the `forage-world` crate.
//!
//! Every variant here is a broken invariant rather than an expected runtime
//! condition. A full food site is not an error: [`try_claim`] simply returns
//! `false`.
//!
//! [`try_claim`]: crate::arbitration::ArbitratorStore::try_claim

use forage_types::FoodId;

use crate::gate::TickToken;

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// Shared world state was queried while no epoch was running.
    #[error("world state accessed outside an active tick")]
    Inactive,

    /// A token from an earlier tick or epoch was presented.
    #[error("stale tick token: expected {expected}, got {found}")]
    StaleToken {
        /// The token the gate would issue right now.
        expected: TickToken,
        /// The token that was presented.
        found: TickToken,
    },

    /// The tick counter would overflow.
    #[error("tick counter overflow")]
    TickOverflow,

    /// An arbitrator reached its lockup with a claimant count it cannot
    /// resolve (zero, or more than the per-food capacity).
    #[error("food {food} has {count} claimants at resolution")]
    InvalidClaimantCount {
        /// The food site being resolved.
        food: FoodId,
        /// The number of claimants found.
        count: usize,
    },

    /// A lock in the arbitration table was poisoned by a panicking holder.
    #[error("lock poisoned: {context}")]
    LockPoisoned {
        /// Which lock was poisoned.
        context: String,
    },

    /// A constructor was given a value outside its valid range.
    #[error("invalid {name}: {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl WorldError {
    /// Whether the error breaks the tick for every blob rather than one
    /// blob's query: a closed gate, a stale token, a poisoned lock, or a
    /// corrupt arbitrator.
    pub const fn is_tick_fault(&self) -> bool {
        matches!(
            self,
            Self::Inactive
                | Self::StaleToken { .. }
                | Self::TickOverflow
                | Self::InvalidClaimantCount { .. }
                | Self::LockPoisoned { .. }
        )
    }
}
