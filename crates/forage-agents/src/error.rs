//! Error types for the forage-agents crate.
//!
//! A blob that cannot claim a full food site is not an error. Everything
//! here signals a broken precondition: a bad parameter at construction, a
//! home command for a blob that is already home, or a world query that the
//! world refused.

use forage_types::BlobId;
use forage_world::WorldError;

/// Errors that can occur during blob operations.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A blob that is already home was told to go home.
    #[error("blob {0} is already home")]
    AlreadyHome(BlobId),

    /// A world query made on behalf of a blob failed.
    #[error("world error for blob {blob}: {source}")]
    World {
        /// The blob whose update failed.
        blob: BlobId,
        /// The underlying world error.
        source: WorldError,
    },

    /// Blob traits failed validation.
    #[error("invalid blob traits: {reason}")]
    InvalidTraits {
        /// Description of what is wrong.
        reason: String,
    },
}

impl AgentError {
    /// Whether a world error behind this failure affects the whole tick.
    pub const fn is_tick_fault(&self) -> bool {
        matches!(self, Self::World { source, .. } if source.is_tick_fault())
    }
}
