//! Blob behavior, rewards, and population lifecycle for the Forage simulation.
//!
//! This crate holds the logic layer for blobs: the four-state behavior
//! machine that drives movement and food claims each tick, the reward a blob
//! accumulates during an epoch, and the death/survival/reproduction rule
//! applied between epochs. It reads the world only through
//! [`forage_world::WorldView`] and never owns shared state.
//!
//! # Modules
//!
//! - [`blob`] -- [`Blob`] and its immutable [`BlobTraits`]
//! - [`error`] -- Error types for blob operations ([`AgentError`])
//! - [`lifecycle`] -- End-of-epoch [`Fate`] and [`next_generation`]
//! - [`state`] -- The [`BlobState`] variants

pub mod blob;
pub mod error;
pub mod lifecycle;
pub mod state;

// Re-export primary types at crate root for convenience.
pub use blob::{Blob, BlobTraits};
pub use error::AgentError;
pub use lifecycle::{DESCENDANTS_PER_FULL_BLOB, Fate, GenerationReport, fate, next_generation};
pub use state::BlobState;
