//! Shared type definitions for the Forage simulation.
//!
//! Every crate in the workspace speaks in these types: the identifiers that
//! key blobs and food sites, and the small enums that describe rewards and
//! life-states. Nothing in here carries behavior beyond ordering and display.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for blob and food identifiers
//! - [`enums`] -- Reward levels, food life-states, and blob status tags

pub mod enums;
pub mod ids;

pub use enums::{BlobStatus, FoodState, RewardLevel};
pub use ids::{BlobId, FoodId};
