//! Disk geometry, food sites, arbitration, and sensing for the Forage simulation.
//!
//! This crate models the shared world that blobs move through: a unit disk
//! addressed in polar coordinates, food sites scattered inside it, and the
//! per-food arbitration table that settles who eats what when several blobs
//! reach the same site.
//!
//! # Modules
//!
//! - [`arbitration`] -- [`Arbitrator`] per food site and the sharded
//!   [`ArbitratorStore`] lock table that serializes concurrent claims.
//! - [`error`] -- Error types for world operations.
//! - [`food`] -- [`FoodSite`] with its available/consumed life-state.
//! - [`gate`] -- [`TickGate`] and [`TickToken`], the guard that keeps world
//!   queries inside an active tick.
//! - [`position`] -- [`Position`] geometry: distance, directed step, random
//!   step, and the fold-back boundary rule.
//! - [`sensing`] -- The [`Sensor`] capability and [`ProximitySensor`].
//! - [`view`] -- [`WorldView`], the read-only per-tick snapshot handed to
//!   every blob.
//!
//! [`Arbitrator`]: arbitration::Arbitrator
//! [`ArbitratorStore`]: arbitration::ArbitratorStore
//! [`FoodSite`]: food::FoodSite
//! [`TickGate`]: gate::TickGate
//! [`TickToken`]: gate::TickToken
//! [`Position`]: position::Position
//! [`Sensor`]: sensing::Sensor
//! [`ProximitySensor`]: sensing::ProximitySensor
//! [`WorldView`]: view::WorldView

pub mod arbitration;
pub mod error;
pub mod food;
pub mod gate;
pub mod position;
pub mod sensing;
pub mod view;

// Re-export primary types at crate root.
pub use arbitration::{
    Arbitrator, ArbitratorStore, Award, Claimant, MAX_CLAIMANTS_PER_FOOD, Resolution,
    split_rewards,
};
pub use error::WorldError;
pub use food::FoodSite;
pub use gate::{TickGate, TickToken};
pub use position::Position;
pub use sensing::{ProximitySensor, SenseResult, Sensor};
pub use view::{BlobSnapshot, FoodSnapshot, WorldView};
