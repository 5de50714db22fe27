//! Tick cycle, epoch controller, and orchestration for the Forage simulation.
//!
//! This crate owns the loop that drives the simulation: seed a population,
//! then run epochs of parallel foraging ticks, each followed by the
//! death/survival/reproduction update.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `forage-config.yaml` into
//!   strongly-typed structs.
//! - [`epoch`] -- [`run_epoch`]: placement, ticking until every blob is
//!   home, and the lifecycle update.
//! - [`runner`] -- [`run_simulation`], the async multi-epoch loop.
//! - [`spawner`] -- [`seed_population`] for the generation-0 blobs.
//! - [`tick`] -- The fork-join tick cycle and [`SimulationState`].
//!
//! [`run_epoch`]: epoch::run_epoch
//! [`run_simulation`]: runner::run_simulation
//! [`seed_population`]: spawner::seed_population
//! [`SimulationState`]: tick::SimulationState

pub mod config;
pub mod epoch;
pub mod runner;
pub mod spawner;
pub mod tick;
