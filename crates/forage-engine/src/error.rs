//! Error types for the Forage engine binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during engine startup and simulation execution.

/// Top-level error for the Forage engine binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: forage_core::config::ConfigError,
    },

    /// Population seeding failed.
    #[error("spawn error: {source}")]
    Spawn {
        /// The underlying spawner error.
        #[from]
        source: forage_core::spawner::SpawnError,
    },

    /// Simulation state could not be assembled.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: forage_core::tick::TickError,
    },

    /// Simulation runner failed.
    #[error("runner error: {source}")]
    Runner {
        /// The underlying runner error.
        #[from]
        source: forage_core::runner::RunnerError,
    },

    /// The run report could not be serialized.
    #[error("report serialization error: {source}")]
    Report {
        /// The underlying JSON error.
        #[from]
        source: serde_json::Error,
    },

    /// The run report could not be written.
    #[error("failed to write report to {path}: {source}")]
    ReportIo {
        /// Destination path.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },
}
