//! Configuration loading and typed config structures for the Forage simulation.
//!
//! The canonical configuration lives in `forage-config.yaml`. Every section
//! and field is optional; missing values fall back to the defaults below.
//!
//! | Section | Field | Default |
//! |---------|-------|---------|
//! | `world` | `epochs` | 10 |
//! | `world` | `food_per_epoch` | 10 |
//! | `world` | `food_lockup_ticks` | 3 |
//! | `world` | `max_ticks_per_epoch` | 10 000 |
//! | `world` | `workers` | 0 (one per core) |
//! | `world` | `epoch_interval_ms` | 0 |
//! | `population` | `initial_blobs` | 20 |
//! | `population` | `greedy_fraction` | 0.5 |
//! | `blobs` | `sensing_radius` | 0.1 |
//! | `blobs` | `step_size` | 0.1 |
//! | `logging` | `level` | `info` |
//! | `logging` | `json` | false |

use std::path::Path;

use serde::Deserialize;

/// Overrides `world.epochs`.
pub const ENV_EPOCHS: &str = "FORAGE_EPOCHS";

/// Overrides `world.workers`.
pub const ENV_WORKERS: &str = "FORAGE_WORKERS";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Epoch and tick settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Initial population.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Per-blob movement and sensing.
    #[serde(default)]
    pub blobs: BlobConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `FORAGE_EPOCHS` and `FORAGE_WORKERS` override the file when set.
    /// The result is validated before it is returned.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, apply environment overrides,
    /// and validate.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FORAGE_*` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_EPOCHS) {
            self.world.epochs = parse_override("world.epochs", &raw)?;
        }
        if let Some(raw) = lookup(ENV_WORKERS) {
            self.world.workers = parse_override("world.workers", &raw)?;
        }
        Ok(())
    }

    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.world.epochs == 0 {
            return Err(invalid("world.epochs", "must be at least 1"));
        }
        if self.world.food_lockup_ticks == 0 {
            return Err(invalid("world.food_lockup_ticks", "must be at least 1"));
        }
        if self.world.max_ticks_per_epoch == 0 {
            return Err(invalid("world.max_ticks_per_epoch", "must be at least 1"));
        }
        if self.population.initial_blobs == 0 {
            return Err(invalid("population.initial_blobs", "must be at least 1"));
        }
        let fraction = self.population.greedy_fraction;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(invalid(
                "population.greedy_fraction",
                format!("must be within [0, 1], got {fraction}"),
            ));
        }
        check_positive("blobs.sensing_radius", self.blobs.sensing_radius)?;
        check_positive("blobs.step_size", self.blobs.step_size)?;
        Ok(())
    }
}

/// Epoch and tick configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Number of epochs to run.
    #[serde(default = "default_epochs")]
    pub epochs: u32,

    /// Food sites scattered at the start of each epoch.
    #[serde(default = "default_food_per_epoch")]
    pub food_per_epoch: u32,

    /// Ticks a claimed food site stays open before it resolves.
    #[serde(default = "default_food_lockup_ticks")]
    pub food_lockup_ticks: u32,

    /// Tick count after which every blob is recalled home.
    #[serde(default = "default_max_ticks_per_epoch")]
    pub max_ticks_per_epoch: u64,

    /// Worker threads for the agent phase. 0 means one per core.
    #[serde(default)]
    pub workers: usize,

    /// Real-time pause between epochs.
    #[serde(default)]
    pub epoch_interval_ms: u64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            food_per_epoch: default_food_per_epoch(),
            food_lockup_ticks: default_food_lockup_ticks(),
            max_ticks_per_epoch: default_max_ticks_per_epoch(),
            workers: 0,
            epoch_interval_ms: 0,
        }
    }
}

/// Initial population configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PopulationConfig {
    /// Blobs seeded before the first epoch.
    #[serde(default = "default_initial_blobs")]
    pub initial_blobs: u32,

    /// Share of seeded blobs that are greedy, in `[0, 1]`.
    #[serde(default = "default_greedy_fraction")]
    pub greedy_fraction: f64,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_blobs: default_initial_blobs(),
            greedy_fraction: default_greedy_fraction(),
        }
    }
}

/// Movement and sensing shared by every seeded blob.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlobConfig {
    /// Radius of the proximity sensor.
    #[serde(default = "default_sensing_radius")]
    pub sensing_radius: f64,

    /// Distance covered per tick.
    #[serde(default = "default_step_size")]
    pub step_size: f64,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            sensing_radius: default_sensing_radius(),
            step_size: default_step_size(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn parse_override<T>(field: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr,
    T::Err: core::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| invalid(field, format!("cannot parse {raw:?}: {e}")))
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("must be positive and finite, got {value}")))
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

const fn default_epochs() -> u32 {
    10
}

const fn default_food_per_epoch() -> u32 {
    10
}

const fn default_food_lockup_ticks() -> u32 {
    3
}

const fn default_max_ticks_per_epoch() -> u64 {
    10_000
}

const fn default_initial_blobs() -> u32 {
    20
}

const fn default_greedy_fraction() -> f64 {
    0.5
}

const fn default_sensing_radius() -> f64 {
    0.1
}

const fn default_step_size() -> f64 {
    0.1
}

fn default_log_level() -> String {
    "info".to_owned()
}
