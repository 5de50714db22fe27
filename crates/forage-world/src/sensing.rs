//! The sensing capability.
//!
//! A [`Sensor`] answers one question for a blob: which other blobs and which
//! food sites are close enough to notice right now. Blobs hold their sensor
//! as a trait object, so alternatives (a spatial index, a noisy sensor) can
//! be swapped in as long as they keep the same inclusion rule:
//! `distance <= radius`, and never the sensing blob itself.

use crate::error::WorldError;
use crate::view::{BlobSnapshot, FoodSnapshot, WorldView};

/// What a blob noticed this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SenseResult {
    /// Other live blobs in range.
    pub blobs: Vec<BlobSnapshot>,
    /// Live food sites in range.
    pub food: Vec<FoodSnapshot>,
}

/// A way for a blob to perceive its surroundings.
pub trait Sensor: Send + Sync + core::fmt::Debug {
    /// Sense around `blob` using the current tick's `view`.
    ///
    /// # Errors
    ///
    /// Propagates [`WorldError`] from the view, e.g. when the tick is over.
    fn sense(&self, blob: &BlobSnapshot, view: &WorldView<'_>) -> Result<SenseResult, WorldError>;
}

/// Linear-scan proximity sensing with a fixed radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximitySensor {
    /// Sensing radius, inclusive.
    radius: f64,
}

impl ProximitySensor {
    /// Create a sensor with the given radius.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidParameter`] if `radius` is not a
    /// positive finite number.
    pub fn new(radius: f64) -> Result<Self, WorldError> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(WorldError::InvalidParameter {
                name: "sensing_radius",
                reason: format!("must be positive and finite, got {radius}"),
            });
        }
        Ok(Self { radius })
    }

    /// The sensing radius.
    pub const fn radius(&self) -> f64 {
        self.radius
    }
}

impl Sensor for ProximitySensor {
    fn sense(&self, blob: &BlobSnapshot, view: &WorldView<'_>) -> Result<SenseResult, WorldError> {
        let mut blobs = view.blobs_near(blob.position, self.radius)?;
        blobs.retain(|other| other.id != blob.id);
        let food = view.food_near(blob.position, self.radius)?;
        Ok(SenseResult { blobs, food })
    }
}
