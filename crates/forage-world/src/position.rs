//! Polar-coordinate positions on the unit disk.
//!
//! A [`Position`] is a `(radius, angle)` pair. Homes sit on the rim at fixed
//! angular spacing, which is why the world is addressed in polar form rather
//! than Cartesian. Movement is computed in Cartesian space and converted
//! back.
//!
//! # Fold-back
//!
//! A step that would leave the disk (radius > 1) does not clamp. The new
//! radius becomes `1 - (radius mod 1)` and the angle is negated, so the blob
//! re-enters on the mirrored side. Directed and random steps share the same
//! rule.

use core::f64::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Below this length a direction vector is treated as zero.
const DEGENERATE_DIRECTION: f64 = 1e-12;

/// A point on the unit disk in polar coordinates.
///
/// The angle is always normalized into `[0, 2π)`. Positions are plain
/// values: assigning one into a blob or food site copies it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Distance from the centre. Conceptually in `[0, 1]`.
    radius: f64,
    /// Angle in radians, normalized into `[0, 2π)`.
    angle: f64,
}

impl Position {
    /// The centre of the disk.
    pub const ORIGIN: Self = Self {
        radius: 0.0,
        angle: 0.0,
    };

    /// Create a position, normalizing the angle into `[0, 2π)`.
    pub fn new(radius: f64, angle: f64) -> Self {
        Self {
            radius,
            angle: normalize_angle(angle),
        }
    }

    /// A point on the rim of the disk at the given angle.
    pub fn on_boundary(angle: f64) -> Self {
        Self::new(1.0, angle)
    }

    /// A point with uniform random radius in `[0, 1)` and uniform random
    /// angle. This is how food is scattered each epoch.
    pub fn random_in_disk<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let radius: f64 = rng.random();
        let turn: f64 = rng.random();
        Self::new(radius, TAU * turn)
    }

    /// Convert a Cartesian point back to polar form without folding.
    pub fn from_cartesian(x: f64, y: f64) -> Self {
        Self::new(x.hypot(y), y.atan2(x))
    }

    /// Distance from the centre.
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Angle in radians, in `[0, 2π)`.
    pub const fn angle(&self) -> f64 {
        self.angle
    }

    /// Cartesian `(x, y)` coordinates.
    pub fn to_cartesian(self) -> (f64, f64) {
        let (sin, cos) = self.angle.sin_cos();
        (self.radius * cos, self.radius * sin)
    }

    /// Euclidean distance between two positions.
    pub fn distance(self, other: Self) -> f64 {
        let (x1, y1) = self.to_cartesian();
        let (x2, y2) = other.to_cartesian();
        (x2 - x1).hypot(y2 - y1)
    }

    /// Advance `step` along the straight line toward `target`, then apply
    /// the fold-back rule.
    ///
    /// When `self` and `target` coincide there is no direction to walk in
    /// and the position is left unchanged.
    pub fn step_toward(&mut self, target: Self, step: f64) {
        let (x1, y1) = self.to_cartesian();
        let (x2, y2) = target.to_cartesian();
        let (dx, dy) = (x2 - x1, y2 - y1);
        let length = dx.hypot(dy);
        if length < DEGENERATE_DIRECTION {
            return;
        }
        *self = fold_back((dx / length).mul_add(step, x1), (dy / length).mul_add(step, y1));
    }

    /// Advance `step` in a uniformly random direction, then apply the
    /// fold-back rule.
    pub fn random_step<R: Rng + ?Sized>(&mut self, step: f64, rng: &mut R) {
        let turn: f64 = rng.random();
        let (sin, cos) = (TAU * turn).sin_cos();
        let (x, y) = self.to_cartesian();
        *self = fold_back(step.mul_add(cos, x), step.mul_add(sin, y));
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "(r={:.4}, θ={:.4})", self.radius, self.angle)
    }
}

/// Convert a Cartesian point to polar form, reflecting it back inside the
/// disk when it lies beyond the rim.
fn fold_back(x: f64, y: f64) -> Position {
    let radius = x.hypot(y);
    let angle = y.atan2(x);
    if radius > 1.0 {
        Position::new(1.0 - radius % 1.0, -angle)
    } else {
        Position::new(radius, angle)
    }
}

/// Map any angle into `[0, 2π)`.
fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}
