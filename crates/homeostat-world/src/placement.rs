//! Overlap-aware placement of spawned entities.
//!
//! A spawn candidate is the entity's base footprint scaled by its spawn
//! scale and grown by a padding margin. It is rejected if it intersects any
//! occupied box. After [`MAX_PLACEMENT_ATTEMPTS`] rejections the caller's
//! fallback position is accepted and a warning is logged; placement never
//! fails hard.

use homeostat_types::{Aabb, Vec2};
use rand::Rng;
use serde::Deserialize;
use tracing::warn;

/// Number of random candidates tried before accepting the fallback.
pub const MAX_PLACEMENT_ATTEMPTS: u32 = 100;

/// Default padding added around every candidate footprint.
pub const DEFAULT_OVERLAP_PADDING: f64 = 2.0;

/// Axis-aligned range sampled independently and uniformly per axis.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PositionRange {
    /// Inclusive lower corner.
    pub min: Vec2,
    /// Inclusive upper corner.
    pub max: Vec2,
}

impl PositionRange {
    /// A degenerate range containing exactly one point.
    pub const fn point(at: Vec2) -> Self {
        Self { min: at, max: at }
    }

    /// Midpoint of the range.
    pub fn center(&self) -> Vec2 {
        self.min.plus(self.max).scale(0.5)
    }

    /// Translate the range by `offset`.
    #[must_use]
    pub fn offset(&self, offset: Vec2) -> Self {
        Self {
            min: self.min.plus(offset),
            max: self.max.plus(offset),
        }
    }

    /// Whether `min <= max` on both axes.
    pub fn is_ordered(&self) -> bool {
        self.min.x <= self.max.x && self.min.z <= self.max.z
    }

    /// Draw a uniform point from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            sample_between(rng, self.min.x, self.max.x),
            sample_between(rng, self.min.z, self.max.z),
        )
    }
}

/// Yaw range in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RotationRange {
    /// Lower bound in degrees.
    #[serde(default)]
    pub min: f64,
    /// Upper bound in degrees.
    #[serde(default)]
    pub max: f64,
}

impl Default for RotationRange {
    fn default() -> Self {
        Self { min: 0.0, max: 0.0 }
    }
}

impl RotationRange {
    /// Draw a uniform heading from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        sample_between(rng, self.min, self.max)
    }
}

/// Uniform scale range.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScaleRange {
    /// Lower bound.
    #[serde(default = "default_unit_scale")]
    pub min: f64,
    /// Upper bound.
    #[serde(default = "default_unit_scale")]
    pub max: f64,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min: default_unit_scale(),
            max: default_unit_scale(),
        }
    }
}

impl ScaleRange {
    /// Draw a uniform scale from the range.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        sample_between(rng, self.min, self.max)
    }
}

/// Outcome of a placement search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Chosen position.
    pub position: Vec2,
    /// Footprint (unpadded) at the chosen position.
    pub footprint: Aabb,
    /// Whether every attempt overlapped and the fallback was used.
    pub fell_back: bool,
}

/// Whether a footprint of `size` at `center`, grown by `padding`, overlaps
/// any of the `occupied` boxes.
pub fn is_overlapping(center: Vec2, size: Vec2, padding: f64, occupied: &[Aabb]) -> bool {
    let candidate = Aabb::from_center(center, size).expanded(padding);
    occupied.iter().any(|other| candidate.intersects(other))
}

/// Search for a non-overlapping spawn position.
///
/// `sample` draws a candidate position; it is called up to
/// [`MAX_PLACEMENT_ATTEMPTS`] times. If every candidate overlaps, the
/// `fallback` position is used and a warning naming `label` is logged.
pub fn find_free_position<R, F>(
    rng: &mut R,
    mut sample: F,
    size: Vec2,
    padding: f64,
    occupied: &[Aabb],
    fallback: Vec2,
    label: &str,
) -> Placement
where
    R: Rng + ?Sized,
    F: FnMut(&mut R) -> Vec2,
{
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let candidate = sample(rng);
        if !is_overlapping(candidate, size, padding, occupied) {
            return Placement {
                position: candidate,
                footprint: Aabb::from_center(candidate, size),
                fell_back: false,
            };
        }
    }

    warn!(
        label,
        attempts = MAX_PLACEMENT_ATTEMPTS,
        x = fallback.x,
        z = fallback.z,
        "No free spawn position found, using fallback"
    );
    Placement {
        position: fallback,
        footprint: Aabb::from_center(fallback, size),
        fell_back: true,
    }
}

/// Uniform sample in `[lo, hi]`, tolerating a degenerate or reversed range.
fn sample_between<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if hi - lo <= f64::EPSILON {
        lo
    } else {
        rng.random_range(lo..=hi)
    }
}

const fn default_unit_scale() -> f64 {
    1.0
}
