//! Planar geometry on the arena floor.
//!
//! The simulation is flat: every position lives on the (x, z) plane and
//! every orientation is a yaw angle in degrees, measured clockwise from +z
//! (so a heading of 0 faces +z and 90 faces +x).

use serde::{Deserialize, Serialize};

/// Threshold below which a vector is treated as having zero length.
const EPSILON: f64 = 1e-9;

/// A point or direction on the (x, z) plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Depth coordinate.
    pub z: f64,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, z: 0.0 };

    /// Create a vector from its components.
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.z + other.z)
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn minus(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.z - other.z)
    }

    /// Multiply both components by `factor`.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.z * factor)
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f64 {
        self.x.mul_add(other.x, self.z * other.z)
    }

    /// 2D cross product (z-component of the 3D cross product).
    ///
    /// Positive when `other` lies counter-clockwise of `self`.
    pub fn cross(self, other: Self) -> f64 {
        self.x.mul_add(other.z, -(self.z * other.x))
    }

    /// Squared Euclidean length.
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Distance between two points.
    pub fn distance(self, other: Self) -> f64 {
        other.minus(self).length()
    }

    /// Unit vector in the same direction, or [`Vec2::ZERO`] for a zero vector.
    #[must_use]
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < EPSILON {
            Self::ZERO
        } else {
            self.scale(1.0 / len)
        }
    }

    /// Unit forward vector for a yaw heading in degrees.
    pub fn from_heading(heading_deg: f64) -> Self {
        let rad = heading_deg.to_radians();
        Self::new(rad.sin(), rad.cos())
    }

    /// Yaw heading in degrees (in `[0, 360)`) pointing along this vector.
    pub fn heading(self) -> f64 {
        wrap_degrees(self.x.atan2(self.z).to_degrees())
    }

    /// Unsigned angle in degrees (in `[0, 180]`) between two directions.
    ///
    /// Returns 0 when either vector has zero length.
    pub fn angle_to(self, other: Self) -> f64 {
        let a = self.normalized();
        let b = other.normalized();
        if a.length_squared() < EPSILON || b.length_squared() < EPSILON {
            return 0.0;
        }
        a.dot(b).clamp(-1.0, 1.0).acos().to_degrees()
    }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Position plus yaw heading of an entity on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// World-space position.
    pub position: Vec2,
    /// Yaw in degrees, `[0, 360)`.
    pub heading: f64,
}

impl Pose {
    /// Create a pose; the heading is wrapped into `[0, 360)`.
    pub fn new(position: Vec2, heading: f64) -> Self {
        Self {
            position,
            heading: wrap_degrees(heading),
        }
    }

    /// Unit vector the entity is facing.
    pub fn forward(&self) -> Vec2 {
        Vec2::from_heading(self.heading)
    }

    /// Unit vector to the entity's right.
    pub fn right(&self) -> Vec2 {
        Vec2::from_heading(self.heading + 90.0)
    }

    /// Rotate by `delta` degrees (positive turns right).
    pub fn rotate(&mut self, delta: f64) {
        self.heading = wrap_degrees(self.heading + delta);
    }

    /// World-space point at a body-relative offset (`right`, `forward`).
    pub fn local_to_world(&self, right: f64, forward: f64) -> Vec2 {
        self.position
            .plus(self.right().scale(right))
            .plus(self.forward().scale(forward))
    }
}

/// Axis-aligned box on the floor plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec2,
    /// Maximum corner.
    pub max: Vec2,
}

impl Aabb {
    /// Box centered on `center` with full side lengths `size`.
    pub fn from_center(center: Vec2, size: Vec2) -> Self {
        let half = Vec2::new(size.x.abs() * 0.5, size.z.abs() * 0.5);
        Self {
            min: center.minus(half),
            max: center.plus(half),
        }
    }

    /// Center point.
    pub fn center(&self) -> Vec2 {
        self.min.plus(self.max).scale(0.5)
    }

    /// Full side lengths.
    pub fn size(&self) -> Vec2 {
        self.max.minus(self.min)
    }

    /// Grow every side by `margin` (shrinks for negative margins).
    #[must_use]
    pub fn expanded(&self, margin: f64) -> Self {
        let pad = Vec2::new(margin, margin);
        Self {
            min: self.min.minus(pad),
            max: self.max.plus(pad),
        }
    }

    /// Whether two boxes overlap (touching edges count as overlap).
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Whether a point lies inside or on the boundary.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Closest point inside the box.
    pub fn clamp(&self, point: Vec2) -> Vec2 {
        Vec2::new(
            point.x.clamp(self.min.x, self.max.x.max(self.min.x)),
            point.z.clamp(self.min.z, self.max.z.max(self.min.z)),
        )
    }

    /// Whether the segment `a -> b` passes through the box (slab test).
    pub fn intersects_segment(&self, a: Vec2, b: Vec2) -> bool {
        let dir = b.minus(a);
        let mut t_min: f64 = 0.0;
        let mut t_max: f64 = 1.0;
        for (origin, delta, lo, hi) in [
            (a.x, dir.x, self.min.x, self.max.x),
            (a.z, dir.z, self.min.z, self.max.z),
        ] {
            if delta.abs() < EPSILON {
                if origin < lo || origin > hi {
                    return false;
                }
            } else {
                let inv = 1.0 / delta;
                let t1 = (lo - origin) * inv;
                let t2 = (hi - origin) * inv;
                t_min = t_min.max(t1.min(t2));
                t_max = t_max.min(t1.max(t2));
                if t_min > t_max {
                    return false;
                }
            }
        }
        true
    }
}
