//! The bounded arena: floor footprint and static obstacles.
//!
//! All positions handed out by the world are world-space. Configuration
//! expresses obstacle footprints relative to the arena origin; the origin is
//! applied exactly once, here, when the [`Arena`] is built.

use homeostat_types::{Aabb, ObstacleId, Vec2};
use serde::Deserialize;

use crate::error::WorldError;

/// Arena configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArenaConfig {
    /// World-space center of the floor.
    #[serde(default)]
    pub origin: Vec2,

    /// Full floor extents along x and z.
    #[serde(default = "default_floor_size")]
    pub floor_size: Vec2,

    /// Static obstacles, positioned relative to `origin`.
    #[serde(default)]
    pub obstacles: Vec<ObstacleConfig>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            origin: Vec2::ZERO,
            floor_size: default_floor_size(),
            obstacles: Vec::new(),
        }
    }
}

/// How an obstacle takes part in placement and collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleKind {
    /// Blocks movement and spawning.
    #[default]
    Solid,
    /// Scenery ignored by overlap checks (walls, blocks, sensor volumes).
    Fixture,
}

/// One obstacle entry in the arena configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObstacleConfig {
    /// Human-readable name used in logs.
    #[serde(default)]
    pub name: String,

    /// Participation in placement and collision.
    #[serde(default)]
    pub kind: ObstacleKind,

    /// Footprint center relative to the arena origin.
    pub center: Vec2,

    /// Full footprint extents.
    pub size: Vec2,

    /// Fixed surface temperature baked into the thermal field (0 = none).
    #[serde(default)]
    pub temperature: f64,
}

/// A static obstacle in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    /// Identifier, in configuration order.
    pub id: ObstacleId,
    /// Human-readable name.
    pub name: String,
    /// Participation in placement and collision.
    pub kind: ObstacleKind,
    /// World-space footprint.
    pub bounds: Aabb,
    /// Surface temperature (0 = not a thermal source).
    pub temperature: f64,
}

impl Obstacle {
    /// Whether this obstacle imprints its temperature on the thermal field.
    pub fn is_thermal_source(&self) -> bool {
        self.temperature.abs() > f64::EPSILON
    }
}

/// The arena floor plus its obstacles.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    origin: Vec2,
    floor: Aabb,
    obstacles: Vec<Obstacle>,
}

impl Arena {
    /// Build the arena from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidConfig`] if the floor has a non-positive
    /// extent or an obstacle has a negative size.
    pub fn new(config: &ArenaConfig) -> Result<Self, WorldError> {
        if config.floor_size.x <= 0.0 || config.floor_size.z <= 0.0 {
            return Err(WorldError::invalid(
                "arena.floor_size",
                "both extents must be positive",
            ));
        }

        let mut obstacles = Vec::with_capacity(config.obstacles.len());
        let mut id = ObstacleId::new(0);
        for obstacle in &config.obstacles {
            if obstacle.size.x < 0.0 || obstacle.size.z < 0.0 {
                return Err(WorldError::invalid(
                    "arena.obstacles.size",
                    format!("obstacle '{}' has a negative extent", obstacle.name),
                ));
            }
            obstacles.push(Obstacle {
                id,
                name: obstacle.name.clone(),
                kind: obstacle.kind,
                bounds: Aabb::from_center(config.origin.plus(obstacle.center), obstacle.size),
                temperature: obstacle.temperature,
            });
            id = id.next();
        }

        Ok(Self {
            origin: config.origin,
            floor: Aabb::from_center(config.origin, config.floor_size),
            obstacles,
        })
    }

    /// World-space center of the floor.
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// World-space floor footprint.
    pub const fn floor(&self) -> Aabb {
        self.floor
    }

    /// Full floor extents.
    pub fn floor_size(&self) -> Vec2 {
        self.floor.size()
    }

    /// Convert an origin-relative point to world space.
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.origin.plus(local)
    }

    /// All obstacles.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Footprints of obstacles that block movement and spawning.
    pub fn solid_footprints(&self) -> Vec<Aabb> {
        self.obstacles
            .iter()
            .filter(|o| o.kind == ObstacleKind::Solid)
            .map(|o| o.bounds)
            .collect()
    }

    /// Obstacles that imprint a temperature on the thermal field.
    pub fn thermal_sources(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|o| o.is_thermal_source())
    }

    /// Whether `point` is on the floor.
    pub fn contains(&self, point: Vec2) -> bool {
        self.floor.contains(point)
    }
}

fn default_floor_size() -> Vec2 {
    Vec2::new(40.0, 40.0)
}
