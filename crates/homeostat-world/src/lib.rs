//! Arena, thermal field, landmarks, and resources for the Homeostat simulation.
//!
//! This crate models everything in the environment that is not an agent:
//! the bounded floor with its obstacles, the temperature grid the agent
//! senses, the landmark area predators roam in, and the consumable
//! resources with their placement policies.
//!
//! # Modules
//!
//! - [`arena`] -- Floor footprint, origin, and static obstacles.
//! - [`error`] -- Error types for world construction and resource handling.
//! - [`landmarks`] -- Landmark lattice and the convex hull that bounds
//!   predator chases.
//! - [`placement`] -- Range sampling and overlap-aware spawn placement with
//!   bounded retries.
//! - [`resources`] -- [`ResourcePool`] with static, random, and
//!   grouped-random placement policies.
//! - [`rng`] -- Seeded per-subsystem random streams.
//! - [`thermal`] -- [`ThermalField`]: base temperature grid, Gaussian
//!   smoothing, and the global day/night offset.

pub mod arena;
pub mod error;
pub mod landmarks;
pub mod placement;
pub mod resources;
pub mod rng;
pub mod thermal;

// Re-export primary types at crate root.
pub use arena::{Arena, ArenaConfig, Obstacle, ObstacleConfig, ObstacleKind};
pub use error::WorldError;
pub use landmarks::{ConvexHull, LandmarkConfig, LandmarkField};
pub use placement::{
    DEFAULT_OVERLAP_PADDING, MAX_PLACEMENT_ATTEMPTS, Placement, PositionRange, RotationRange,
    ScaleRange, find_free_position, is_overlapping,
};
pub use resources::{
    ConsumeOutcome, Resource, ResourceConfig, ResourceGroupConfig, ResourcePool, SCENT_FEATURES,
    default_scent,
};
pub use rng::{SimRng, Stream, derive_rng};
pub use thermal::{TemperatureGrid, ThermalConfig, ThermalField};
