//! Shared type definitions for the Homeostat simulation.
//!
//! This crate is the single source of truth for the small value types that
//! flow between the world, agent, and orchestration crates.
//!
//! # Modules
//!
//! - [`geometry`] -- Planar (x, z) vectors, poses, and axis-aligned boxes
//! - [`ids`] -- Type-safe identifiers for resources, predators, and obstacles
//! - [`enums`] -- Enumeration types (actions, essential variables, day
//!   phases, predator states, placement policies, episode end reasons)

pub mod enums;
pub mod geometry;
pub mod ids;

// Re-export all public types at crate root for convenience.
pub use enums::{
    Action, DayPhase, Daylight, EpisodeEndReason, EssentialVariable, PlacementPolicy,
    PredatorState, ResourceKind,
};
pub use geometry::{Aabb, Pose, Vec2};
pub use ids::{ObstacleId, PredatorId, ResourceId};
