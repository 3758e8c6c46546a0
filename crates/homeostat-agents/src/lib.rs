//! The homeostatic agent, its sensors, and the predators that hunt it.
//!
//! This crate holds the per-tick logic that acts on agent and predator
//! state. It depends on `homeostat-world` for the environment it reads and
//! leaves orchestration to `homeostat-core`. Pathfinding and collision are
//! reached only through the [`Navigation`] and [`Physics`] traits.
//!
//! # Modules
//!
//! - [`body`] -- Agent pose, action kinematics, spawning, and eating.
//! - [`config`] -- [`AgentConfig`]: ranges, coefficients, sensor switches.
//! - [`error`] -- Error types for agent and predator setup ([`AgentError`]).
//! - [`homeostasis`] -- [`HomeostasisEngine`]: essential-variable dynamics,
//!   reward, and termination.
//! - [`predator`] -- Predator behaviour state machine and spawner.
//! - [`sensors`] -- Thermal, olfactory, collision, and touch sensing.
//! - [`services`] -- Navigation and physics collaborator contracts.

pub mod body;
pub mod config;
pub mod error;
pub mod homeostasis;
pub mod predator;
pub mod sensors;
pub mod services;

// Re-export primary types at crate root.
pub use body::AgentBody;
pub use config::{AgentConfig, Coefficients, EvRange};
pub use error::AgentError;
pub use homeostasis::{
    CROSS_COUPLING_BIAS, DiscreteEvents, EssentialVariables, HomeostasisEngine, InteractionFn,
    RewardWindow, constant_interaction,
};
pub use predator::{
    Predator, PredatorConfig, PredatorContext, PredatorGroupConfig, PredatorsConfig,
    spawn_predators,
};
pub use sensors::{
    COLLISION_COUNT_THRESHOLD, COLLISION_GROUPS, COLLISION_RAYS, MAX_COLLISION_DAMAGE,
    SensorReadings, THERMAL_SENSORS, collision_damage, sample_collision, sample_olfactory,
    sample_thermal, sample_touch,
};
pub use services::{ArrivalStatus, Contact, MotionOutcome, MoveRequest, Navigation, Physics};
