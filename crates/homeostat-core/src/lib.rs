//! Day/night cycle, tick cycle, and environment runner for the Homeostat
//! simulation.
//!
//! This crate wires the world and agent crates into a steppable
//! environment: `reset() -> observation` and
//! `step(action) -> (observation, reward, done, info)`. Every environment
//! instance owns its own state, event bus, and random streams, so several
//! can run side by side.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `homeostat-config.yaml` into
//!   strongly-typed structs.
//! - [`daynight`] -- [`DayNightCycle`]: sun angle, hour buckets, and the
//!   thermal bias.
//! - [`events`] -- Per-instance [`EventBus`] and trigger zones.
//! - [`kinematics`] -- Reference navigation and physics collaborators.
//! - [`metrics`] -- [`MetricsSink`] trait and the in-memory
//!   [`EpisodeRecorder`].
//! - [`observation`] -- Observation vector layout and assembly.
//! - [`policy`] -- [`ActionSource`] trait with idle, scripted, and random
//!   sources.
//! - [`runner`] -- [`Environment`] and the episode loop.
//! - [`tick`] -- The fixed-order tick cycle.
//!
//! [`ActionSource`]: policy::ActionSource

pub mod config;
pub mod daynight;
pub mod events;
pub mod kinematics;
pub mod metrics;
pub mod observation;
pub mod policy;
pub mod runner;
pub mod tick;

// Re-export primary types at crate root.
pub use config::{ConfigError, LogFormat, SimulationConfig};
pub use daynight::{DayNightCycle, DayNightError};
pub use events::{EventBus, EventEffect, EventHandler, EventInvoker, TriggerZones};
pub use kinematics::{ArenaPhysics, KinematicNavigator};
pub use metrics::{EpisodeRecorder, EpisodeSummary, MetricsSink, NoOpSink};
pub use observation::{Observation, StepCounts, observation_len};
pub use runner::{
    EpisodeResult, Environment, NoOpCallback, RunnerError, StepInfo, StepOutcome, TickCallback,
    run_episode,
};
pub use tick::{SimulationState, TickError, TickSummary, run_tick};
