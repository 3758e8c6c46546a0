//! Environment runner: construction, the ordered episode reset, the
//! step-based RL interface, and the episode loop.
//!
//! [`Environment`] wraps the single-tick [`run_tick`] function with the
//! episode lifecycle around it:
//!
//! - **Construction** validates the configuration, builds every subsystem,
//!   and performs the first reset.
//! - **Reset** runs the named reset phases in a fixed order; no tick can
//!   observe a half-reset world.
//! - **Step** runs one tick and reports `(observation, reward, done, info)`.
//! - **Metrics** go to the caller's sink and to an internal
//!   [`EpisodeRecorder`]; an episode's `episode_end` always precedes the
//!   next `episode_begin`.
//!
//! [`run_episode`] drives an environment with an [`ActionSource`] until the
//! episode ends.

use homeostat_agents::{
    AgentBody, AgentError, EssentialVariables, HomeostasisEngine, Navigation, Physics, Predator,
    RewardWindow, SensorReadings, spawn_predators,
};
use homeostat_types::{Action, Daylight, EpisodeEndReason};
use homeostat_world::{Arena, LandmarkField, ResourcePool, ThermalField, WorldError};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigError, SimulationConfig};
use crate::daynight::{DayNightCycle, DayNightError};
use crate::events::{EventBus, TriggerZones};
use crate::kinematics::{ArenaPhysics, KinematicNavigator};
use crate::metrics::{EpisodeRecorder, EpisodeSummary, MetricsSink, MetricsTee};
use crate::observation::{Observation, StepCounts};
use crate::policy::ActionSource;
use crate::tick::{self, RngStreams, SimulationState, TickError, TickSummary};

/// Errors that can occur while building or running an environment.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration failed validation.
    #[error("configuration error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// A world subsystem refused its configuration.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The agent or predator configuration is invalid.
    #[error("agent error: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },

    /// The day/night cycle refused its configuration.
    #[error("day/night error: {source}")]
    DayNight {
        /// The underlying day/night error.
        #[from]
        source: DayNightError,
    },

    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },
}

/// Auxiliary data returned with every step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepInfo {
    /// Why the episode ended, if it did.
    pub end_reason: Option<EpisodeEndReason>,
    /// Whether a consumption took effect this step.
    pub resource_consumed_in_step: bool,
    /// Tag of the consumed resource (`food`, `water`, `pond`).
    pub consumed_resource_type: Option<String>,
    /// Moving average of recent rewards.
    pub average_reward: f64,
    /// Essential variables after the step.
    pub levels: EssentialVariables,
    /// Tick number within the episode.
    pub tick: u64,
}

/// Result of one [`Environment::step`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    /// Observation after the step.
    pub observation: Observation,
    /// Reward for the step.
    pub reward: f64,
    /// Whether the episode ended.
    pub done: bool,
    /// Auxiliary data.
    pub info: StepInfo,
}

/// One simulation instance with its own state, event bus, and streams.
pub struct Environment {
    state: SimulationState,
    sink: Box<dyn MetricsSink>,
    recorder: EpisodeRecorder,
    /// `episode_begin` was sent for the current episode.
    started: bool,
    /// `episode_end` is still owed for the current episode.
    open: bool,
    last_summary: Option<TickSummary>,
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("state", &self.state)
            .field("started", &self.started)
            .field("open", &self.open)
            .finish_non_exhaustive()
    }
}

impl Environment {
    /// Validate `config`, build every subsystem, and reset for episode 1.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] naming the first invalid setting.
    pub fn new(
        config: SimulationConfig,
        navigation: Box<dyn Navigation>,
        mut physics: Box<dyn Physics>,
        sink: Box<dyn MetricsSink>,
    ) -> Result<Self, RunnerError> {
        config.validate()?;

        let arena = Arena::new(&config.arena)?;
        let thermal = ThermalField::new(&config.thermal, &arena)?;
        let resources = ResourcePool::new(&config.resources, &arena)?;
        let day_night = DayNightCycle::new(&config.day_night)?;
        let homeostasis =
            HomeostasisEngine::new(&config.agent, config.simulation.fixed_delta_time)?;

        let solids = arena.solid_footprints();
        physics.rebuild(&solids);
        let mut rngs = RngStreams::new(config.simulation.seed);
        let body = AgentBody::spawn(&config.agent, arena.origin(), &mut rngs.agent, &solids);
        let levels = EssentialVariables::start(&config.agent);

        let state = SimulationState {
            events: EventBus::from_config(&config.events),
            zones: TriggerZones::from_config(&config.events, arena.origin()),
            reward_window: RewardWindow::new(config.agent.reward_window_size),
            arena,
            thermal,
            resources,
            landmarks: LandmarkField::default(),
            day_night,
            homeostasis,
            body,
            levels,
            previous: levels,
            readings: SensorReadings::default(),
            counts: StepCounts::default(),
            pending: None,
            consumed: None,
            last_impulse: 0.0,
            predators: Vec::new(),
            tick: 0,
            episode: 1,
            done: None,
            rngs,
            navigation,
            physics,
            config,
        };

        let mut env = Self {
            state,
            sink,
            recorder: EpisodeRecorder::new(),
            started: false,
            open: false,
            last_summary: None,
        };
        reset_episode(&mut env.state);
        info!(
            seed = env.state.config.simulation.seed,
            observation_len = env.observation().len(),
            "Environment ready"
        );
        Ok(env)
    }

    /// Build with the reference [`KinematicNavigator`] and
    /// [`ArenaPhysics`].
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] naming the first invalid setting.
    pub fn with_reference_collaborators(
        config: SimulationConfig,
        sink: Box<dyn MetricsSink>,
    ) -> Result<Self, RunnerError> {
        let floor = Arena::new(&config.arena)?.floor();
        let navigation = KinematicNavigator::new(floor, config.physics.arrival_tolerance);
        let physics = ArenaPhysics::new(floor, config.physics.impulse_scale);
        Self::new(config, Box::new(navigation), Box::new(physics), sink)
    }

    /// End the current episode (if it ran) and start the next one.
    pub fn reset(&mut self) -> Observation {
        self.close_episode(None);
        if self.started {
            self.state.episode = self.state.episode.saturating_add(1);
            self.started = false;
        }
        reset_episode(&mut self.state);
        self.last_summary = None;
        self.observation()
    }

    /// Advance one tick.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Tick`] when the episode already ended or the
    /// world rejects a consumption.
    pub fn step(&mut self, action: Action) -> Result<StepOutcome, RunnerError> {
        if !self.started {
            self.recorder.episode_begin(self.state.episode);
            self.sink.episode_begin(self.state.episode);
            info!(episode = self.state.episode, "Episode started");
            self.started = true;
            self.open = true;
        }

        let summary = {
            let mut tee = MetricsTee {
                recorder: &mut self.recorder,
                sink: &mut *self.sink,
            };
            tick::run_tick(&mut self.state, action, &mut tee)?
        };

        if let Some(reason) = summary.end_reason {
            self.close_episode(Some(reason));
        }

        let outcome = StepOutcome {
            observation: self.observation(),
            reward: summary.reward,
            done: summary.end_reason.is_some(),
            info: StepInfo {
                end_reason: summary.end_reason,
                resource_consumed_in_step: summary.consumed.is_some(),
                consumed_resource_type: summary.consumed.map(|k| k.tag().to_owned()),
                average_reward: summary.average_reward,
                levels: self.state.levels,
                tick: summary.tick,
            },
        };
        self.last_summary = Some(summary);
        Ok(outcome)
    }

    /// Observation of the current state.
    pub fn observation(&self) -> Observation {
        Observation::assemble(
            &self.state.config.agent,
            &self.state.levels,
            &self.state.readings,
            self.state.body.pose(),
            self.state.counts,
        )
    }

    /// Read-only simulation state.
    pub const fn state(&self) -> &SimulationState {
        &self.state
    }

    /// Mutable simulation state, for hosts that script scenarios.
    pub const fn state_mut(&mut self) -> &mut SimulationState {
        &mut self.state
    }

    /// The environment's own aggregate of the current episode.
    pub const fn recorder(&self) -> &EpisodeRecorder {
        &self.recorder
    }

    /// Summary of the last executed tick.
    pub const fn last_summary(&self) -> Option<&TickSummary> {
        self.last_summary.as_ref()
    }

    /// Current episode number.
    pub const fn episode(&self) -> u32 {
        self.state.episode
    }

    /// Send `episode_end` if it is still owed.
    fn close_episode(&mut self, reason: Option<EpisodeEndReason>) {
        if !self.open {
            return;
        }
        self.open = false;
        let summary = self.recorder.summary(reason);
        self.recorder.episode_end(&summary);
        self.sink.episode_end(&summary);
        info!(
            episode = summary.episode,
            steps = summary.total_steps,
            average_reward = summary.average_reward,
            reason = ?reason,
            "Episode ended"
        );
    }
}

/// The ordered reset sequence.
fn reset_episode(state: &mut SimulationState) {
    let solids = state.arena.solid_footprints();

    // Resources first; later spawns keep clear of them.
    state.predators.clear();
    state.resources.reset(&mut state.rngs.resources, &solids);
    let mut occupied = solids.clone();
    occupied.extend(state.resources.footprints());

    state.navigation.rebuild(&solids);

    state.landmarks = LandmarkField::generate(&state.config.landmarks, &state.arena, &occupied);

    state.thermal.regenerate(&state.arena, &mut state.rngs.thermal);

    state.day_night.reset(&mut state.rngs.day_night);
    if state.day_night.daylight() == Daylight::Night {
        state.thermal.adjust(state.day_night.night_bias());
    }

    state.predators = spawn_predators(
        &state.config.predators,
        state.arena.origin(),
        &occupied,
        &mut *state.navigation,
        &mut state.rngs.predators,
    );
    occupied.extend(state.predators.iter().map(Predator::footprint));

    state.events.reset_counts();
    state.zones.reset();

    state.body.respawn(
        &state.config.agent,
        state.arena.origin(),
        &mut state.rngs.agent,
        &occupied,
    );
    state.levels = EssentialVariables::start(&state.config.agent);
    state.previous = state.levels;
    state.readings = SensorReadings::default();
    state.counts = StepCounts::default();
    state.pending = None;
    state.consumed = None;
    state.last_impulse = 0.0;
    state.reward_window.clear();
    state.tick = 0;
    state.done = None;

    debug!(
        episode = state.episode,
        landmarks = state.landmarks.landmarks().len(),
        predators = state.predators.len(),
        hour = state.day_night.hour(),
        "Episode reset complete"
    );
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// Result of one episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeResult {
    /// Why the episode ended.
    pub end_reason: EpisodeEndReason,
    /// Ticks executed.
    pub total_ticks: u64,
    /// Sum of rewards.
    pub total_reward: f64,
    /// Aggregated metrics.
    pub summary: EpisodeSummary,
}

/// Reset `env` and step it with `policy` until the episode ends.
///
/// Without a step budget or a reachable termination condition this never
/// returns.
///
/// # Errors
///
/// Returns [`RunnerError`] if a tick fails.
pub fn run_episode(
    env: &mut Environment,
    policy: &mut dyn ActionSource,
    callback: &mut dyn TickCallback,
) -> Result<EpisodeResult, RunnerError> {
    let mut observation = env.reset();
    let mut total_reward = 0.0;

    loop {
        let tick = env.state().tick.saturating_add(1);
        let action = policy.next_action(tick, &observation);
        let outcome = env.step(action)?;
        total_reward += outcome.reward;
        if let Some(summary) = env.last_summary() {
            callback.on_tick(summary, env.state());
        }
        if let Some(end_reason) = outcome.info.end_reason {
            return Ok(EpisodeResult {
                end_reason,
                total_ticks: outcome.info.tick,
                total_reward,
                summary: env.recorder().summary(Some(end_reason)),
            });
        }
        observation = outcome.observation;
    }
}
