//! Tick cycle: the fixed-order phase loop that advances one environment by
//! one step.
//!
//! Each tick runs through these phases:
//!
//! 1. **Clock** -- advance the day/night cycle, re-bias the thermal field
//!    when the hour bucket changes, and zero the per-tick counters.
//!
//! 2. **Consumption** -- a resource eaten during the previous tick takes
//!    effect: its one-shot discrete term fires and the metrics sink hears
//!    about it.
//!
//! 3. **Homeostasis** -- update food, water, and health from the previous
//!    tick's snapshot, read the sensors, and update the thermal channel.
//!
//! 4. **Termination** -- single-trial consumption, then the essential
//!    variable ranges. Health is clamped to its maximum afterwards. A
//!    terminated tick skips the action, predator, and physics phases.
//!
//! 5. **Action** -- apply the agent's discrete action to its body.
//!
//! 6. **Predators** -- every predator decides and moves; their damage is
//!    taken off health.
//!
//! 7. **Reward** -- compute the reward, push it into the reporting window,
//!    and snapshot the levels as the next tick's "previous".
//!
//! 8. **Physics** -- resolve the agent's motion and contacts, update
//!    predator contact, consume a resource in reach, and fire event zones.
//!    The ranges are checked again and health clamped, so no tick ever
//!    reports health above its maximum.
//!
//! The tick is deterministic given the same state and action.

use homeostat_agents::{
    AgentBody, COLLISION_COUNT_THRESHOLD, DiscreteEvents, EssentialVariables, HomeostasisEngine,
    Navigation, Physics, Predator, PredatorContext, RewardWindow, SensorReadings,
    collision_damage, sample_collision, sample_olfactory, sample_thermal, sample_touch,
};
use homeostat_types::{Aabb, Action, EpisodeEndReason, EssentialVariable, ResourceKind, Vec2};
use homeostat_world::{Arena, LandmarkField, ResourcePool, SimRng, Stream, ThermalField, derive_rng};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::SimulationConfig;
use crate::daynight::DayNightCycle;
use crate::events::{EventBus, EventEffect, EventInvoker, TriggerZones};
use crate::metrics::MetricsSink;
use crate::observation::StepCounts;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// The episode already ended; reset before stepping again.
    #[error("episode {episode} already ended ({reason})")]
    EpisodeFinished {
        /// The finished episode.
        episode: u32,
        /// Why it ended.
        reason: EpisodeEndReason,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: homeostat_world::WorldError,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickSummary {
    /// The tick number that was executed (1-based within the episode).
    pub tick: u64,
    /// Reward for this tick.
    pub reward: f64,
    /// Moving average of recent rewards.
    pub average_reward: f64,
    /// Why the episode ended on this tick, if it did.
    pub end_reason: Option<EpisodeEndReason>,
    /// Resource whose effect landed this tick.
    pub consumed: Option<ResourceKind>,
    /// Damage dealt by contacts during the physics phase.
    pub collision_damage: f64,
    /// Damage dealt by predators.
    pub predator_damage: f64,
    /// Event tags that fired.
    pub events: Vec<String>,
    /// Hour of the day after the clock phase.
    pub hour: u32,
}

/// One random stream per subsystem.
#[derive(Debug, Clone)]
pub struct RngStreams {
    /// Hot-spot placement.
    pub thermal: SimRng,
    /// Resource spawning and relocation.
    pub resources: SimRng,
    /// Predator spawning and decisions.
    pub predators: SimRng,
    /// Agent spawn.
    pub agent: SimRng,
    /// Random sun angle.
    pub day_night: SimRng,
}

impl RngStreams {
    /// Derive every stream from the master seed.
    pub fn new(seed: u64) -> Self {
        Self {
            thermal: derive_rng(seed, Stream::Thermal),
            resources: derive_rng(seed, Stream::Resources),
            predators: derive_rng(seed, Stream::Predators),
            agent: derive_rng(seed, Stream::Agent),
            day_night: derive_rng(seed, Stream::DayNight),
        }
    }
}

/// The mutable simulation state passed through the tick cycle.
///
/// Owned by one environment instance; nothing in it is shared with other
/// instances.
pub struct SimulationState {
    /// The immutable configuration bundle.
    pub config: SimulationConfig,
    /// Arena floor and obstacles.
    pub arena: Arena,
    /// Thermal grid.
    pub thermal: ThermalField,
    /// Consumable resources.
    pub resources: ResourcePool,
    /// Landmarks and their hull.
    pub landmarks: LandmarkField,
    /// Sun and hour buckets.
    pub day_night: DayNightCycle,
    /// Essential-variable dynamics.
    pub homeostasis: HomeostasisEngine,
    /// The agent's body.
    pub body: AgentBody,
    /// Current essential variables.
    pub levels: EssentialVariables,
    /// Snapshot taken at the end of the previous tick.
    pub previous: EssentialVariables,
    /// Latest sensor readings.
    pub readings: SensorReadings,
    /// Counters reported in the observation.
    pub counts: StepCounts,
    /// Resource eaten in the last physics phase, applied next tick.
    pub pending: Option<ResourceKind>,
    /// Resource whose effect landed this tick.
    pub consumed: Option<ResourceKind>,
    /// Peak contact impulse of the last physics phase.
    pub last_impulse: f64,
    /// Roaming predators.
    pub predators: Vec<Predator>,
    /// Per-instance event bus.
    pub events: EventBus,
    /// Trigger zones feeding the bus.
    pub zones: TriggerZones,
    /// Reporting window of recent rewards.
    pub reward_window: RewardWindow,
    /// Ticks executed this episode.
    pub tick: u64,
    /// Current episode number, starting at 1.
    pub episode: u32,
    /// Set once the episode has ended.
    pub done: Option<EpisodeEndReason>,
    /// Per-subsystem random streams.
    pub rngs: RngStreams,
    /// Navigation collaborator.
    pub navigation: Box<dyn Navigation>,
    /// Physics and perception collaborator.
    pub physics: Box<dyn Physics>,
}

impl std::fmt::Debug for SimulationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationState")
            .field("episode", &self.episode)
            .field("tick", &self.tick)
            .field("levels", &self.levels)
            .field("predators", &self.predators.len())
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl SimulationState {
    /// Footprints new spawns must keep clear of: solid obstacles, the agent,
    /// and the predators.
    pub fn blocked_footprints(&self) -> Vec<Aabb> {
        let mut blocked = self.arena.solid_footprints();
        blocked.push(self.body.footprint());
        blocked.extend(self.predators.iter().map(Predator::footprint));
        blocked
    }
}

/// Execute one complete tick of the simulation.
///
/// # Errors
///
/// Returns [`TickError::EpisodeFinished`] when called after the episode
/// ended and [`TickError::World`] if the resource pool rejects a
/// consumption.
pub fn run_tick(
    state: &mut SimulationState,
    action: Action,
    sink: &mut dyn MetricsSink,
) -> Result<TickSummary, TickError> {
    if let Some(reason) = state.done {
        return Err(TickError::EpisodeFinished {
            episode: state.episode,
            reason,
        });
    }

    // --- Phase 1: Clock ---
    phase_clock(state);
    let tick = state.tick;

    // --- Phase 2: Consumption ---
    let consumed = phase_consumption(state, sink);

    // --- Phase 3: Homeostasis ---
    phase_homeostasis(state, consumed);

    // --- Phase 4: Termination ---
    let mut end_reason = phase_termination(state, consumed);

    let mut predator_damage = 0.0;
    if end_reason.is_none() {
        // --- Phase 5: Action ---
        let dt = state.homeostasis.dt();
        state.body.apply_action(action, &state.config.agent, dt);
        sink.record_action(tick, action);

        // --- Phase 6: Predators ---
        predator_damage = phase_predators(state);
    }

    // --- Phase 7: Reward ---
    let reward = state.homeostasis.reward(&state.levels);
    let average_reward = state.reward_window.push(reward);
    sink.record_step(reward, &state.levels);
    state.previous = state.levels;

    // --- Phase 8: Physics ---
    let mut physics = PhysicsReport::default();
    if end_reason.is_none() {
        physics = phase_physics(state, sink)?;
        // Contacts and event zones can push the levels out of range.
        end_reason = state.homeostasis.check_termination(&state.levels);
        state.homeostasis.clamp_health(&mut state.levels);
        let max_steps = state.config.agent.max_steps;
        if end_reason.is_none() && max_steps > 0 && tick >= max_steps {
            end_reason = Some(EpisodeEndReason::MaxStepReached);
        }
    }

    state.done = end_reason;
    if let Some(reason) = end_reason {
        info!(episode = state.episode, tick, reason = %reason, "Episode terminated");
    } else {
        debug!(
            tick,
            reward,
            food = state.levels.food,
            water = state.levels.water,
            "Tick completed"
        );
    }

    Ok(TickSummary {
        tick,
        reward,
        average_reward,
        end_reason,
        consumed,
        collision_damage: physics.collision_damage,
        predator_damage,
        events: physics.events,
        hour: state.day_night.hour(),
    })
}

/// Phase 1: advance the sun and clear the per-tick flags.
fn phase_clock(state: &mut SimulationState) {
    if let Some(bias) = state.day_night.advance() {
        state.thermal.set_offset(bias);
    }
    state.tick = state.tick.saturating_add(1);
    state.counts = StepCounts::default();
    state.consumed = None;
}

/// Phase 2: land last tick's consumption.
fn phase_consumption(
    state: &mut SimulationState,
    sink: &mut dyn MetricsSink,
) -> Option<ResourceKind> {
    let kind = state.pending.take()?;
    match kind.replenishes() {
        EssentialVariable::Food => state.counts.food = 1,
        _ => state.counts.water = 1,
    }
    state.consumed = Some(kind);
    sink.record_consumption(kind);
    debug!(tick = state.tick, kind = %kind, "Consumption takes effect");
    Some(kind)
}

/// Phase 3: essential-variable update and sensing.
fn phase_homeostasis(state: &mut SimulationState, consumed: Option<ResourceKind>) {
    let events = DiscreteEvents {
        food: consumed.is_some_and(|k| k.replenishes() == EssentialVariable::Food),
        water: consumed.is_some_and(|k| k.replenishes() == EssentialVariable::Water),
    };
    state
        .homeostasis
        .update_metabolic(&mut state.levels, &state.previous, events);

    let agent = &state.config.agent;
    let pose = *state.body.pose();

    if agent.use_olfactory_obs {
        state.readings.olfactory =
            sample_olfactory(pose.position, &state.resources, agent.olfactory_sensor_length);
    }
    if agent.use_thermal_obs {
        let samples = sample_thermal(
            &pose,
            &state.thermal,
            agent.thermal_sensor_distance,
            state.levels.thermal,
            agent.relative_thermal_obs,
        );
        state
            .homeostasis
            .update_thermal(&mut state.levels, &state.previous, &samples);
        state.readings.thermal = samples;
    }
    if agent.use_collision_obs {
        state.readings.collision = sample_collision(
            &pose,
            state.physics.as_ref(),
            agent.collision_ray_distance,
            state.last_impulse,
        );
    }
    if agent.use_touch_obs {
        state.readings.touch = sample_touch(pose.position, &state.resources, agent.eating_distance);
    }
}

/// Phase 4: decide whether the episode ends here.
fn phase_termination(
    state: &mut SimulationState,
    consumed: Option<ResourceKind>,
) -> Option<EpisodeEndReason> {
    let reason = if state.config.agent.single_trial && consumed.is_some() {
        Some(EpisodeEndReason::ResourceConsumed)
    } else {
        state.homeostasis.check_termination(&state.levels)
    };
    state.homeostasis.clamp_health(&mut state.levels);
    reason
}

/// Phase 6: predator decisions and movement. Returns the damage dealt.
fn phase_predators(state: &mut SimulationState) -> f64 {
    let daylight = state.day_night.daylight();
    let agent = state.body.position();
    let dt = state.homeostasis.dt();
    let SimulationState {
        predators,
        landmarks,
        navigation,
        physics,
        rngs,
        levels,
        ..
    } = state;

    let mut damage = 0.0;
    for predator in predators.iter_mut() {
        let mut ctx = PredatorContext {
            daylight,
            agent,
            landmarks: landmarks.landmarks(),
            hull: landmarks.hull(),
            navigation: &mut **navigation,
            physics: &**physics,
            rng: &mut rngs.predators,
        };
        damage += predator.take_action(&mut ctx);
        predator.advance(&mut **navigation, dt);
    }
    if damage > 0.0 {
        levels.health -= damage;
        debug!(damage, health = levels.health, "Predator damage");
    }
    damage
}

/// What the physics phase produced.
#[derive(Debug, Default)]
struct PhysicsReport {
    collision_damage: f64,
    events: Vec<String>,
}

/// Phase 8: motion, contacts, eating, and event zones.
fn phase_physics(
    state: &mut SimulationState,
    sink: &mut dyn MetricsSink,
) -> Result<PhysicsReport, TickError> {
    let mut report = PhysicsReport::default();
    let dt = state.homeostasis.dt();

    // Agent motion and wall contacts.
    let from = state.body.position();
    let outcome = state.physics.resolve_motion(
        from,
        state.body.desired_position(dt),
        state.body.radius(),
        dt,
    );
    state.body.set_position(outcome.position);
    state.last_impulse = outcome.peak_impulse();
    if !outcome.contacts.is_empty() {
        let damage = collision_damage(state.last_impulse, state.config.agent.damage_constant);
        state.levels.health += damage;
        report.collision_damage = damage;
        if damage > COLLISION_COUNT_THRESHOLD {
            state.counts.collision = 1;
            sink.record_collision(damage);
            debug!(tick = state.tick, damage, impulse = state.last_impulse, "Collision");
        }
    }

    // Predator contact.
    let agent = state.body.position();
    let radius = state.body.radius();
    for predator in &mut state.predators {
        let touching = state.physics.in_contact(
            agent,
            radius,
            predator.pose().position,
            predator.config().radius,
        );
        predator.update_contact(touching, agent, state.navigation.as_mut());
    }

    // Eating.
    if let Some(id) = state.body.edible_resource(&state.config.agent, &state.resources) {
        let kind = state.resources.get(id).map(|r| r.kind);
        let blocked = state.blocked_footprints();
        let outcome = state
            .resources
            .consume(id, &mut state.rngs.resources, &blocked)?;
        debug!(tick = state.tick, resource = %id, ?outcome, "Resource eaten");
        state.pending = kind;
    }

    // Event zones.
    report.events = phase_events(state, agent, sink);
    Ok(report)
}

/// Fire zones entered this tick and apply the effects.
fn phase_events(
    state: &mut SimulationState,
    agent: Vec2,
    sink: &mut dyn MetricsSink,
) -> Vec<String> {
    if state.zones.is_empty() {
        return Vec::new();
    }
    let mut entities = vec![(EventInvoker::Agent, agent)];
    entities.extend(
        state
            .predators
            .iter()
            .map(|p| (EventInvoker::Predator(p.id()), p.pose().position)),
    );

    let mut fired_tags = Vec::new();
    for (tag, invoker) in state.zones.check(&entities) {
        let effects = state.events.trigger(&tag, invoker);
        if effects.is_empty() {
            continue;
        }
        for effect in &effects {
            apply_effect(&state.homeostasis, &mut state.levels, effect);
        }
        sink.record_event(&tag);
        fired_tags.push(tag);
    }
    fired_tags
}

fn apply_effect(
    homeostasis: &HomeostasisEngine,
    levels: &mut EssentialVariables,
    effect: &EventEffect,
) {
    match effect {
        EventEffect::Message { .. } => {}
        EventEffect::SetLevels { food, water, .. } => {
            levels.food = homeostasis.range(EssentialVariable::Food).clamp(*food);
            levels.water = homeostasis.range(EssentialVariable::Water).clamp(*water);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use homeostat_agents::{AgentConfig, Coefficients, EvRange};
    use homeostat_types::PlacementPolicy;
    use homeostat_world::{
        ArenaConfig, PositionRange, ResourceConfig, ResourceGroupConfig, RotationRange,
        ScaleRange,
    };

    use super::*;
    use crate::config::{EventGroupConfig, EventsConfig};
    use crate::metrics::NoOpSink;
    use crate::runner::Environment;

    fn zero() -> Coefficients {
        Coefficients::default()
    }

    /// Agent with all drift switched off and every sensor disabled.
    fn still_agent() -> AgentConfig {
        AgentConfig {
            food_range: EvRange::new(-10.0, 10.0),
            water_range: EvRange::new(-10.0, 10.0),
            start_food: 0.0,
            start_water: 0.0,
            start_thermal: 0.0,
            start_health: 0.0,
            food_coefficients: zero(),
            water_coefficients: zero(),
            thermal_coefficients: zero(),
            health_coefficients: zero(),
            resource_food_value: 5.0,
            use_thermal_obs: false,
            use_olfactory_obs: false,
            use_collision_obs: false,
            use_touch_obs: false,
            ..AgentConfig::default()
        }
    }

    fn food_at(position: Vec2) -> ResourceConfig {
        ResourceConfig {
            groups: vec![ResourceGroupConfig {
                name: "apple".to_owned(),
                label: String::new(),
                kind: ResourceKind::Food,
                policy: PlacementPolicy::Static,
                count: 1,
                position: PositionRange::point(position),
                rotation: RotationRange::default(),
                scale: ScaleRange::default(),
                footprint: Vec2::new(0.5, 0.5),
                scent: None,
            }],
            ..ResourceConfig::default()
        }
    }

    fn base_config() -> SimulationConfig {
        SimulationConfig {
            arena: ArenaConfig::default(),
            agent: still_agent(),
            ..SimulationConfig::default()
        }
    }

    fn environment(config: SimulationConfig) -> Environment {
        Environment::with_reference_collaborators(config, Box::new(NoOpSink)).unwrap()
    }

    #[test]
    fn eating_lands_exactly_the_resource_value_next_tick() {
        let mut config = base_config();
        config.agent.init_position = Vec2::ZERO;
        config.resources = food_at(Vec2::new(0.0, 0.5));
        let mut env = environment(config);

        // The Eat action sets the intent; the physics phase eats.
        let first = env.step(Action::Eat).unwrap();
        assert!(!first.info.resource_consumed_in_step);
        assert!(first.info.levels.food.abs() < f64::EPSILON);

        let second = env.step(Action::Idle).unwrap();
        assert!(second.info.resource_consumed_in_step);
        assert_eq!(second.info.consumed_resource_type.as_deref(), Some("food"));
        assert!((second.info.levels.food - 5.0).abs() < f64::EPSILON);

        // The discrete term is one-shot.
        let third = env.step(Action::Idle).unwrap();
        assert!(!third.info.resource_consumed_in_step);
        assert!((third.info.levels.food - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn max_steps_ends_exactly_on_the_last_tick() {
        let mut config = base_config();
        config.agent.max_steps = 100;
        let mut env = environment(config);

        let mut terminations = Vec::new();
        for tick in 1..=100_u64 {
            let outcome = env.step(Action::Idle).unwrap();
            if outcome.done {
                terminations.push((tick, outcome.info.end_reason));
            }
        }
        assert_eq!(
            terminations,
            vec![(100, Some(EpisodeEndReason::MaxStepReached))]
        );
        assert!(env.step(Action::Idle).is_err());
    }

    #[test]
    fn single_trial_ends_on_consumption() {
        let mut config = base_config();
        config.agent.single_trial = true;
        config.agent.auto_eat = true;
        config.resources = food_at(Vec2::new(0.0, 0.5));
        let mut env = environment(config);
        env.step(Action::Idle).unwrap();
        let out = env.step(Action::Idle).unwrap();
        assert!(out.done);
        assert_eq!(out.info.end_reason, Some(EpisodeEndReason::ResourceConsumed));
    }

    #[test]
    fn food_out_of_range_terminates() {
        let mut config = base_config();
        config.simulation.fixed_delta_time = 0.25;
        config.agent.food_coefficients = Coefficients { c0: -1.0, ..zero() };
        let mut env = environment(config);
        // c0 * max * dt = -2.5 per tick; -10 is still in range, -12.5 is not.
        let mut ticks = 0;
        let reason = loop {
            let out = env.step(Action::Idle).unwrap();
            ticks += 1;
            if out.done {
                break out.info.end_reason;
            }
        };
        assert_eq!(reason, Some(EpisodeEndReason::FoodLevelOutOfRange));
        assert_eq!(ticks, 5);
    }

    #[test]
    fn health_never_exceeds_maximum() {
        let mut config = base_config();
        config.agent.health_range = EvRange::new(-15.0, 1.0);
        config.agent.health_coefficients = Coefficients { c0: 1.0, ..zero() };
        config.agent.max_steps = 200;
        let mut env = environment(config);
        loop {
            let out = env.step(Action::Idle).unwrap();
            assert!(out.info.levels.health <= 1.0);
            if out.done {
                assert_eq!(out.info.end_reason, Some(EpisodeEndReason::HealthLevelTooLow));
                break;
            }
        }
    }

    #[test]
    fn walking_into_a_wall_hurts() {
        let mut config = base_config();
        config.agent.init_position = Vec2::new(0.0, 19.4);
        config.agent.init_heading = 0.0;
        // A 0.3 overshoot at the default scale is an impulse near 90.
        config.agent.move_speed = 15.0;
        config.agent.damage_constant = 0.5;
        let mut env = environment(config);
        let out = env.step(Action::MoveForward).unwrap();
        assert!(!out.done);
        let expected = collision_damage(env.state().last_impulse, 0.5);
        assert!(expected > COLLISION_COUNT_THRESHOLD);
        assert!(expected < 15.0);
        assert!((out.info.levels.health - expected).abs() < 1e-9);
        assert_eq!(env.state().counts.collision, 1);
        // The counter is part of the observation tail.
        let tail = out.observation.values().last().copied().unwrap();
        assert!((tail - 1.0).abs() < f64::EPSILON);
        assert_eq!(env.recorder().summary(None).collisions, 1);
    }

    #[test]
    fn hard_collision_ends_the_episode_at_the_health_cap() {
        let mut config = base_config();
        config.agent.init_position = Vec2::new(0.0, 19.4);
        config.agent.init_heading = 0.0;
        config.agent.move_speed = 100.0;
        config.agent.damage_constant = 1.0;
        config.agent.health_range = EvRange::new(-15.0, 5.0);
        let mut env = environment(config);
        let out = env.step(Action::MoveForward).unwrap();
        assert!(out.done);
        assert_eq!(out.info.end_reason, Some(EpisodeEndReason::HealthLevelTooLow));
        assert!((out.info.levels.health - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn terminating_collision_reward_uses_pre_contact_levels() {
        let mut config = base_config();
        config.agent.init_position = Vec2::new(0.0, 19.4);
        config.agent.init_heading = 0.0;
        config.agent.move_speed = 100.0;
        config.agent.damage_constant = 1.0;
        config.agent.health_range = EvRange::new(-15.0, 5.0);
        let mut env = environment(config);
        let out = env.step(Action::MoveForward).unwrap();
        assert!(out.done);
        // The reward is computed before physics, at the all-zero start.
        assert!(out.reward.abs() < f64::EPSILON);
        assert!(out.info.average_reward.abs() < f64::EPSILON);
        let after = env.state().homeostasis.reward(&out.info.levels);
        assert!(after < 0.0);
    }

    #[test]
    fn event_zone_sets_levels_once() {
        let mut config = base_config();
        config.agent.init_position = Vec2::ZERO;
        config.agent.init_heading = 0.0;
        config.agent.move_speed = 10.0;
        config.events = EventsConfig {
            groups: vec![EventGroupConfig {
                name: "oasis".to_owned(),
                trigger_tag: "oasis".to_owned(),
                target_tag: "agent".to_owned(),
                max_count: 1,
                position: Vec2::new(0.0, 1.0),
                radius: 0.5,
                food_value: 20.0,
                water_value: 3.0,
                message: None,
            }],
        };
        let mut env = environment(config);
        let mut fired = Vec::new();
        for _ in 0..10 {
            let out = env.step(Action::MoveForward).unwrap();
            fired.extend(env.last_summary().map(|s| s.events.clone()).unwrap_or_default());
            if out.done {
                break;
            }
        }
        assert_eq!(fired, vec!["oasis".to_owned()]);
        // Food is clamped into its range.
        assert!((env.state().levels.food - 10.0).abs() < f64::EPSILON);
        assert!((env.state().levels.water - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn stepping_a_finished_episode_is_an_error() {
        let mut config = base_config();
        config.agent.max_steps = 1;
        let mut env = environment(config);
        assert!(env.step(Action::Idle).unwrap().done);
        let err = env.step(Action::Idle).unwrap_err();
        assert!(err.to_string().contains("already ended"));
    }
}
