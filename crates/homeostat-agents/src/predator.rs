//! Predators: configuration, the behaviour state machine, and spawning.
//!
//! Each predator cycles through four states:
//!
//! ```text
//!            view                      view
//!  Resting ---------> Chasing <------------- Searching
//!     ^  \               |   \                 ^  |
//!     |   `-- timeout ---+----`-- lost/outside -'  |
//!     |                  | contact                 |
//!     |                  v                         |
//!     |              Attacking --- lost/exit ------'
//!     `------------------------- timeout ----------'
//! ```
//!
//! Night (the coarse daylight signal) forces the predator into `Resting` no
//! matter what it was doing. Chasing is confined
//! to the landmark hull; a predator that strays outside is redirected.

use homeostat_types::{Aabb, Daylight, Pose, PredatorId, PredatorState, Vec2};
use homeostat_world::{
    ConvexHull, DEFAULT_OVERLAP_PADDING, MAX_PLACEMENT_ATTEMPTS, PositionRange, SimRng,
    is_overlapping,
};
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::AgentError;
use crate::services::{ArrivalStatus, MoveRequest, Navigation, Physics};

/// Behaviour parameters shared by every predator of a group.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredatorConfig {
    /// Travel speed in units per second.
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f64,

    /// Turn rate in degrees per second.
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f64,

    /// Full field-of-view angle in degrees.
    #[serde(default = "default_view_angle")]
    pub view_angle: f64,

    /// Maximum sighting distance.
    #[serde(default = "default_view_distance")]
    pub view_distance: f64,

    /// Damage per attacking tick before capping.
    #[serde(default = "default_damage_amount")]
    pub damage_amount: f64,

    /// Cap on damage per attacking tick.
    #[serde(default = "default_max_damage")]
    pub max_damage: f64,

    /// Ticks spent resting before searching again.
    #[serde(default = "default_max_resting_steps")]
    pub max_resting_steps: u32,

    /// Ticks spent searching before resting.
    #[serde(default = "default_max_searching_steps")]
    pub max_searching_steps: u32,

    /// A new roaming destination is picked every this many searching ticks.
    #[serde(default = "default_searching_interval")]
    pub searching_interval: u32,

    /// Consecutive ticks outside the landmark hull before a redirect.
    #[serde(default = "default_max_outside_steps")]
    pub max_outside_steps: u32,

    /// Body radius used for contact with the agent.
    #[serde(default = "default_radius")]
    pub radius: f64,
}

impl Default for PredatorConfig {
    fn default() -> Self {
        Self {
            walk_speed: default_walk_speed(),
            turn_speed: default_turn_speed(),
            view_angle: default_view_angle(),
            view_distance: default_view_distance(),
            damage_amount: default_damage_amount(),
            max_damage: default_max_damage(),
            max_resting_steps: default_max_resting_steps(),
            max_searching_steps: default_max_searching_steps(),
            searching_interval: default_searching_interval(),
            max_outside_steps: default_max_outside_steps(),
            radius: default_radius(),
        }
    }
}

impl PredatorConfig {
    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] for a zero searching interval,
    /// a negative speed, distance, or damage, or a view angle outside
    /// `[0, 360]`.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.searching_interval == 0 {
            return Err(AgentError::invalid(
                "predators.searching_interval",
                "must be at least 1",
            ));
        }
        let non_negative = [
            ("predators.walk_speed", self.walk_speed),
            ("predators.turn_speed", self.turn_speed),
            ("predators.view_distance", self.view_distance),
            ("predators.damage_amount", self.damage_amount),
            ("predators.max_damage", self.max_damage),
            ("predators.radius", self.radius),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(AgentError::invalid(field, "must be finite and non-negative"));
            }
        }
        if !(0.0..=360.0).contains(&self.view_angle) {
            return Err(AgentError::invalid(
                "predators.view_angle",
                "must be between 0 and 360 degrees",
            ));
        }
        Ok(())
    }

    /// Damage dealt per attacking tick.
    pub fn damage_per_tick(&self) -> f64 {
        self.damage_amount.min(self.max_damage)
    }
}

/// One group of predators in the configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredatorGroupConfig {
    /// Group name used in logs.
    #[serde(default)]
    pub name: String,

    /// Number of predators to spawn.
    #[serde(default = "default_group_count")]
    pub count: u32,

    /// Spawn range, relative to the arena origin.
    pub position: PositionRange,

    /// Footprint extents used for overlap checks.
    #[serde(default = "default_footprint")]
    pub footprint: Vec2,

    /// Behaviour parameters.
    #[serde(default)]
    pub behaviour: PredatorConfig,
}

/// Predator configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PredatorsConfig {
    /// Predator groups; empty disables predators.
    #[serde(default)]
    pub groups: Vec<PredatorGroupConfig>,

    /// Clearance kept around each spawn.
    #[serde(default = "default_padding")]
    pub overlap_padding: f64,
}

impl Default for PredatorsConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            overlap_padding: default_padding(),
        }
    }
}

impl PredatorsConfig {
    /// Validate every group.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] for an unordered spawn range or
    /// invalid behaviour parameters.
    pub fn validate(&self) -> Result<(), AgentError> {
        for group in &self.groups {
            if !group.position.is_ordered() {
                return Err(AgentError::invalid(
                    "predators.groups.position",
                    format!("group '{}': min must not exceed max", group.name),
                ));
            }
            group.behaviour.validate()?;
        }
        Ok(())
    }
}

/// Everything a predator reads or drives during one decision.
pub struct PredatorContext<'a> {
    /// Coarse daylight signal.
    pub daylight: Daylight,
    /// Agent position.
    pub agent: Vec2,
    /// Landmark positions, the preferred roaming destinations.
    pub landmarks: &'a [Vec2],
    /// Hull bounding the chase area.
    pub hull: &'a ConvexHull,
    /// Navigation collaborator.
    pub navigation: &'a mut dyn Navigation,
    /// Perception collaborator.
    pub physics: &'a dyn Physics,
    /// Predator random stream.
    pub rng: &'a mut SimRng,
}

/// A predator and its behaviour state.
#[derive(Debug, Clone, PartialEq)]
pub struct Predator {
    id: PredatorId,
    pose: Pose,
    config: PredatorConfig,
    state: PredatorState,
    resting_steps: u32,
    searching_steps: u32,
    outside_steps: u32,
    target: Option<Vec2>,
    in_contact: bool,
    inside_area: bool,
    initialized: bool,
}

impl Predator {
    /// Create an uninitialised predator. It ignores
    /// [`Predator::take_action`] until [`Predator::initialize`] is called.
    pub const fn new(id: PredatorId, pose: Pose, config: PredatorConfig) -> Self {
        Self {
            id,
            pose,
            config,
            state: PredatorState::Searching,
            resting_steps: 0,
            searching_steps: 0,
            outside_steps: 0,
            target: None,
            in_contact: false,
            inside_area: false,
            initialized: false,
        }
    }

    /// Randomise the counters, enter `Searching`, and start accepting
    /// decisions.
    ///
    /// The searching counter starts in `[0, searching_interval)` and the
    /// resting counter in `[0, max_resting_steps / 2)` so predators spawned
    /// together fall out of step.
    pub fn initialize(&mut self, navigation: &mut dyn Navigation, rng: &mut SimRng) {
        if self.initialized {
            return;
        }
        self.searching_steps = rng.random_range(0..self.config.searching_interval.max(1));
        self.resting_steps = rng.random_range(0..(self.config.max_resting_steps / 2).max(1));
        self.initialized = true;
        self.state = PredatorState::Searching;
        navigation.resume(self.id);
    }

    /// Make one decision. Returns the damage dealt to the agent this tick.
    ///
    /// Night forces `Resting` first, even on a tick whose navigation request
    /// had no path. Otherwise a no-op when uninitialised or when the last
    /// request had no path (the failed request is cleared for the next tick).
    pub fn take_action(&mut self, ctx: &mut PredatorContext<'_>) -> f64 {
        if !self.initialized {
            return 0.0;
        }
        if ctx.daylight == Daylight::Night {
            if self.state != PredatorState::Resting {
                self.change_state(PredatorState::Resting, ctx.navigation);
            }
            return 0.0;
        }
        if ctx.navigation.query_arrival(self.id) == ArrivalStatus::NoPath {
            debug!(predator = %self.id, "No path to destination, skipping tick");
            ctx.navigation.clear(self.id);
            return 0.0;
        }

        self.inside_area = ctx.hull.contains(self.pose.position);
        if self.inside_area {
            self.outside_steps = 0;
        } else {
            self.outside_steps = self.outside_steps.saturating_add(1);
            if self.outside_steps >= self.config.max_outside_steps {
                self.choose_random_destination(ctx);
                self.outside_steps = 0;
            }
        }

        let mut damage = 0.0;
        match self.state {
            PredatorState::Resting => {
                self.resting_steps = self.resting_steps.saturating_add(1);
                if self.view(ctx) {
                    self.change_state(PredatorState::Chasing, ctx.navigation);
                } else if self.resting_steps >= self.config.max_resting_steps {
                    self.change_state(PredatorState::Searching, ctx.navigation);
                }
            }
            PredatorState::Searching => {
                self.searching_steps = self.searching_steps.saturating_add(1);
                if self
                    .searching_steps
                    .checked_rem(self.config.searching_interval)
                    == Some(0)
                {
                    self.choose_random_destination(ctx);
                }
                if self.view(ctx) {
                    self.change_state(PredatorState::Chasing, ctx.navigation);
                } else if self.searching_steps >= self.config.max_searching_steps {
                    self.change_state(PredatorState::Resting, ctx.navigation);
                }
            }
            PredatorState::Chasing => match self.target {
                Some(target) => {
                    if !ctx.hull.contains(self.pose.position) {
                        self.target = None;
                        self.change_state(PredatorState::Searching, ctx.navigation);
                    } else {
                        self.move_to(target, ctx.navigation);
                        if !self.view(ctx) {
                            self.change_state(PredatorState::Searching, ctx.navigation);
                        }
                    }
                }
                None => self.change_state(PredatorState::Searching, ctx.navigation),
            },
            PredatorState::Attacking => {
                if self.target.is_some() {
                    damage = self.config.damage_per_tick();
                    if !self.view(ctx) {
                        self.change_state(PredatorState::Searching, ctx.navigation);
                    }
                } else {
                    self.change_state(PredatorState::Searching, ctx.navigation);
                }
            }
        }
        damage
    }

    /// Report whether the predator touches the agent this tick.
    ///
    /// Entering contact switches to `Attacking`; leaving it drops the
    /// target and returns to `Searching`.
    pub fn update_contact(&mut self, touching: bool, agent: Vec2, navigation: &mut dyn Navigation) {
        if touching == self.in_contact {
            return;
        }
        self.in_contact = touching;
        if touching {
            self.target = Some(agent);
            self.change_state(PredatorState::Attacking, navigation);
        } else {
            self.target = None;
            self.change_state(PredatorState::Searching, navigation);
        }
    }

    /// Move one tick along the current path.
    pub fn advance(&mut self, navigation: &mut dyn Navigation, dt: f64) {
        navigation.advance(
            self.id,
            &mut self.pose,
            self.config.walk_speed,
            self.config.turn_speed,
            dt,
        );
    }

    /// Switch state and apply its entry actions.
    pub fn change_state(&mut self, next: PredatorState, navigation: &mut dyn Navigation) {
        if self.state != next {
            debug!(predator = %self.id, from = ?self.state, to = ?next, "Predator state change");
        }
        self.state = next;
        match next {
            PredatorState::Resting => {
                navigation.stop(self.id);
                self.resting_steps = 0;
            }
            PredatorState::Searching => {
                navigation.resume(self.id);
                self.searching_steps = 0;
            }
            PredatorState::Chasing => navigation.resume(self.id),
            PredatorState::Attacking => navigation.stop(self.id),
        }
    }

    /// Field-of-view test; caches the sighted position as the target.
    fn view(&mut self, ctx: &PredatorContext<'_>) -> bool {
        self.target = ctx.physics.query_visible(
            &self.pose,
            ctx.agent,
            self.config.view_distance,
            self.config.view_angle,
        );
        self.target.is_some()
    }

    /// Pick a roaming destination: a random landmark if any exist, else a
    /// reachable point within view distance.
    fn choose_random_destination(&self, ctx: &mut PredatorContext<'_>) {
        let destination = if ctx.landmarks.is_empty() {
            let r = self.config.view_distance * ctx.rng.random_range(0.0_f64..=1.0).sqrt();
            let angle = ctx.rng.random_range(0.0..360.0);
            let candidate = self.pose.position.plus(Vec2::from_heading(angle).scale(r));
            ctx.navigation
                .sample_reachable(candidate, self.config.view_distance, ctx.rng)
        } else {
            let index = ctx.rng.random_range(0..ctx.landmarks.len());
            ctx.landmarks.get(index).copied()
        };
        if let Some(point) = destination {
            self.move_to(point, ctx.navigation);
        }
    }

    fn move_to(&self, target: Vec2, navigation: &mut dyn Navigation) {
        if navigation.request_move(self.id, self.pose.position, target) == MoveRequest::Rejected {
            debug!(predator = %self.id, x = target.x, z = target.z, "Move request rejected");
        }
    }

    /// Identifier.
    pub const fn id(&self) -> PredatorId {
        self.id
    }

    /// Current pose.
    pub const fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Current behaviour state.
    pub const fn state(&self) -> PredatorState {
        self.state
    }

    /// Behaviour parameters.
    pub const fn config(&self) -> &PredatorConfig {
        &self.config
    }

    /// Whether the last decision found the predator inside the hull.
    pub const fn inside_area(&self) -> bool {
        self.inside_area
    }

    /// Whether the predator is touching the agent.
    pub const fn in_contact(&self) -> bool {
        self.in_contact
    }

    /// Whether [`Predator::initialize`] has run.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Resting and searching counters.
    pub const fn counters(&self) -> (u32, u32) {
        (self.resting_steps, self.searching_steps)
    }

    /// Square footprint around the body.
    pub fn footprint(&self) -> Aabb {
        let diameter = self.config.radius * 2.0;
        Aabb::from_center(self.pose.position, Vec2::new(diameter, diameter))
    }
}

/// Spawn and initialise every configured predator.
///
/// Each spawn is rejection-sampled against `occupied` plus previously
/// spawned predators. A predator with no free position after the attempt
/// budget is skipped with a warning.
pub fn spawn_predators(
    config: &PredatorsConfig,
    origin: Vec2,
    occupied: &[Aabb],
    navigation: &mut dyn Navigation,
    rng: &mut SimRng,
) -> Vec<Predator> {
    let mut predators = Vec::new();
    let mut taken: Vec<Aabb> = occupied.to_vec();
    let mut next_id = PredatorId::new(0);

    for group in &config.groups {
        let range = group.position.offset(origin);
        for _ in 0..group.count {
            let position = (0..MAX_PLACEMENT_ATTEMPTS)
                .map(|_| range.sample(rng))
                .find(|p| !is_overlapping(*p, group.footprint, config.overlap_padding, &taken));
            let Some(position) = position else {
                warn!(
                    group = %group.name,
                    attempts = MAX_PLACEMENT_ATTEMPTS,
                    "No free predator spawn position, skipping"
                );
                continue;
            };

            let heading = rng.random_range(0.0..360.0);
            let mut predator =
                Predator::new(next_id, Pose::new(position, heading), group.behaviour.clone());
            predator.initialize(navigation, rng);
            taken.push(Aabb::from_center(position, group.footprint));
            predators.push(predator);
            next_id = next_id.next();
        }
    }

    info!(predators = predators.len(), "Predators spawned");
    predators
}

const fn default_walk_speed() -> f64 {
    3.0
}

const fn default_turn_speed() -> f64 {
    180.0
}

const fn default_view_angle() -> f64 {
    120.0
}

const fn default_view_distance() -> f64 {
    10.0
}

const fn default_damage_amount() -> f64 {
    1.0
}

const fn default_max_damage() -> f64 {
    5.0
}

const fn default_max_resting_steps() -> u32 {
    50
}

const fn default_max_searching_steps() -> u32 {
    150
}

const fn default_searching_interval() -> u32 {
    60
}

const fn default_max_outside_steps() -> u32 {
    1
}

const fn default_radius() -> f64 {
    0.5
}

const fn default_group_count() -> u32 {
    1
}

const fn default_footprint() -> Vec2 {
    Vec2::new(1.0, 1.0)
}

const fn default_padding() -> f64 {
    DEFAULT_OVERLAP_PADDING
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use homeostat_world::{Stream, derive_rng};

    use super::*;
    use crate::services::MotionOutcome;

    /// Navigator that records calls and never moves anything.
    #[derive(Default)]
    struct ScriptedNav {
        stopped: HashMap<PredatorId, bool>,
        destinations: Vec<Vec2>,
        no_path: bool,
        cleared: u32,
    }

    impl Navigation for ScriptedNav {
        fn rebuild(&mut self, _blocked: &[Aabb]) {}

        fn request_move(&mut self, _id: PredatorId, _from: Vec2, target: Vec2) -> MoveRequest {
            self.destinations.push(target);
            MoveRequest::Accepted
        }

        fn query_arrival(&self, _id: PredatorId) -> ArrivalStatus {
            if self.no_path {
                ArrivalStatus::NoPath
            } else {
                ArrivalStatus::Pending
            }
        }

        fn stop(&mut self, id: PredatorId) {
            self.stopped.insert(id, true);
        }

        fn resume(&mut self, id: PredatorId) {
            self.stopped.insert(id, false);
        }

        fn clear(&mut self, _id: PredatorId) {
            self.no_path = false;
            self.cleared = self.cleared.saturating_add(1);
        }

        fn sample_reachable(&self, center: Vec2, _radius: f64, _rng: &mut SimRng) -> Option<Vec2> {
            Some(center)
        }

        fn advance(&mut self, _id: PredatorId, _pose: &mut Pose, _s: f64, _t: f64, _dt: f64) {}
    }

    /// Open field with no obstacles.
    struct OpenField;

    impl Physics for OpenField {
        fn rebuild(&mut self, _solid: &[Aabb]) {}

        fn resolve_motion(&self, _from: Vec2, to: Vec2, _radius: f64, _dt: f64) -> MotionOutcome {
            MotionOutcome {
                position: to,
                contacts: Vec::new(),
            }
        }

        fn raycast(&self, _origin: Vec2, _direction: Vec2, _max: f64) -> bool {
            false
        }

        fn line_of_sight(&self, _from: Vec2, _to: Vec2) -> bool {
            true
        }
    }

    fn big_hull() -> ConvexHull {
        ConvexHull::build(&[
            Vec2::new(-50.0, -50.0),
            Vec2::new(50.0, -50.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(-50.0, 50.0),
        ])
    }

    fn predator(nav: &mut ScriptedNav, rng: &mut SimRng) -> Predator {
        let mut p = Predator::new(
            PredatorId::new(0),
            Pose::new(Vec2::ZERO, 0.0),
            PredatorConfig::default(),
        );
        p.initialize(nav, rng);
        p
    }

    fn tick(
        p: &mut Predator,
        nav: &mut ScriptedNav,
        rng: &mut SimRng,
        daylight: Daylight,
        agent: Vec2,
        hull: &ConvexHull,
    ) -> f64 {
        let landmarks = [Vec2::new(5.0, 5.0)];
        let mut ctx = PredatorContext {
            daylight,
            agent,
            landmarks: &landmarks,
            hull,
            navigation: nav,
            physics: &OpenField,
            rng,
        };
        p.take_action(&mut ctx)
    }

    #[test]
    fn initialization_randomises_counters() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(1, Stream::Predators);
        let p = predator(&mut nav, &mut rng);
        assert!(p.is_initialized());
        assert_eq!(p.state(), PredatorState::Searching);
        let (resting, _) = p.counters();
        assert!(resting < 25);
    }

    #[test]
    fn uninitialised_predator_is_inert() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(1, Stream::Predators);
        let mut p = Predator::new(
            PredatorId::new(0),
            Pose::new(Vec2::ZERO, 0.0),
            PredatorConfig::default(),
        );
        let hull = big_hull();
        let dealt = tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 2.0), &hull);
        assert!(dealt.abs() < f64::EPSILON);
        assert_eq!(p.state(), PredatorState::Searching);
        assert!(nav.destinations.is_empty());
    }

    #[test]
    fn night_forces_rest_from_any_state() {
        let hull = big_hull();
        for start in [
            PredatorState::Searching,
            PredatorState::Chasing,
            PredatorState::Attacking,
        ] {
            let mut nav = ScriptedNav::default();
            let mut rng = derive_rng(2, Stream::Predators);
            let mut p = predator(&mut nav, &mut rng);
            p.change_state(start, &mut nav);
            tick(&mut p, &mut nav, &mut rng, Daylight::Night, Vec2::ZERO, &hull);
            assert_eq!(p.state(), PredatorState::Resting);
            assert_eq!(nav.stopped.get(&p.id()), Some(&true));
        }
    }

    #[test]
    fn visible_agent_triggers_chase() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(3, Stream::Predators);
        let mut p = predator(&mut nav, &mut rng);
        let hull = big_hull();
        // Heading 0 faces +z; the agent is straight ahead.
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 4.0), &hull);
        assert_eq!(p.state(), PredatorState::Chasing);

        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 4.0), &hull);
        assert_eq!(p.state(), PredatorState::Chasing);
        assert_eq!(nav.destinations.last(), Some(&Vec2::new(0.0, 4.0)));

        // Agent behind the predator: lost from view.
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, -4.0), &hull);
        assert_eq!(p.state(), PredatorState::Searching);
    }

    #[test]
    fn agent_outside_view_cone_or_range_is_not_seen() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(4, Stream::Predators);
        let mut p = predator(&mut nav, &mut rng);
        let hull = big_hull();
        // 61 degrees off-axis with a 120 degree cone.
        let side = Vec2::from_heading(61.0).scale(3.0);
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, side, &hull);
        assert_eq!(p.state(), PredatorState::Searching);
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 11.0), &hull);
        assert_eq!(p.state(), PredatorState::Searching);
    }

    #[test]
    fn chase_aborts_outside_hull() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(5, Stream::Predators);
        let mut p = predator(&mut nav, &mut rng);
        let hull = big_hull();
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 4.0), &hull);
        assert_eq!(p.state(), PredatorState::Chasing);

        let far_hull = ConvexHull::build(&[
            Vec2::new(100.0, 100.0),
            Vec2::new(110.0, 100.0),
            Vec2::new(110.0, 110.0),
        ]);
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 4.0), &far_hull);
        assert_eq!(p.state(), PredatorState::Searching);
    }

    #[test]
    fn outside_counter_redirects_to_landmark() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(6, Stream::Predators);
        let mut p = predator(&mut nav, &mut rng);
        let far_hull = ConvexHull::build(&[
            Vec2::new(100.0, 100.0),
            Vec2::new(110.0, 100.0),
            Vec2::new(110.0, 110.0),
        ]);
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, -40.0), &far_hull);
        assert!(!p.inside_area());
        assert_eq!(nav.destinations.first(), Some(&Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn contact_attacks_with_capped_damage() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(7, Stream::Predators);
        let mut p = Predator::new(
            PredatorId::new(0),
            Pose::new(Vec2::ZERO, 0.0),
            PredatorConfig {
                damage_amount: 9.0,
                max_damage: 5.0,
                ..PredatorConfig::default()
            },
        );
        p.initialize(&mut nav, &mut rng);
        let agent = Vec2::new(0.0, 0.8);
        p.update_contact(true, agent, &mut nav);
        assert_eq!(p.state(), PredatorState::Attacking);
        assert_eq!(nav.stopped.get(&p.id()), Some(&true));

        let hull = big_hull();
        let dealt = tick(&mut p, &mut nav, &mut rng, Daylight::Day, agent, &hull);
        assert!((dealt - 5.0).abs() < f64::EPSILON);
        assert_eq!(p.state(), PredatorState::Attacking);

        p.update_contact(false, agent, &mut nav);
        assert_eq!(p.state(), PredatorState::Searching);
    }

    #[test]
    fn searching_times_out_into_rest() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(8, Stream::Predators);
        let mut p = Predator::new(
            PredatorId::new(0),
            Pose::new(Vec2::ZERO, 0.0),
            PredatorConfig {
                max_searching_steps: 3,
                searching_interval: 2,
                ..PredatorConfig::default()
            },
        );
        p.initialize(&mut nav, &mut rng);
        let hull = big_hull();
        let hidden = Vec2::new(0.0, -30.0);
        for _ in 0..3 {
            tick(&mut p, &mut nav, &mut rng, Daylight::Day, hidden, &hull);
        }
        assert_eq!(p.state(), PredatorState::Resting);
        // One destination at searching step 2.
        assert_eq!(nav.destinations.len(), 1);
    }

    #[test]
    fn no_path_skips_one_tick() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(9, Stream::Predators);
        let mut p = predator(&mut nav, &mut rng);
        nav.no_path = true;
        let hull = big_hull();
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 4.0), &hull);
        assert_eq!(p.state(), PredatorState::Searching);
        assert_eq!(nav.cleared, 1);
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, 4.0), &hull);
        assert_eq!(p.state(), PredatorState::Chasing);
    }

    #[test]
    fn night_rest_wins_over_no_path() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(9, Stream::Predators);
        let mut p = predator(&mut nav, &mut rng);
        p.change_state(PredatorState::Chasing, &mut nav);
        nav.no_path = true;
        let hull = big_hull();
        let dealt = tick(&mut p, &mut nav, &mut rng, Daylight::Night, Vec2::ZERO, &hull);
        assert!(dealt.abs() < f64::EPSILON);
        assert_eq!(p.state(), PredatorState::Resting);
        assert_eq!(nav.stopped.get(&p.id()), Some(&true));
    }

    #[test]
    fn daylight_does_not_force_rest() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(2, Stream::Predators);
        let mut p = predator(&mut nav, &mut rng);
        p.change_state(PredatorState::Chasing, &mut nav);
        let hull = big_hull();
        // Agent behind the predator and out of view: the chase is kept.
        tick(&mut p, &mut nav, &mut rng, Daylight::Day, Vec2::new(0.0, -4.0), &hull);
        assert_ne!(p.state(), PredatorState::Resting);
    }

    #[test]
    fn spawner_skips_blocked_predators() {
        let mut nav = ScriptedNav::default();
        let mut rng = derive_rng(10, Stream::Predators);
        let config = PredatorsConfig {
            groups: vec![PredatorGroupConfig {
                name: "wolves".to_owned(),
                count: 3,
                position: PositionRange {
                    min: Vec2::new(-10.0, -10.0),
                    max: Vec2::new(10.0, 10.0),
                },
                footprint: Vec2::new(1.0, 1.0),
                behaviour: PredatorConfig::default(),
            }],
            overlap_padding: 0.5,
        };
        let spawned = spawn_predators(&config, Vec2::ZERO, &[], &mut nav, &mut rng);
        assert_eq!(spawned.len(), 3);
        assert!(spawned.iter().all(Predator::is_initialized));

        let wall = [Aabb::from_center(Vec2::ZERO, Vec2::new(100.0, 100.0))];
        let blocked = spawn_predators(&config, Vec2::ZERO, &wall, &mut nav, &mut rng);
        assert!(blocked.is_empty());
    }

    #[test]
    fn invalid_interval_is_rejected() {
        let cfg = PredatorConfig {
            searching_interval: 0,
            ..PredatorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
