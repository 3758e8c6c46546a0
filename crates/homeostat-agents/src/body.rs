//! The agent's body: pose, action kinematics, spawning, and eating.

use homeostat_types::{Aabb, Action, Pose, ResourceId, Vec2};
use homeostat_world::{ResourcePool, SimRng, find_free_position};
use rand::Rng;
use tracing::debug;

use crate::config::AgentConfig;

/// Physical state of the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentBody {
    pose: Pose,
    radius: f64,
    velocity: Vec2,
    eat_intent: bool,
}

impl AgentBody {
    /// Place a new body according to the spawn settings.
    ///
    /// With `random_spawn` the position is rejection-sampled against
    /// `occupied` and the heading is uniform; after the attempt budget runs
    /// out the fixed initial position is used.
    pub fn spawn(config: &AgentConfig, origin: Vec2, rng: &mut SimRng, occupied: &[Aabb]) -> Self {
        let mut body = Self {
            pose: Pose::default(),
            radius: config.body_radius,
            velocity: Vec2::ZERO,
            eat_intent: false,
        };
        body.respawn(config, origin, rng, occupied);
        body
    }

    /// Reset pose, velocity, and intent for a new episode.
    pub fn respawn(
        &mut self,
        config: &AgentConfig,
        origin: Vec2,
        rng: &mut SimRng,
        occupied: &[Aabb],
    ) {
        let fixed = origin.plus(config.init_position);
        self.pose = if config.random_spawn {
            let range = config.random_position_range.offset(origin);
            let diameter = config.body_radius * 2.0;
            let placement = find_free_position(
                rng,
                |r| range.sample(r),
                Vec2::new(diameter, diameter),
                0.0,
                occupied,
                fixed,
                "agent",
            );
            Pose::new(placement.position, rng.random_range(0.0..360.0))
        } else {
            Pose::new(fixed, config.init_heading)
        };
        self.radius = config.body_radius;
        self.velocity = Vec2::ZERO;
        self.eat_intent = false;
        debug!(
            x = self.pose.position.x,
            z = self.pose.position.z,
            heading = self.pose.heading,
            "Agent spawned"
        );
    }

    /// Apply one discrete action.
    ///
    /// Turns take effect immediately; forward motion only sets the
    /// velocity, which the physics phase later resolves. Every action other
    /// than `Eat` clears the eat intent.
    pub fn apply_action(&mut self, action: Action, config: &AgentConfig, dt: f64) {
        self.eat_intent = false;
        self.velocity = Vec2::ZERO;
        match action {
            Action::Idle => {}
            Action::MoveForward => {
                self.velocity = self.pose.forward().scale(config.move_speed);
            }
            Action::TurnLeft => self.pose.rotate(-config.turn_speed * dt),
            Action::TurnRight => self.pose.rotate(config.turn_speed * dt),
            Action::Eat => self.eat_intent = true,
        }
    }

    /// Where the body would be after `dt` seconds without obstruction.
    pub fn desired_position(&self, dt: f64) -> Vec2 {
        self.pose.position.plus(self.velocity.scale(dt))
    }

    /// Move to a resolved position.
    pub const fn set_position(&mut self, position: Vec2) {
        self.pose.position = position;
    }

    /// Resource the body may eat right now, if any.
    ///
    /// Requires `auto_eat` or a pending Eat intent and an active resource
    /// within the eating distance.
    pub fn edible_resource(&self, config: &AgentConfig, pool: &ResourcePool) -> Option<ResourceId> {
        if !(config.auto_eat || self.eat_intent) {
            return None;
        }
        pool.nearest_active_within(self.pose.position, config.eating_distance)
            .map(|r| r.id)
    }

    /// Current pose.
    pub const fn pose(&self) -> &Pose {
        &self.pose
    }

    /// World-space position.
    pub const fn position(&self) -> Vec2 {
        self.pose.position
    }

    /// Body radius.
    pub const fn radius(&self) -> f64 {
        self.radius
    }

    /// Whether the last action was Eat.
    pub const fn eat_intent(&self) -> bool {
        self.eat_intent
    }

    /// Square footprint around the body.
    pub fn footprint(&self) -> Aabb {
        let diameter = self.radius * 2.0;
        Aabb::from_center(self.pose.position, Vec2::new(diameter, diameter))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use homeostat_types::{PlacementPolicy, ResourceKind};
    use homeostat_world::{
        Arena, ArenaConfig, PositionRange, ResourceConfig, ResourceGroupConfig, RotationRange,
        ScaleRange, Stream, derive_rng,
    };

    use super::*;

    fn rng() -> SimRng {
        derive_rng(3, Stream::Agent)
    }

    #[test]
    fn fixed_spawn_uses_origin_offset() {
        let cfg = AgentConfig {
            init_position: Vec2::new(1.0, 2.0),
            init_heading: 450.0,
            ..AgentConfig::default()
        };
        let body = AgentBody::spawn(&cfg, Vec2::new(10.0, 10.0), &mut rng(), &[]);
        assert_eq!(body.position(), Vec2::new(11.0, 12.0));
        assert!((body.pose().heading - 90.0).abs() < 1e-9);
    }

    #[test]
    fn random_spawn_falls_back_when_blocked() {
        let cfg = AgentConfig {
            random_spawn: true,
            init_position: Vec2::new(3.0, 3.0),
            ..AgentConfig::default()
        };
        let wall = [Aabb::from_center(Vec2::ZERO, Vec2::new(500.0, 500.0))];
        let body = AgentBody::spawn(&cfg, Vec2::ZERO, &mut rng(), &wall);
        assert_eq!(body.position(), Vec2::new(3.0, 3.0));
    }

    #[test]
    fn actions_move_and_turn() {
        let cfg = AgentConfig {
            move_speed: 2.0,
            turn_speed: 90.0,
            ..AgentConfig::default()
        };
        let mut body = AgentBody::spawn(&cfg, Vec2::ZERO, &mut rng(), &[]);

        body.apply_action(Action::MoveForward, &cfg, 0.5);
        let ahead = body.desired_position(0.5);
        assert!((ahead.z - 1.0).abs() < 1e-9);
        assert!(ahead.x.abs() < 1e-9);

        body.apply_action(Action::TurnRight, &cfg, 1.0);
        assert!((body.pose().heading - 90.0).abs() < 1e-9);
        assert_eq!(body.desired_position(1.0), body.position());

        body.apply_action(Action::TurnLeft, &cfg, 2.0);
        assert!((body.pose().heading - 270.0).abs() < 1e-9);
    }

    #[test]
    fn eating_requires_intent_and_reach() {
        let arena = Arena::new(&ArenaConfig::default()).unwrap();
        let resources = ResourceConfig {
            groups: vec![ResourceGroupConfig {
                name: "apple".to_owned(),
                label: String::new(),
                kind: ResourceKind::Food,
                policy: PlacementPolicy::Static,
                count: 1,
                position: PositionRange::point(Vec2::new(0.0, 1.0)),
                rotation: RotationRange::default(),
                scale: ScaleRange::default(),
                footprint: Vec2::new(0.5, 0.5),
                scent: None,
            }],
            overlap_padding: 0.0,
        };
        let mut pool = ResourcePool::new(&resources, &arena).unwrap();
        pool.reset(&mut rng(), &[]);

        let cfg = AgentConfig::default();
        let mut body = AgentBody::spawn(&cfg, Vec2::ZERO, &mut rng(), &[]);
        assert!(body.edible_resource(&cfg, &pool).is_none());

        body.apply_action(Action::Eat, &cfg, 0.02);
        assert!(body.eat_intent());
        assert!(body.edible_resource(&cfg, &pool).is_some());

        body.apply_action(Action::Idle, &cfg, 0.02);
        assert!(body.edible_resource(&cfg, &pool).is_none());

        let auto = AgentConfig {
            auto_eat: true,
            ..AgentConfig::default()
        };
        assert!(body.edible_resource(&auto, &pool).is_some());
    }
}
