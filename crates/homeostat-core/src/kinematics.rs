//! Reference collaborators: straight-line navigation and box physics.
//!
//! These implement the [`Navigation`] and [`Physics`] contracts well enough
//! to run the simulation headless. A host with a real navigation mesh or
//! physics engine injects its own implementations instead.

use std::collections::HashMap;

use homeostat_agents::{ArrivalStatus, Contact, MotionOutcome, MoveRequest, Navigation, Physics};
use homeostat_types::geometry::wrap_degrees;
use homeostat_types::{Aabb, Pose, PredatorId, Vec2};
use homeostat_world::SimRng;
use rand::Rng;
use tracing::debug;

/// Attempts made when the sampled point lands inside an obstacle.
const REACHABLE_ATTEMPTS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Route {
    target: Option<Vec2>,
    status: ArrivalStatus,
    stopped: bool,
}

impl Default for Route {
    fn default() -> Self {
        Self {
            target: None,
            status: ArrivalStatus::Idle,
            stopped: false,
        }
    }
}

/// Straight-line navigator over the arena floor.
///
/// Targets off the floor or inside a blocked footprint have no path. A
/// route that runs into a blocked footprint halts with `NoPath`.
#[derive(Debug, Clone)]
pub struct KinematicNavigator {
    floor: Aabb,
    blocked: Vec<Aabb>,
    routes: HashMap<PredatorId, Route>,
    arrival_tolerance: f64,
}

impl KinematicNavigator {
    /// Create a navigator for `floor`.
    pub fn new(floor: Aabb, arrival_tolerance: f64) -> Self {
        Self {
            floor,
            blocked: Vec::new(),
            routes: HashMap::new(),
            arrival_tolerance,
        }
    }

    fn walkable(&self, point: Vec2) -> bool {
        self.floor.contains(point) && !self.blocked.iter().any(|b| b.contains(point))
    }

    /// Current destination of `id`, if any.
    pub fn destination(&self, id: PredatorId) -> Option<Vec2> {
        self.routes.get(&id).and_then(|r| r.target)
    }

    /// Whether `id` is halted.
    pub fn is_stopped(&self, id: PredatorId) -> bool {
        self.routes.get(&id).is_some_and(|r| r.stopped)
    }
}

impl Navigation for KinematicNavigator {
    fn rebuild(&mut self, blocked: &[Aabb]) {
        self.blocked = blocked.to_vec();
        self.routes.clear();
        debug!(blocked = blocked.len(), "Navigation rebuilt");
    }

    fn request_move(&mut self, id: PredatorId, _from: Vec2, target: Vec2) -> MoveRequest {
        let walkable = self.walkable(target);
        let route = self.routes.entry(id).or_default();
        if walkable {
            route.target = Some(target);
            route.status = ArrivalStatus::Pending;
            MoveRequest::Accepted
        } else {
            route.target = None;
            route.status = ArrivalStatus::NoPath;
            MoveRequest::Rejected
        }
    }

    fn query_arrival(&self, id: PredatorId) -> ArrivalStatus {
        self.routes.get(&id).map_or(ArrivalStatus::Idle, |r| r.status)
    }

    fn stop(&mut self, id: PredatorId) {
        self.routes.entry(id).or_default().stopped = true;
    }

    fn resume(&mut self, id: PredatorId) {
        self.routes.entry(id).or_default().stopped = false;
    }

    fn clear(&mut self, id: PredatorId) {
        if let Some(route) = self.routes.get_mut(&id) {
            route.target = None;
            route.status = ArrivalStatus::Idle;
        }
    }

    fn sample_reachable(&self, center: Vec2, radius: f64, rng: &mut SimRng) -> Option<Vec2> {
        let clamped = self.floor.clamp(center);
        if self.walkable(clamped) {
            return Some(clamped);
        }
        (0..REACHABLE_ATTEMPTS)
            .map(|_| {
                let r = radius * rng.random_range(0.0_f64..=1.0).sqrt();
                let angle = rng.random_range(0.0..360.0);
                self.floor.clamp(center.plus(Vec2::from_heading(angle).scale(r)))
            })
            .find(|p| self.walkable(*p))
    }

    fn advance(&mut self, id: PredatorId, pose: &mut Pose, speed: f64, turn_speed: f64, dt: f64) {
        let Some(route) = self.routes.get(&id).copied() else {
            return;
        };
        let Some(target) = route.target else {
            return;
        };
        if route.stopped {
            return;
        }

        let offset = target.minus(pose.position);
        let distance = offset.length();
        if distance > f64::EPSILON {
            let mut turn = wrap_degrees(offset.heading() - pose.heading);
            if turn > 180.0 {
                turn -= 360.0;
            }
            let max_turn = turn_speed * dt;
            pose.rotate(turn.clamp(-max_turn, max_turn));
        }

        let step = (speed * dt).min(distance);
        let next = if distance > f64::EPSILON {
            pose.position.plus(offset.scale(step / distance))
        } else {
            pose.position
        };

        let status = if self.walkable(next) {
            pose.position = next;
            if distance - step <= self.arrival_tolerance {
                ArrivalStatus::Arrived
            } else {
                ArrivalStatus::Pending
            }
        } else {
            ArrivalStatus::NoPath
        };
        if let Some(route) = self.routes.get_mut(&id) {
            route.status = status;
            if status != ArrivalStatus::Pending {
                route.target = None;
            }
        }
    }
}

/// Box-collider physics over the arena floor and its solid obstacles.
///
/// Bodies are treated as squares of side `2 * radius`. A blocked move
/// slides along the free axis when it can; the blocked share of the
/// displacement becomes a contact with
/// `impulse = blocked_speed * impulse_scale`.
#[derive(Debug, Clone)]
pub struct ArenaPhysics {
    floor: Aabb,
    solids: Vec<Aabb>,
    impulse_scale: f64,
}

impl ArenaPhysics {
    /// Create physics for `floor` with no obstacles yet.
    pub const fn new(floor: Aabb, impulse_scale: f64) -> Self {
        Self {
            floor,
            solids: Vec::new(),
            impulse_scale,
        }
    }

    /// Touching a solid is allowed; overlapping it is not.
    fn free(&self, point: Vec2, radius: f64) -> bool {
        self.floor.expanded(-radius).contains(point)
            && !self
                .solids
                .iter()
                .any(|s| strictly_inside(&s.expanded(radius), point))
    }
}

fn strictly_inside(area: &Aabb, point: Vec2) -> bool {
    point.x > area.min.x && point.x < area.max.x && point.z > area.min.z && point.z < area.max.z
}

impl Physics for ArenaPhysics {
    fn rebuild(&mut self, solid: &[Aabb]) {
        self.solids = solid.to_vec();
    }

    fn resolve_motion(&self, from: Vec2, to: Vec2, radius: f64, dt: f64) -> MotionOutcome {
        // A body that starts embedded may move anywhere to get out.
        if self.free(to, radius) || !self.free(from, radius) {
            return MotionOutcome {
                position: to,
                contacts: Vec::new(),
            };
        }

        let slide_x = Vec2::new(to.x, from.z);
        let slide_z = Vec2::new(from.x, to.z);
        let position = [slide_x, slide_z]
            .into_iter()
            .filter(|p| self.free(*p, radius))
            .max_by(|a, b| a.distance(from).total_cmp(&b.distance(from)))
            .unwrap_or(from);

        let blocked = to.minus(position);
        let blocked_speed = if dt > 0.0 {
            blocked.length() / dt
        } else {
            0.0
        };
        MotionOutcome {
            position,
            contacts: vec![Contact {
                impulse: blocked_speed * self.impulse_scale,
                normal: blocked.scale(-1.0).normalized(),
            }],
        }
    }

    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f64) -> bool {
        let end = origin.plus(direction.normalized().scale(max_distance));
        !self.floor.contains(end) || self.solids.iter().any(|s| s.intersects_segment(origin, end))
    }

    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool {
        !self.solids.iter().any(|s| s.intersects_segment(from, to))
    }
}
