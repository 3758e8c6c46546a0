//! Contracts for the collaborators the simulation core depends on.
//!
//! Path-finding and collision detection are not part of the core. The core
//! only asks a [`Navigation`] service to move an entity toward a point and
//! polls for the outcome, and it asks a [`Physics`] service to resolve the
//! agent's motion and to answer visibility questions. Both are injected at
//! construction time; reference implementations live in `homeostat-core`.

use homeostat_types::{Aabb, Pose, PredatorId, Vec2};
use homeostat_world::SimRng;

/// Answer to a move request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRequest {
    /// The navigator will steer toward the target.
    Accepted,
    /// The target is unreachable or the entity is unknown.
    Rejected,
}

/// Progress of an entity toward its last accepted destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalStatus {
    /// No destination set.
    Idle,
    /// Still travelling.
    Pending,
    /// Destination reached.
    Arrived,
    /// The last request could not be routed.
    NoPath,
}

/// Navigation collaborator steering predators across the arena.
pub trait Navigation: Send {
    /// Rebuild the navigation graph around the given blocked footprints.
    fn rebuild(&mut self, blocked: &[Aabb]);

    /// Ask for `id` to travel from `from` toward `target`.
    fn request_move(&mut self, id: PredatorId, from: Vec2, target: Vec2) -> MoveRequest;

    /// Poll the outcome of the last request for `id`.
    fn query_arrival(&self, id: PredatorId) -> ArrivalStatus;

    /// Drop the current path of `id` and halt it.
    fn stop(&mut self, id: PredatorId);

    /// Allow `id` to move again.
    fn resume(&mut self, id: PredatorId);

    /// Forget a failed request so the next tick starts clean.
    fn clear(&mut self, id: PredatorId);

    /// Sample a reachable point within `radius` of `center`.
    fn sample_reachable(&self, center: Vec2, radius: f64, rng: &mut SimRng) -> Option<Vec2>;

    /// Move `pose` one tick along the current path of `id`.
    fn advance(&mut self, id: PredatorId, pose: &mut Pose, speed: f64, turn_speed: f64, dt: f64);
}

/// A contact produced while resolving motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Impulse magnitude of the contact.
    pub impulse: f64,
    /// Unit normal pointing from the obstacle toward the mover.
    pub normal: Vec2,
}

/// Result of resolving one motion step.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionOutcome {
    /// Where the mover ended up.
    pub position: Vec2,
    /// Contacts encountered on the way.
    pub contacts: Vec<Contact>,
}

impl MotionOutcome {
    /// Largest contact impulse, or 0 with no contacts.
    pub fn peak_impulse(&self) -> f64 {
        self.contacts.iter().map(|c| c.impulse).fold(0.0, f64::max)
    }
}

/// Physics and perception collaborator.
pub trait Physics: Send {
    /// Replace the static colliders.
    fn rebuild(&mut self, solid: &[Aabb]);

    /// Move a disc of `radius` from `from` toward `to` over `dt` seconds.
    fn resolve_motion(&self, from: Vec2, to: Vec2, radius: f64, dt: f64) -> MotionOutcome;

    /// Whether a ray from `origin` hits a collider within `max_distance`.
    fn raycast(&self, origin: Vec2, direction: Vec2, max_distance: f64) -> bool;

    /// Whether the segment between two points is free of colliders.
    fn line_of_sight(&self, from: Vec2, to: Vec2) -> bool;

    /// Whether two discs touch.
    fn in_contact(&self, a: Vec2, a_radius: f64, b: Vec2, b_radius: f64) -> bool {
        a.distance(b) <= a_radius + b_radius
    }

    /// The target's position if an observer at `observer` can see it.
    ///
    /// Visible means within `view_distance`, strictly inside half of
    /// `view_angle` (degrees) off the observer's heading, and with a clear
    /// line of sight.
    fn query_visible(
        &self,
        observer: &Pose,
        target: Vec2,
        view_distance: f64,
        view_angle: f64,
    ) -> Option<Vec2> {
        let offset = target.minus(observer.position);
        if offset.length() > view_distance {
            return None;
        }
        if observer.forward().angle_to(offset) >= view_angle * 0.5 {
            return None;
        }
        self.line_of_sight(observer.position, target).then_some(target)
    }
}
