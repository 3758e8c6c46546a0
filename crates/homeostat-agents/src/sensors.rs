//! Exteroceptive sensors: thermal probes, olfaction, collision, and touch.
//!
//! Sensors only read the world. Collision damage is computed here but
//! applied to health by the tick.

use homeostat_types::{Pose, Vec2};
use homeostat_world::{ResourcePool, SCENT_FEATURES, ThermalField};

use crate::services::Physics;

/// Number of thermal probes around the body.
pub const THERMAL_SENSORS: usize = 8;

/// Number of directional collision groups.
pub const COLLISION_GROUPS: usize = 10;

/// Number of collision rays fanned around the body.
pub const COLLISION_RAYS: usize = 100;

/// Upper bound of the damage a single contact can deal.
pub const MAX_COLLISION_DAMAGE: f64 = 30.0;

/// Damage above which a contact counts as a collision.
pub const COLLISION_COUNT_THRESHOLD: f64 = 0.5;

/// Closest distance used in the olfactory falloff.
const MIN_SCENT_DISTANCE: f64 = 1e-3;

/// Probe offsets as (right, forward) unit directions: forward, backward,
/// left, right, forward-left, forward-right, backward-left, backward-right.
const PROBE_DIRECTIONS: [(f64, f64); THERMAL_SENSORS] = [
    (0.0, 1.0),
    (0.0, -1.0),
    (-1.0, 0.0),
    (1.0, 0.0),
    (-std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2),
    (std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2),
    (-std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2),
    (std::f64::consts::FRAC_1_SQRT_2, -std::f64::consts::FRAC_1_SQRT_2),
];

/// Latest readings of every sensor.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReadings {
    /// Scent vector.
    pub olfactory: [f64; SCENT_FEATURES],
    /// Thermal probe samples (absolute or relative).
    pub thermal: [f64; THERMAL_SENSORS],
    /// Directional collision groups.
    pub collision: [f64; COLLISION_GROUPS],
    /// 1 when a resource is within reach.
    pub touch: f64,
}

impl Default for SensorReadings {
    fn default() -> Self {
        Self {
            olfactory: [0.0; SCENT_FEATURES],
            thermal: [0.0; THERMAL_SENSORS],
            collision: [0.0; COLLISION_GROUPS],
            touch: 0.0,
        }
    }
}

/// Read the eight thermal probes at `distance` from the body center.
///
/// Probes off the grid read the field default. In relative mode each
/// sample is reported as its deviation from `body_temperature`.
pub fn sample_thermal(
    pose: &Pose,
    field: &ThermalField,
    distance: f64,
    body_temperature: f64,
    relative: bool,
) -> [f64; THERMAL_SENSORS] {
    PROBE_DIRECTIONS.map(|(right, forward)| {
        let probe = pose.local_to_world(right * distance, forward * distance);
        let t = field.temperature_at(probe);
        if relative { t - body_temperature } else { t }
    })
}

/// Scent vector at `position`.
///
/// Every active resource within `sensor_length` adds its profile divided by
/// its distance.
pub fn sample_olfactory(
    position: Vec2,
    pool: &ResourcePool,
    sensor_length: f64,
) -> [f64; SCENT_FEATURES] {
    let mut scent = [0.0; SCENT_FEATURES];
    for resource in pool.active() {
        let distance = resource.position.distance(position);
        if distance > sensor_length {
            continue;
        }
        let falloff = 1.0 / distance.max(MIN_SCENT_DISTANCE);
        for (acc, p) in scent.iter_mut().zip(pool.scent_of(resource)) {
            *acc += p * falloff;
        }
    }
    scent
}

/// Damage dealt by a contact of the given impulse magnitude.
///
/// `min(exp(0.07 * (impulse - 60)) * damage_constant, 30)`.
pub fn collision_damage(impulse: f64, damage_constant: f64) -> f64 {
    ((0.07 * (impulse - 60.0)).exp() * damage_constant).min(MAX_COLLISION_DAMAGE)
}

/// Directional collision groups.
///
/// [`COLLISION_RAYS`] rays are fanned clockwise from the heading; each run
/// of consecutive rays forms one group. A group reads `1 + impulse` when any
/// of its rays hits a collider within `ray_distance`, else 0.
#[allow(clippy::cast_precision_loss)]
pub fn sample_collision(
    pose: &Pose,
    physics: &dyn Physics,
    ray_distance: f64,
    impulse: f64,
) -> [f64; COLLISION_GROUPS] {
    let mut groups = [0.0; COLLISION_GROUPS];
    let rays_per_group = COLLISION_RAYS / COLLISION_GROUPS;
    let step = 360.0 / COLLISION_RAYS as f64;
    for (index, group) in groups.iter_mut().enumerate() {
        let first = index.saturating_mul(rays_per_group);
        let hit = (first..first.saturating_add(rays_per_group)).any(|ray| {
            // Ray indices are below 100.
            let direction = Vec2::from_heading(pose.heading + step * ray as f64);
            physics.raycast(pose.position, direction, ray_distance)
        });
        if hit {
            *group = 1.0 + impulse;
        }
    }
    groups
}

/// Touch flag: 1 when an active resource is within `reach`, else 0.
pub fn sample_touch(position: Vec2, pool: &ResourcePool, reach: f64) -> f64 {
    if pool.nearest_active_within(position, reach).is_some() {
        1.0
    } else {
        0.0
    }
}
