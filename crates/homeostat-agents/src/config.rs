//! Tunable parameters for the homeostatic agent.
//!
//! [`AgentConfig`] is read from the `agent` section of the simulation YAML
//! and bundles every constant the homeostasis engine, the body, and the
//! sensors need. It is immutable for the duration of an episode.

use homeostat_types::{EssentialVariable, Vec2};
use homeostat_world::PositionRange;
use serde::Deserialize;

use crate::error::AgentError;

/// Closed validity range of one essential variable.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EvRange {
    /// Lowest value that keeps the episode alive.
    pub min: f64,
    /// Highest value that keeps the episode alive; also the reward scale.
    pub max: f64,
}

impl EvRange {
    /// Create a range.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Whether `value` lies inside the range (bounds inclusive).
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// `value` forced into the range.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

impl Default for EvRange {
    fn default() -> Self {
        Self::new(-15.0, 15.0)
    }
}

/// Per-channel weights of the essential-variable update law.
///
/// `c0` scales the constant drift, `c1..=c3` the coupling to the previous
/// food, water, and thermal levels, `c4` the interaction term, and `c5` the
/// standing value of the discrete consumption term. Unset weights are 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
pub struct Coefficients {
    /// Constant drift (scaled by the range maximum, or the surround
    /// temperature for the thermal channel).
    #[serde(default)]
    pub c0: f64,
    /// Coupling to the previous food level.
    #[serde(default)]
    pub c1: f64,
    /// Coupling to the previous water level.
    #[serde(default)]
    pub c2: f64,
    /// Coupling to the previous thermal level.
    #[serde(default)]
    pub c3: f64,
    /// Weight of the interaction term.
    #[serde(default)]
    pub c4: f64,
    /// Standing discrete term (normally 0).
    #[serde(default)]
    pub c5: f64,
}

/// Configuration for the homeostatic agent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AgentConfig {
    /// End the episode as soon as any resource is consumed.
    #[serde(default)]
    pub single_trial: bool,

    /// Spawn at a random position and heading instead of the fixed pose.
    #[serde(default)]
    pub random_spawn: bool,

    /// Fixed spawn position, relative to the arena origin.
    #[serde(default)]
    pub init_position: Vec2,

    /// Fixed spawn heading in degrees.
    #[serde(default)]
    pub init_heading: f64,

    /// Spawn range used when `random_spawn` is set, relative to the origin.
    #[serde(default = "default_spawn_range")]
    pub random_position_range: PositionRange,

    /// Body radius used for collision and placement.
    #[serde(default = "default_body_radius")]
    pub body_radius: f64,

    /// Forward speed in units per second.
    #[serde(default = "default_move_speed")]
    pub move_speed: f64,

    /// Turn rate in degrees per second.
    #[serde(default = "default_turn_speed")]
    pub turn_speed: f64,

    /// Consume any reachable resource without an explicit Eat action.
    #[serde(default)]
    pub auto_eat: bool,

    /// Reach of the mouth: resources closer than this can be eaten.
    #[serde(default = "default_eating_distance")]
    pub eating_distance: f64,

    /// Number of recent rewards in the reporting moving average.
    #[serde(default = "default_reward_window_size")]
    pub reward_window_size: usize,

    /// Episode length cap in ticks (0 = unlimited).
    #[serde(default)]
    pub max_steps: u64,

    /// Valid food range.
    #[serde(default)]
    pub food_range: EvRange,

    /// Valid water range.
    #[serde(default)]
    pub water_range: EvRange,

    /// Valid thermal range.
    #[serde(default)]
    pub thermal_range: EvRange,

    /// Valid health range.
    #[serde(default)]
    pub health_range: EvRange,

    /// Food level at episode start.
    #[serde(default)]
    pub start_food: f64,

    /// Water level at episode start.
    #[serde(default)]
    pub start_water: f64,

    /// Thermal level at episode start.
    #[serde(default)]
    pub start_thermal: f64,

    /// Health level at episode start.
    #[serde(default)]
    pub start_health: f64,

    /// Magnitude of the discrete term when food is eaten.
    #[serde(default = "default_resource_value")]
    pub resource_food_value: f64,

    /// Magnitude of the discrete term when water is drunk.
    #[serde(default = "default_resource_value")]
    pub resource_water_value: f64,

    /// Update weights for the food channel.
    #[serde(default)]
    pub food_coefficients: Coefficients,

    /// Update weights for the water channel.
    #[serde(default)]
    pub water_coefficients: Coefficients,

    /// Update weights for the thermal channel (`c5` unused).
    #[serde(default)]
    pub thermal_coefficients: Coefficients,

    /// Update weights for the health channel.
    #[serde(default)]
    pub health_coefficients: Coefficients,

    /// Include the touch flag in observations.
    #[serde(default)]
    pub use_touch_obs: bool,

    /// Include the olfactory vector in observations.
    #[serde(default = "default_true")]
    pub use_olfactory_obs: bool,

    /// Include thermal samples in observations and integrate body heat.
    #[serde(default = "default_true")]
    pub use_thermal_obs: bool,

    /// Include directional collision groups in observations.
    #[serde(default)]
    pub use_collision_obs: bool,

    /// Report thermal samples relative to the body temperature.
    #[serde(default)]
    pub relative_thermal_obs: bool,

    /// Radius of the olfactory sensing sphere.
    #[serde(default = "default_olfactory_sensor_length")]
    pub olfactory_sensor_length: f64,

    /// Distance of the eight thermal probes from the body center.
    #[serde(default = "default_thermal_sensor_distance")]
    pub thermal_sensor_distance: f64,

    /// Length of the collision-detection rays.
    #[serde(default = "default_collision_ray_distance")]
    pub collision_ray_distance: f64,

    /// Multiplier of the impulse-to-damage curve.
    #[serde(default = "default_damage_constant")]
    pub damage_constant: f64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            single_trial: false,
            random_spawn: false,
            init_position: Vec2::ZERO,
            init_heading: 0.0,
            random_position_range: default_spawn_range(),
            body_radius: default_body_radius(),
            move_speed: default_move_speed(),
            turn_speed: default_turn_speed(),
            auto_eat: false,
            eating_distance: default_eating_distance(),
            reward_window_size: default_reward_window_size(),
            max_steps: 0,
            food_range: EvRange::default(),
            water_range: EvRange::default(),
            thermal_range: EvRange::default(),
            health_range: EvRange::default(),
            start_food: 0.0,
            start_water: 0.0,
            start_thermal: 0.0,
            start_health: 0.0,
            resource_food_value: default_resource_value(),
            resource_water_value: default_resource_value(),
            food_coefficients: Coefficients::default(),
            water_coefficients: Coefficients::default(),
            thermal_coefficients: Coefficients::default(),
            health_coefficients: Coefficients::default(),
            use_touch_obs: false,
            use_olfactory_obs: true,
            use_thermal_obs: true,
            use_collision_obs: false,
            relative_thermal_obs: false,
            olfactory_sensor_length: default_olfactory_sensor_length(),
            thermal_sensor_distance: default_thermal_sensor_distance(),
            collision_ray_distance: default_collision_ray_distance(),
            damage_constant: default_damage_constant(),
        }
    }
}

impl AgentConfig {
    /// Range of one essential variable.
    pub const fn range(&self, channel: EssentialVariable) -> EvRange {
        match channel {
            EssentialVariable::Food => self.food_range,
            EssentialVariable::Water => self.water_range,
            EssentialVariable::Thermal => self.thermal_range,
            EssentialVariable::Health => self.health_range,
        }
    }

    /// Update weights of one essential variable.
    pub const fn coefficients(&self, channel: EssentialVariable) -> Coefficients {
        match channel {
            EssentialVariable::Food => self.food_coefficients,
            EssentialVariable::Water => self.water_coefficients,
            EssentialVariable::Thermal => self.thermal_coefficients,
            EssentialVariable::Health => self.health_coefficients,
        }
    }

    /// Start level of one essential variable.
    pub const fn start_level(&self, channel: EssentialVariable) -> f64 {
        match channel {
            EssentialVariable::Food => self.start_food,
            EssentialVariable::Water => self.start_water,
            EssentialVariable::Thermal => self.start_thermal,
            EssentialVariable::Health => self.start_health,
        }
    }

    /// Check every value the agent depends on.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] naming the first offending
    /// field: an empty or inverted range, a zero range maximum (it divides
    /// the reward), a negative speed or distance, or an empty reward window.
    pub fn validate(&self) -> Result<(), AgentError> {
        for channel in EssentialVariable::ALL {
            let range = self.range(channel);
            let field = range_field(channel);
            if !range.min.is_finite() || !range.max.is_finite() || range.min >= range.max {
                return Err(AgentError::invalid(field, "min must be below max"));
            }
            if range.max.abs() < f64::EPSILON {
                return Err(AgentError::invalid(field, "max must be non-zero"));
            }
        }

        let non_negative = [
            ("agent.body_radius", self.body_radius),
            ("agent.move_speed", self.move_speed),
            ("agent.turn_speed", self.turn_speed),
            ("agent.eating_distance", self.eating_distance),
            ("agent.olfactory_sensor_length", self.olfactory_sensor_length),
            ("agent.thermal_sensor_distance", self.thermal_sensor_distance),
            ("agent.collision_ray_distance", self.collision_ray_distance),
            ("agent.damage_constant", self.damage_constant),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(AgentError::invalid(field, "must be finite and non-negative"));
            }
        }

        if self.reward_window_size == 0 {
            return Err(AgentError::invalid(
                "agent.reward_window_size",
                "must be at least 1",
            ));
        }
        if self.random_spawn && !self.random_position_range.is_ordered() {
            return Err(AgentError::invalid(
                "agent.random_position_range",
                "min must not exceed max",
            ));
        }
        Ok(())
    }
}

const fn range_field(channel: EssentialVariable) -> &'static str {
    match channel {
        EssentialVariable::Food => "agent.food_range",
        EssentialVariable::Water => "agent.water_range",
        EssentialVariable::Thermal => "agent.thermal_range",
        EssentialVariable::Health => "agent.health_range",
    }
}

const fn default_spawn_range() -> PositionRange {
    PositionRange {
        min: Vec2::new(-15.0, -15.0),
        max: Vec2::new(15.0, 15.0),
    }
}

const fn default_body_radius() -> f64 {
    0.5
}

const fn default_move_speed() -> f64 {
    10.0
}

const fn default_turn_speed() -> f64 {
    150.0
}

const fn default_eating_distance() -> f64 {
    1.5
}

const fn default_reward_window_size() -> usize {
    100
}

const fn default_resource_value() -> f64 {
    5.0
}

const fn default_true() -> bool {
    true
}

const fn default_olfactory_sensor_length() -> f64 {
    10.0
}

const fn default_thermal_sensor_distance() -> f64 {
    1.0
}

const fn default_collision_ray_distance() -> f64 {
    1.0
}

const fn default_damage_constant() -> f64 {
    1.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AgentConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.reward_window_size, 100);
        assert!(cfg.use_thermal_obs);
        assert!(!cfg.use_collision_obs);
    }

    #[test]
    fn inverted_range_names_the_field() {
        let cfg = AgentConfig {
            food_range: EvRange::new(10.0, -10.0),
            ..AgentConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("agent.food_range"));
    }

    #[test]
    fn zero_range_max_is_rejected() {
        let cfg = AgentConfig {
            health_range: EvRange::new(-10.0, 0.0),
            ..AgentConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_reward_window_is_rejected() {
        let cfg = AgentConfig {
            reward_window_size: 0,
            ..AgentConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn yaml_fills_defaults() {
        let yaml = "
food_range: { min: -10, max: 10 }
food_coefficients: { c0: -0.01, c5: 0.0 }
auto_eat: true
";
        let cfg: AgentConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(cfg.food_range, EvRange::new(-10.0, 10.0));
        assert!((cfg.food_coefficients.c0 - (-0.01)).abs() < f64::EPSILON);
        assert!(cfg.auto_eat);
        assert_eq!(cfg.water_range, EvRange::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn range_contains_bounds() {
        let r = EvRange::new(-1.0, 1.0);
        assert!(r.contains(-1.0));
        assert!(r.contains(1.0));
        assert!(!r.contains(1.0001));
        assert!((r.clamp(4.0) - 1.0).abs() < f64::EPSILON);
    }
}
