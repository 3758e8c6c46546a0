//! Observation vector handed to the learner after every reset and step.
//!
//! Layout, in order:
//!
//! | Block | Width | Present when |
//! |-------|-------|--------------|
//! | essential variables (food, water, thermal, health) | 4 | always |
//! | olfactory | 10 | `use_olfactory_obs` |
//! | thermal probes | 8 | `use_thermal_obs` |
//! | collision groups | 10 | `use_collision_obs` |
//! | touch | 1 | `use_touch_obs` |
//! | position (x, 0, z) | 3 | always |
//! | rotation (0, heading, 0) | 3 | always |
//! | food, water, collision counters | 3 | always |

use homeostat_agents::{
    AgentConfig, COLLISION_GROUPS, EssentialVariables, SensorReadings, THERMAL_SENSORS,
};
use homeostat_types::Pose;
use homeostat_world::SCENT_FEATURES;
use serde::Serialize;

/// Width of the blocks present in every configuration.
const FIXED_WIDTH: usize = 4 + 3 + 3 + 3;

/// Per-tick event counters reported at the end of the observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StepCounts {
    /// 1 on the tick a food resource takes effect.
    pub food: u32,
    /// 1 on the tick a water or pond resource takes effect.
    pub water: u32,
    /// 1 on a tick with a damaging collision.
    pub collision: u32,
}

/// Flat observation vector.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Observation {
    values: Vec<f64>,
}

impl Observation {
    /// Assemble the vector from the agent's current state.
    pub fn assemble(
        config: &AgentConfig,
        levels: &EssentialVariables,
        readings: &SensorReadings,
        pose: &Pose,
        counts: StepCounts,
    ) -> Self {
        let mut values = Vec::with_capacity(observation_len(config));
        values.extend_from_slice(&levels.to_array());
        if config.use_olfactory_obs {
            values.extend_from_slice(&readings.olfactory);
        }
        if config.use_thermal_obs {
            values.extend_from_slice(&readings.thermal);
        }
        if config.use_collision_obs {
            values.extend_from_slice(&readings.collision);
        }
        if config.use_touch_obs {
            values.push(readings.touch);
        }
        values.extend_from_slice(&[pose.position.x, 0.0, pose.position.z]);
        values.extend_from_slice(&[0.0, pose.heading, 0.0]);
        values.extend_from_slice(&[
            f64::from(counts.food),
            f64::from(counts.water),
            f64::from(counts.collision),
        ]);
        Self { values }
    }

    /// The raw values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the vector is empty (only before the first reset).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Consume into the raw values.
    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Observation length for a configuration.
pub const fn observation_len(config: &AgentConfig) -> usize {
    let mut len = FIXED_WIDTH;
    if config.use_olfactory_obs {
        len = len.saturating_add(SCENT_FEATURES);
    }
    if config.use_thermal_obs {
        len = len.saturating_add(THERMAL_SENSORS);
    }
    if config.use_collision_obs {
        len = len.saturating_add(COLLISION_GROUPS);
    }
    if config.use_touch_obs {
        len = len.saturating_add(1);
    }
    len
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use homeostat_types::Vec2;

    use super::*;

    fn bare_config() -> AgentConfig {
        AgentConfig {
            use_olfactory_obs: false,
            use_thermal_obs: false,
            use_collision_obs: false,
            use_touch_obs: false,
            ..AgentConfig::default()
        }
    }

    #[test]
    fn bare_layout() {
        let config = bare_config();
        let levels = EssentialVariables {
            food: 1.0,
            water: 2.0,
            thermal: 3.0,
            health: 4.0,
        };
        let pose = Pose::new(Vec2::new(5.0, 6.0), 90.0);
        let counts = StepCounts {
            food: 1,
            water: 0,
            collision: 1,
        };
        let readings = SensorReadings::default();
        let obs = Observation::assemble(&config, &levels, &readings, &pose, counts);
        assert_eq!(obs.len(), observation_len(&config));
        assert_eq!(
            obs.values(),
            &[1.0, 2.0, 3.0, 4.0, 5.0, 0.0, 6.0, 0.0, 90.0, 0.0, 1.0, 0.0, 1.0]
        );
    }

    #[test]
    fn optional_blocks_follow_flags() {
        let mut config = bare_config();
        config.use_olfactory_obs = true;
        config.use_touch_obs = true;
        let mut readings = SensorReadings::default();
        if let Some(first) = readings.olfactory.first_mut() {
            *first = 0.5;
        }
        readings.touch = 1.0;
        let obs = Observation::assemble(
            &config,
            &EssentialVariables::default(),
            &readings,
            &Pose::default(),
            StepCounts::default(),
        );
        assert_eq!(obs.len(), 24);
        assert!((obs.values().get(4).copied().unwrap() - 0.5).abs() < f64::EPSILON);
        let touch_index = 14;
        assert!((obs.values().get(touch_index).copied().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn full_layout_length() {
        let config = AgentConfig {
            use_olfactory_obs: true,
            use_thermal_obs: true,
            use_collision_obs: true,
            use_touch_obs: true,
            ..AgentConfig::default()
        };
        assert_eq!(observation_len(&config), 42);
    }

    #[test]
    fn serializes_as_flat_array() {
        let obs = Observation::assemble(
            &bare_config(),
            &EssentialVariables::default(),
            &SensorReadings::default(),
            &Pose::default(),
            StepCounts::default(),
        );
        let json = serde_json::to_string(&obs).unwrap();
        assert!(json.starts_with('['));
    }
}
