//! Configuration loading and typed config structures for the Homeostat
//! simulation.
//!
//! The canonical configuration lives in `homeostat-config.yaml` at the
//! project root. Subsystem sections reuse the config types of the crates
//! that own them (`homeostat-world` for the arena, thermal field, resources
//! and landmarks, `homeostat-agents` for the agent and predators); the
//! sections that belong to the orchestrator are defined here.
//!
//! The bundle is read once and treated as immutable input.

use std::path::Path;

use homeostat_agents::{AgentConfig, AgentError, PredatorsConfig};
use homeostat_types::{Action, Vec2};
use homeostat_world::{
    Arena, ArenaConfig, LandmarkConfig, ResourceConfig, ResourcePool, ThermalConfig, ThermalField,
    WorldError,
};
use serde::Deserialize;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its valid domain.
    #[error("invalid configuration: {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: String,
        /// Explanation of what is wrong with the value.
        reason: String,
    },

    /// A world section failed validation.
    #[error("invalid world configuration: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The agent or predator section failed validation.
    #[error("invalid agent configuration: {source}")]
    Agent {
        /// The underlying agent error.
        #[from]
        source: AgentError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `homeostat-config.yaml`. Every section has
/// defaults, so an empty document describes a bare 40 x 40 arena with a
/// uniform thermal field and no resources or predators.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Seed, step length, and run shape.
    #[serde(default)]
    pub simulation: SimulationSection,

    /// Floor and obstacles.
    #[serde(default)]
    pub arena: ArenaConfig,

    /// Thermal grid generation.
    #[serde(default)]
    pub thermal: ThermalConfig,

    /// Sun rotation and diurnal temperature bias.
    #[serde(default)]
    pub day_night: DayNightConfig,

    /// Agent body, homeostasis, and sensors.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Resource groups and placement policies.
    #[serde(default)]
    pub resources: ResourceConfig,

    /// Landmark lattice.
    #[serde(default)]
    pub landmarks: LandmarkConfig,

    /// Predator groups.
    #[serde(default)]
    pub predators: PredatorsConfig,

    /// Trigger zones and their handlers.
    #[serde(default)]
    pub events: EventsConfig,

    /// Reference physics parameters.
    #[serde(default)]
    pub physics: PhysicsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Check every section, naming the first invalid field.
    ///
    /// Subsystems that validate in their constructors are built once and
    /// discarded.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulation.validate()?;
        self.day_night.validate()?;
        self.physics.validate()?;
        self.events.validate()?;
        self.agent.validate()?;
        self.predators.validate()?;

        let arena = Arena::new(&self.arena)?;
        ThermalField::new(&self.thermal, &arena)?;
        ResourcePool::new(&self.resources, &arena)?;

        if self.landmarks.landmark_radius < 0.0 {
            return Err(ConfigError::invalid(
                "landmarks.landmark_radius",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Seed, step length, and run shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimulationSection {
    /// Master random seed.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Fixed step length in seconds.
    #[serde(default = "default_fixed_delta_time")]
    pub fixed_delta_time: f64,

    /// Episodes run per instance by the engine.
    #[serde(default = "default_episodes")]
    pub episodes: u32,

    /// Independent environment instances run by the engine.
    #[serde(default = "default_instances")]
    pub instances: u32,

    /// Policy driving the agent when the engine runs headless.
    #[serde(default)]
    pub policy: PolicyConfig,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            fixed_delta_time: default_fixed_delta_time(),
            episodes: default_episodes(),
            instances: default_instances(),
            policy: PolicyConfig::default(),
        }
    }
}

impl SimulationSection {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.fixed_delta_time.is_finite() || self.fixed_delta_time <= 0.0 {
            return Err(ConfigError::invalid(
                "simulation.fixed_delta_time",
                "must be finite and positive",
            ));
        }
        if self.episodes == 0 {
            return Err(ConfigError::invalid("simulation.episodes", "must be at least 1"));
        }
        if self.instances == 0 {
            return Err(ConfigError::invalid("simulation.instances", "must be at least 1"));
        }
        if self.policy.kind == PolicyKind::Scripted && self.policy.script.is_empty() {
            return Err(ConfigError::invalid(
                "simulation.policy.script",
                "a scripted policy needs at least one action",
            ));
        }
        Ok(())
    }
}

/// Which built-in policy drives the agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// Always idle.
    Idle,
    /// Uniform random actions from a seeded stream.
    #[default]
    Random,
    /// A fixed action sequence, repeated.
    Scripted,
}

/// Built-in policy selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PolicyConfig {
    /// Policy kind.
    #[serde(default)]
    pub kind: PolicyKind,

    /// Actions replayed by the scripted policy.
    #[serde(default)]
    pub script: Vec<Action>,
}

/// Sun rotation and diurnal temperature bias.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DayNightConfig {
    /// When false the sun stays put; the hour-bucket bias still applies.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Start each episode at a uniform random sun angle instead of noon.
    #[serde(default)]
    pub random_sun_angle: bool,

    /// Fine steps per full rotation are `360 * multiplier`.
    #[serde(default = "default_one")]
    pub rotation_interval_multiplier: u32,

    /// Fine steps advanced per tick.
    #[serde(default = "default_one")]
    pub rotation_speed_steps: u32,

    /// Coarse hour buckets per rotation.
    #[serde(default = "default_temperature_update_steps")]
    pub temperature_update_steps: u32,

    /// Temperature bias at the warmest hour (12h).
    #[serde(default = "default_day_temperature_change")]
    pub day_temperature_change: f64,

    /// Temperature bias at the coldest hour (4h).
    #[serde(default = "default_night_temperature_change")]
    pub night_temperature_change: f64,
}

impl Default for DayNightConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            random_sun_angle: false,
            rotation_interval_multiplier: 1,
            rotation_speed_steps: 1,
            temperature_update_steps: default_temperature_update_steps(),
            day_temperature_change: default_day_temperature_change(),
            night_temperature_change: default_night_temperature_change(),
        }
    }
}

impl DayNightConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.rotation_interval_multiplier == 0 {
            return Err(ConfigError::invalid(
                "day_night.rotation_interval_multiplier",
                "must be at least 1",
            ));
        }
        if self.rotation_speed_steps == 0 {
            return Err(ConfigError::invalid(
                "day_night.rotation_speed_steps",
                "must be at least 1",
            ));
        }
        if self.temperature_update_steps == 0 {
            return Err(ConfigError::invalid(
                "day_night.temperature_update_steps",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Trigger zones.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EventsConfig {
    /// Configured event groups.
    #[serde(default)]
    pub groups: Vec<EventGroupConfig>,
}

impl EventsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for group in &self.groups {
            if group.trigger_tag.is_empty() {
                return Err(ConfigError::invalid(
                    "events.groups.trigger_tag",
                    format!("group '{}': must not be empty", group.name),
                ));
            }
            if !group.radius.is_finite() || group.radius <= 0.0 {
                return Err(ConfigError::invalid(
                    "events.groups.radius",
                    format!("group '{}': must be finite and positive", group.name),
                ));
            }
        }
        Ok(())
    }
}

/// One trigger zone and the handler it fires.
///
/// A group with a message fires the message handler; any other group fires
/// the resource handler, which sets food and water to the configured values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventGroupConfig {
    /// Zone name used in logs.
    #[serde(default)]
    pub name: String,

    /// Tag the zone fires.
    pub trigger_tag: String,

    /// Entity kind that sets the zone off: `agent` or `predator`.
    #[serde(default = "default_target_tag")]
    pub target_tag: String,

    /// Fire cap per episode; negative means unlimited.
    #[serde(default = "default_max_count")]
    pub max_count: i32,

    /// Zone center, relative to the arena origin.
    #[serde(default)]
    pub position: Vec2,

    /// Zone radius.
    #[serde(default = "default_event_radius")]
    pub radius: f64,

    /// Food level set by the resource handler.
    #[serde(default)]
    pub food_value: f64,

    /// Water level set by the resource handler.
    #[serde(default)]
    pub water_value: f64,

    /// Message recorded by the message handler.
    #[serde(default)]
    pub message: Option<String>,
}

/// Reference physics parameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PhysicsConfig {
    /// Contact impulse per unit of blocked speed.
    #[serde(default = "default_impulse_scale")]
    pub impulse_scale: f64,

    /// Distance at which a navigating predator counts as arrived.
    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            impulse_scale: default_impulse_scale(),
            arrival_tolerance: default_arrival_tolerance(),
        }
    }
}

impl PhysicsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.impulse_scale.is_finite() || self.impulse_scale < 0.0 {
            return Err(ConfigError::invalid(
                "physics.impulse_scale",
                "must be finite and non-negative",
            ));
        }
        if !self.arrival_tolerance.is_finite() || self.arrival_tolerance <= 0.0 {
            return Err(ConfigError::invalid(
                "physics.arrival_tolerance",
                "must be finite and positive",
            ));
        }
        Ok(())
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_fixed_delta_time() -> f64 {
    0.02
}

const fn default_episodes() -> u32 {
    1
}

const fn default_instances() -> u32 {
    1
}

const fn default_true() -> bool {
    true
}

const fn default_one() -> u32 {
    1
}

const fn default_temperature_update_steps() -> u32 {
    24
}

const fn default_day_temperature_change() -> f64 {
    5.0
}

const fn default_night_temperature_change() -> f64 {
    -5.0
}

fn default_target_tag() -> String {
    "agent".to_owned()
}

const fn default_max_count() -> i32 {
    -1
}

const fn default_event_radius() -> f64 {
    1.0
}

const fn default_impulse_scale() -> f64 {
    6.0
}

const fn default_arrival_tolerance() -> f64 {
    0.25
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use homeostat_types::{PlacementPolicy, ResourceKind};

    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config.simulation.seed, 42);
        assert!((config.simulation.fixed_delta_time - 0.02).abs() < f64::EPSILON);
        assert_eq!(config.day_night.temperature_update_steps, 24);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_full_document() {
        let yaml = r"
simulation:
  seed: 7
  fixed_delta_time: 0.05
  episodes: 3
  instances: 2
  policy:
    kind: scripted
    script: [move_forward, turn_left, eat]
arena:
  floor_size: { x: 20.0, z: 20.0 }
  obstacles:
    - name: rock
      center: { x: 3.0, z: 3.0 }
      size: { x: 2.0, z: 2.0 }
      temperature: 30.0
agent:
  max_steps: 500
  food_range: { min: -10.0, max: 10.0 }
  food_coefficients: { c0: -0.01, c5: 0.0 }
resources:
  groups:
    - name: apples
      kind: food
      policy: random
      count: 2
      position: { min: { x: -5.0, z: -5.0 }, max: { x: 5.0, z: 5.0 } }
predators:
  groups:
    - name: wolf
      count: 1
      position: { min: { x: -8.0, z: 8.0 }, max: { x: 8.0, z: 9.0 } }
      behaviour:
        walk_speed: 4.0
events:
  groups:
    - name: oasis
      trigger_tag: resource
      position: { x: 0.0, z: -8.0 }
      food_value: 2.0
      water_value: 3.0
logging:
  format: json
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.policy.kind, PolicyKind::Scripted);
        assert_eq!(
            config.simulation.policy.script,
            vec![Action::MoveForward, Action::TurnLeft, Action::Eat]
        );
        assert_eq!(config.arena.obstacles.len(), 1);
        assert_eq!(config.agent.max_steps, 500);
        assert_eq!(config.resources.groups.len(), 1);
        let group = config.resources.groups.first().unwrap();
        assert_eq!(group.kind, ResourceKind::Food);
        assert_eq!(group.policy, PlacementPolicy::Random);
        let wolf = config.predators.groups.first().unwrap();
        assert!((wolf.behaviour.walk_speed - 4.0).abs() < f64::EPSILON);
        assert_eq!(wolf.behaviour.max_resting_steps, 50);
        let oasis = config.events.groups.first().unwrap();
        assert_eq!(oasis.target_tag, "agent");
        assert_eq!(oasis.max_count, -1);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn invalid_range_names_the_field() {
        let yaml = "agent:\n  food_range: { min: 5.0, max: 1.0 }\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("agent.food_range"), "{err}");
    }

    #[test]
    fn zero_step_is_rejected() {
        let yaml = "simulation:\n  fixed_delta_time: 0.0\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { ref field, .. } if field == "simulation.fixed_delta_time"
        ));
    }

    #[test]
    fn empty_script_is_rejected() {
        let yaml = "simulation:\n  policy: { kind: scripted }\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = SimulationConfig::parse("simulation: [unclosed");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SimulationConfig::from_file(Path::new("/nonexistent/homeostat.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn shipped_config_is_valid() {
        let yaml = include_str!("../../../homeostat-config.yaml");
        let config = SimulationConfig::parse(yaml).unwrap();
        config.validate().unwrap();
        assert_eq!(config.simulation.instances, 2);
        assert_eq!(config.resources.groups.len(), 4);
        assert_eq!(config.events.groups.len(), 2);
    }
}
