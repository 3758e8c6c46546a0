//! Enumeration types for the Homeostat simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Agent actions
// ---------------------------------------------------------------------------

/// A discrete action the agent can take in one tick.
///
/// The wire encoding used by step-based RL clients is the index returned by
/// [`Action::index`] (0 = `Idle` through 4 = `Eat`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Do nothing this tick.
    #[default]
    Idle,
    /// Move forward along the current heading.
    MoveForward,
    /// Rotate counter-clockwise.
    TurnLeft,
    /// Rotate clockwise.
    TurnRight,
    /// Attempt to consume a resource within eating distance.
    Eat,
}

impl Action {
    /// All actions in encoding order.
    pub const ALL: [Self; 5] = [
        Self::Idle,
        Self::MoveForward,
        Self::TurnLeft,
        Self::TurnRight,
        Self::Eat,
    ];

    /// Decode an action from its wire index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Idle),
            1 => Some(Self::MoveForward),
            2 => Some(Self::TurnLeft),
            3 => Some(Self::TurnRight),
            4 => Some(Self::Eat),
            _ => None,
        }
    }

    /// Wire index of this action.
    pub const fn index(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::MoveForward => 1,
            Self::TurnLeft => 2,
            Self::TurnRight => 3,
            Self::Eat => 4,
        }
    }

    /// Label recorded by the metrics sink.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Idle => "None",
            Self::MoveForward => "Forward",
            Self::TurnLeft => "Left",
            Self::TurnRight => "Right",
            Self::Eat => "Eat",
        }
    }
}

// ---------------------------------------------------------------------------
// Essential variables
// ---------------------------------------------------------------------------

/// One of the agent's four homeostatic channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EssentialVariable {
    /// Nutrition level.
    Food,
    /// Hydration level.
    Water,
    /// Body temperature level.
    Thermal,
    /// Damage level.
    Health,
}

impl EssentialVariable {
    /// All channels in vector order.
    pub const ALL: [Self; 4] = [Self::Food, Self::Water, Self::Thermal, Self::Health];

    /// Position of this channel in the essential-variable vector.
    pub const fn index(self) -> usize {
        match self {
            Self::Food => 0,
            Self::Water => 1,
            Self::Thermal => 2,
            Self::Health => 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Day / night
// ---------------------------------------------------------------------------

/// Fine-grained phase of the day derived from the simulated hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPhase {
    /// 07:00 through 17:00.
    Day,
    /// 18:00 through 20:00.
    Sunset,
    /// 21:00 through 02:00.
    Night,
    /// 03:00.
    DeepNight,
    /// 04:00 through 06:00.
    Dawn,
}

impl DayPhase {
    /// Map an hour of the day (0-23) to its phase.
    ///
    /// Hours outside 0-23 are treated as `Day`.
    pub const fn for_hour(hour: u32) -> Self {
        match hour {
            7..=17 => Self::Day,
            18..=20 => Self::Sunset,
            21..=23 | 0..=2 => Self::Night,
            3 => Self::DeepNight,
            4..=6 => Self::Dawn,
            _ => Self::Day,
        }
    }
}

/// Coarse two-state daylight signal derived directly from the sun angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Daylight {
    /// Sun above the horizon.
    Day,
    /// Sun below the horizon.
    Night,
}

// ---------------------------------------------------------------------------
// Predators
// ---------------------------------------------------------------------------

/// Behavioural state of a predator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredatorState {
    /// Stationary, waiting out a rest period.
    Resting,
    /// Roaming between destinations looking for the agent.
    Searching,
    /// Pursuing a visible agent.
    Chasing,
    /// In contact with the agent, dealing damage.
    Attacking,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Placement policy governing where a resource goes after consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementPolicy {
    /// Fixed position; never relocated.
    Static,
    /// Re-rolled uniformly inside its range whenever consumed.
    Random,
    /// Part of a location group exhausted as a unit before relocation.
    GroupedRandom,
}

/// Kind of consumable resource, identified by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Edible item.
    Food,
    /// Drinkable item.
    Water,
    /// Static body of water.
    Pond,
}

impl ResourceKind {
    /// Tag string used in observations, events, and metrics.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Water => "water",
            Self::Pond => "pond",
        }
    }

    /// The essential variable a unit of this resource replenishes.
    pub const fn replenishes(self) -> EssentialVariable {
        match self {
            Self::Food => EssentialVariable::Food,
            Self::Water | Self::Pond => EssentialVariable::Water,
        }
    }
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.tag())
    }
}

// ---------------------------------------------------------------------------
// Episode termination
// ---------------------------------------------------------------------------

/// Why an episode ended.
///
/// The [`Display`](core::fmt::Display) form is the reason string reported to
/// clients and the metrics sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EpisodeEndReason {
    /// Food left its configured range.
    FoodLevelOutOfRange,
    /// Water left its configured range.
    WaterLevelOutOfRange,
    /// Thermal level left its configured range (only with thermal sensing).
    ThermoLevelOutOfRange,
    /// Health exceeded its configured maximum.
    HealthLevelTooLow,
    /// Single-trial mode: any consumption ends the episode.
    ResourceConsumed,
    /// The configured step budget ran out.
    MaxStepReached,
}

impl EpisodeEndReason {
    /// Reason string as reported to clients.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FoodLevelOutOfRange => "FoodLevelOutOfRange",
            Self::WaterLevelOutOfRange => "WaterLevelOutOfRange",
            Self::ThermoLevelOutOfRange => "ThermoLevelOutOfRange",
            Self::HealthLevelTooLow => "HealthLevelTooLow",
            Self::ResourceConsumed => "ResourceConsumed",
            Self::MaxStepReached => "MaxStepReached",
        }
    }
}

impl core::fmt::Display for EpisodeEndReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
