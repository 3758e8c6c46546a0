//! Essential-variable dynamics, reward, and termination.
//!
//! Every tick each channel moves according to a linear law over the
//! *previous* tick's snapshot:
//!
//! ```text
//! next = current
//!      + c0 * drive * dt
//!      + c1 * (prev_food    + 15) * dt
//!      + c2 * (prev_water   + 15) * dt
//!      + c3 * (prev_thermal + 15) * dt
//!      + c4 * interaction(prev_food, prev_water, prev_thermal) * dt
//!      + discrete * resource_value
//! ```
//!
//! `drive` is the range maximum for food, water, and health, and the summed
//! surround-temperature deviation for thermal. The discrete term is 1 on the
//! tick after a consumption and the configured `c5` otherwise; thermal has
//! none. Health takes the water resource value.
//!
//! Reading the snapshot rather than the in-progress values makes the update
//! independent of channel order.

use std::collections::VecDeque;

use homeostat_types::{EpisodeEndReason, EssentialVariable};
use serde::Serialize;

use crate::config::{AgentConfig, Coefficients, EvRange};
use crate::error::AgentError;

/// Offset added to every cross-coupling input.
pub const CROSS_COUPLING_BIAS: f64 = 15.0;

/// Multi-variable coupling used by the `c4` term.
pub type InteractionFn = fn(food: f64, water: f64, thermal: f64) -> f64;

/// The default interaction: a constant 1.
pub const fn constant_interaction(_food: f64, _water: f64, _thermal: f64) -> f64 {
    1.0
}

/// The four essential variables.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EssentialVariables {
    /// Nutrition.
    pub food: f64,
    /// Hydration.
    pub water: f64,
    /// Body temperature.
    pub thermal: f64,
    /// Damage.
    pub health: f64,
}

impl EssentialVariables {
    /// Start levels from configuration.
    pub const fn start(config: &AgentConfig) -> Self {
        Self {
            food: config.start_food,
            water: config.start_water,
            thermal: config.start_thermal,
            health: config.start_health,
        }
    }

    /// Value of one channel.
    pub const fn get(&self, channel: EssentialVariable) -> f64 {
        match channel {
            EssentialVariable::Food => self.food,
            EssentialVariable::Water => self.water,
            EssentialVariable::Thermal => self.thermal,
            EssentialVariable::Health => self.health,
        }
    }

    /// Overwrite one channel.
    pub const fn set(&mut self, channel: EssentialVariable, value: f64) {
        match channel {
            EssentialVariable::Food => self.food = value,
            EssentialVariable::Water => self.water = value,
            EssentialVariable::Thermal => self.thermal = value,
            EssentialVariable::Health => self.health = value,
        }
    }

    /// Values in vector order (food, water, thermal, health).
    pub const fn to_array(&self) -> [f64; 4] {
        [self.food, self.water, self.thermal, self.health]
    }
}

/// Which one-shot consumption terms fire this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiscreteEvents {
    /// Food was eaten last tick.
    pub food: bool,
    /// Water (or a pond) was drunk last tick.
    pub water: bool,
}

/// Pure update law plus reward and termination policy.
#[derive(Debug, Clone)]
pub struct HomeostasisEngine {
    ranges: [EvRange; 4],
    coefficients: [Coefficients; 4],
    food_value: f64,
    water_value: f64,
    relative_thermal: bool,
    thermal_enabled: bool,
    dt: f64,
    interaction: InteractionFn,
}

impl HomeostasisEngine {
    /// Build the engine for a fixed step `dt` in seconds.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidTimeStep`] for a negative or non-finite
    /// `dt` and [`AgentError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(config: &AgentConfig, dt: f64) -> Result<Self, AgentError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(AgentError::InvalidTimeStep { dt });
        }
        config.validate()?;
        Ok(Self {
            ranges: EssentialVariable::ALL.map(|c| config.range(c)),
            coefficients: EssentialVariable::ALL.map(|c| config.coefficients(c)),
            food_value: config.resource_food_value,
            water_value: config.resource_water_value,
            relative_thermal: config.relative_thermal_obs,
            thermal_enabled: config.use_thermal_obs,
            dt,
            interaction: constant_interaction,
        })
    }

    /// Replace the interaction term.
    #[must_use]
    pub const fn with_interaction(mut self, interaction: InteractionFn) -> Self {
        self.interaction = interaction;
        self
    }

    /// The fixed step length.
    pub const fn dt(&self) -> f64 {
        self.dt
    }

    /// Validity range of one channel.
    pub fn range(&self, channel: EssentialVariable) -> EvRange {
        self.ranges
            .get(channel.index())
            .copied()
            .unwrap_or_default()
    }

    fn coefficients(&self, channel: EssentialVariable) -> Coefficients {
        self.coefficients
            .get(channel.index())
            .copied()
            .unwrap_or_default()
    }

    /// Summed deviation of the eight thermal samples from the body
    /// temperature.
    ///
    /// In relative mode the samples already are deviations and are summed
    /// as they are.
    pub fn surround_temperature(&self, samples: &[f64], thermal: f64) -> f64 {
        if self.relative_thermal {
            samples.iter().sum()
        } else {
            samples.iter().map(|s| s - thermal).sum()
        }
    }

    /// Next value of one channel.
    ///
    /// `discrete` is the value of the one-shot term this tick and `surround`
    /// the thermal drive (ignored by the other channels).
    pub fn next_value(
        &self,
        channel: EssentialVariable,
        current: &EssentialVariables,
        previous: &EssentialVariables,
        discrete: f64,
        surround: f64,
    ) -> f64 {
        let k = self.coefficients(channel);
        let dt = self.dt;
        let drive = match channel {
            EssentialVariable::Thermal => surround,
            _ => self.range(channel).max,
        };
        let resource_value = match channel {
            EssentialVariable::Food => self.food_value,
            EssentialVariable::Water | EssentialVariable::Health => self.water_value,
            EssentialVariable::Thermal => 0.0,
        };
        let interaction = (self.interaction)(previous.food, previous.water, previous.thermal);

        current.get(channel)
            + k.c0 * drive * dt
            + k.c1 * (previous.food + CROSS_COUPLING_BIAS) * dt
            + k.c2 * (previous.water + CROSS_COUPLING_BIAS) * dt
            + k.c3 * (previous.thermal + CROSS_COUPLING_BIAS) * dt
            + k.c4 * interaction * dt
            + discrete * resource_value
    }

    /// Advance food, water, and health by one tick.
    pub fn update_metabolic(
        &self,
        levels: &mut EssentialVariables,
        previous: &EssentialVariables,
        events: DiscreteEvents,
    ) {
        let food_term = if events.food {
            1.0
        } else {
            self.coefficients(EssentialVariable::Food).c5
        };
        let water_term = if events.water {
            1.0
        } else {
            self.coefficients(EssentialVariable::Water).c5
        };
        let health_term = self.coefficients(EssentialVariable::Health).c5;

        let snapshot = *levels;
        levels.food = self.next_value(EssentialVariable::Food, &snapshot, previous, food_term, 0.0);
        levels.water =
            self.next_value(EssentialVariable::Water, &snapshot, previous, water_term, 0.0);
        levels.health =
            self.next_value(EssentialVariable::Health, &snapshot, previous, health_term, 0.0);
    }

    /// Advance the thermal channel given the eight sensor samples.
    pub fn update_thermal(
        &self,
        levels: &mut EssentialVariables,
        previous: &EssentialVariables,
        samples: &[f64],
    ) {
        let surround = self.surround_temperature(samples, levels.thermal);
        levels.thermal =
            self.next_value(EssentialVariable::Thermal, levels, previous, 0.0, surround);
    }

    /// Reward: negated normalized distance from the all-zero set-point.
    ///
    /// Always `<= 0`; exactly 0 only at the set-point.
    pub fn reward(&self, levels: &EssentialVariables) -> f64 {
        let distance = EssentialVariable::ALL
            .iter()
            .map(|&c| {
                let d = levels.get(c) / self.range(c).max;
                d * d
            })
            .sum::<f64>()
            .sqrt();
        -distance
    }

    /// Termination reason for the current levels, if any.
    ///
    /// Checked in order: food, water, thermal (only with thermal sensing
    /// enabled), then health above its maximum. Low health never ends an
    /// episode.
    pub fn check_termination(&self, levels: &EssentialVariables) -> Option<EpisodeEndReason> {
        if !self.range(EssentialVariable::Food).contains(levels.food) {
            return Some(EpisodeEndReason::FoodLevelOutOfRange);
        }
        if !self.range(EssentialVariable::Water).contains(levels.water) {
            return Some(EpisodeEndReason::WaterLevelOutOfRange);
        }
        if self.thermal_enabled && !self.range(EssentialVariable::Thermal).contains(levels.thermal)
        {
            return Some(EpisodeEndReason::ThermoLevelOutOfRange);
        }
        if levels.health > self.range(EssentialVariable::Health).max {
            return Some(EpisodeEndReason::HealthLevelTooLow);
        }
        None
    }

    /// Clamp health to its maximum.
    pub fn clamp_health(&self, levels: &mut EssentialVariables) {
        let max = self.range(EssentialVariable::Health).max;
        if levels.health > max {
            levels.health = max;
        }
    }
}

/// Fixed-capacity FIFO of recent rewards for the reporting average.
#[derive(Debug, Clone)]
pub struct RewardWindow {
    capacity: usize,
    values: VecDeque<f64>,
}

impl RewardWindow {
    /// Window holding at most `capacity` rewards (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            values: VecDeque::with_capacity(capacity),
        }
    }

    /// Push a reward, dropping the oldest when full, and return the new
    /// average.
    pub fn push(&mut self, reward: f64) -> f64 {
        if self.values.len() >= self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(reward);
        self.average()
    }

    /// Mean of the held rewards (0 when empty).
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        // Window sizes are far below 2^52.
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Number of rewards held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no reward has been pushed since the last clear.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every held reward.
    pub fn clear(&mut self) {
        self.values.clear();
    }
}
