//! Day/night cycle: sun angle, hour buckets, and the diurnal temperature
//! bias.
//!
//! The sun angle advances by a fixed fine step every tick. The full
//! rotation is split into coarse hour buckets; the thermal bias and the
//! day phase only change when the bucket changes.
//!
//! # Time mapping
//!
//! - Sun angle 0 is 06h, 90 is noon. Bucket `b` maps to hour `(b + 6) % 24`.
//! - The bias ramps linearly from the night value at 04h up to the day
//!   value at 12h, then back down to the night value at the next 04h.
//! - The coarse daylight signal is `Day` for angles in `[350, 360)` or
//!   `[0, 170]` and `Night` otherwise.

use homeostat_types::{DayPhase, Daylight};
use homeostat_world::SimRng;
use rand::Rng;
use tracing::debug;

use crate::config::DayNightConfig;

/// Degrees in a full sun rotation.
const FULL_ROTATION: f64 = 360.0;

/// Sun angle at reset when the start angle is not randomised (noon).
const NOON_ANGLE: f64 = 90.0;

/// Hour at sun angle 0.
const HOUR_AT_ZERO: u32 = 6;

/// Errors that can occur while building the cycle.
#[derive(Debug, thiserror::Error)]
pub enum DayNightError {
    /// Invalid cycle configuration (e.g. zero hour buckets).
    #[error("invalid day/night configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Sun rotation state.
#[derive(Debug, Clone, PartialEq)]
pub struct DayNightCycle {
    enabled: bool,
    random_start: bool,
    sun_angle: f64,
    /// Degrees advanced per tick.
    angle_per_tick: f64,
    /// Degrees per hour bucket.
    bucket_angle: f64,
    buckets: u32,
    current_bucket: Option<u32>,
    day_bias: f64,
    night_bias: f64,
}

impl DayNightCycle {
    /// Create a cycle at noon.
    ///
    /// # Errors
    ///
    /// Returns [`DayNightError::InvalidConfig`] if the multiplier, speed, or
    /// bucket count is zero.
    pub fn new(config: &DayNightConfig) -> Result<Self, DayNightError> {
        if config.rotation_interval_multiplier == 0 {
            return Err(DayNightError::InvalidConfig {
                reason: "rotation_interval_multiplier must be at least 1".to_owned(),
            });
        }
        if config.rotation_speed_steps == 0 {
            return Err(DayNightError::InvalidConfig {
                reason: "rotation_speed_steps must be at least 1".to_owned(),
            });
        }
        if config.temperature_update_steps == 0 {
            return Err(DayNightError::InvalidConfig {
                reason: "temperature_update_steps must be at least 1".to_owned(),
            });
        }

        let fine_steps = FULL_ROTATION * f64::from(config.rotation_interval_multiplier);
        Ok(Self {
            enabled: config.enabled,
            random_start: config.random_sun_angle,
            sun_angle: NOON_ANGLE,
            angle_per_tick: FULL_ROTATION / fine_steps * f64::from(config.rotation_speed_steps),
            bucket_angle: FULL_ROTATION / f64::from(config.temperature_update_steps),
            buckets: config.temperature_update_steps,
            current_bucket: None,
            day_bias: config.day_temperature_change,
            night_bias: config.night_temperature_change,
        })
    }

    /// Put the sun back at its start angle (noon, or random when
    /// configured). The next [`DayNightCycle::advance`] always reports a
    /// bucket change.
    pub fn reset(&mut self, rng: &mut SimRng) {
        self.sun_angle = if self.random_start {
            rng.random_range(0.0..FULL_ROTATION)
        } else {
            NOON_ANGLE
        };
        self.current_bucket = None;
        debug!(sun_angle = self.sun_angle, hour = self.hour(), "Day/night reset");
    }

    /// Advance one tick.
    ///
    /// Returns the new temperature bias when the hour bucket changed, or
    /// `None` when the field can keep its current offset.
    pub fn advance(&mut self) -> Option<f64> {
        if self.enabled {
            self.sun_angle = (self.sun_angle + self.angle_per_tick).rem_euclid(FULL_ROTATION);
        }
        let bucket = self.bucket();
        if self.current_bucket == Some(bucket) {
            return None;
        }
        self.current_bucket = Some(bucket);
        let bias = self.temperature_bias();
        debug!(hour = self.hour(), bias, "Hour changed");
        Some(bias)
    }

    /// Current sun angle in `[0, 360)`.
    pub const fn sun_angle(&self) -> f64 {
        self.sun_angle
    }

    /// Current hour bucket.
    pub fn bucket(&self) -> u32 {
        bucket_of(self.sun_angle, self.bucket_angle, self.buckets)
    }

    /// Current hour of the day (0-23).
    pub fn hour(&self) -> u32 {
        self.bucket().saturating_add(HOUR_AT_ZERO) % 24
    }

    /// Fine-grained phase of the current hour.
    pub fn phase(&self) -> DayPhase {
        DayPhase::for_hour(self.hour())
    }

    /// Coarse daylight signal from the sun angle.
    pub fn daylight(&self) -> Daylight {
        if self.sun_angle >= 350.0 || self.sun_angle <= 170.0 {
            Daylight::Day
        } else {
            Daylight::Night
        }
    }

    /// Bias applied at the night adjustment on reset.
    pub const fn night_bias(&self) -> f64 {
        self.night_bias
    }

    /// Temperature bias for the current hour.
    pub fn temperature_bias(&self) -> f64 {
        let hour = f64::from(self.hour());
        if (4.0..=12.0).contains(&hour) {
            lerp(self.night_bias, self.day_bias, (hour - 4.0) / 8.0)
        } else {
            let hour = if hour < 4.0 { hour + 24.0 } else { hour };
            lerp(self.day_bias, self.night_bias, (hour - 12.0) / 16.0)
        }
    }
}

fn lerp(from: f64, to: f64, t: f64) -> f64 {
    (to - from).mul_add(t, from)
}

/// Bucket index of a sun angle.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bucket_of(angle: f64, bucket_angle: f64, buckets: u32) -> u32 {
    // Angle is in [0, 360) and bucket_angle > 0, so the quotient is a small
    // non-negative number.
    let raw = (angle / bucket_angle).floor().max(0.0) as u32;
    raw.checked_rem(buckets).unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use homeostat_world::{Stream, derive_rng};

    use super::*;

    fn cycle() -> DayNightCycle {
        DayNightCycle::new(&DayNightConfig::default()).unwrap()
    }

    #[test]
    fn starts_at_noon() {
        let c = cycle();
        assert_eq!(c.hour(), 12);
        assert_eq!(c.phase(), DayPhase::Day);
        assert_eq!(c.daylight(), Daylight::Day);
        assert!((c.temperature_bias() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn bias_reported_only_on_bucket_change() {
        let mut c = cycle();
        c.reset(&mut derive_rng(1, Stream::DayNight));
        // First advance after reset always reports.
        assert!(c.advance().is_some());
        // 1 degree per tick, 15 degrees per bucket: 90 -> 105 crosses at 14 more ticks.
        let changes = (0..14).filter(|_| c.advance().is_some()).count();
        assert_eq!(changes, 1);
        assert_eq!(c.hour(), 13);
    }

    #[test]
    fn bias_ramps_between_extremes() {
        let mut c = cycle();
        // Sun angle 270 is hour 0.
        c.sun_angle = 270.0;
        assert_eq!(c.hour(), 0);
        assert!((c.temperature_bias() - (5.0 - 10.0 * 12.0 / 16.0)).abs() < 1e-12);
        // Hour 4 is the coldest.
        c.sun_angle = 330.0;
        assert_eq!(c.hour(), 4);
        assert!((c.temperature_bias() + 5.0).abs() < 1e-12);
        // Hour 8 is halfway up.
        c.sun_angle = 30.0;
        assert!(c.temperature_bias().abs() < 1e-12);
    }

    #[test]
    fn night_phases_follow_hour() {
        let mut c = cycle();
        c.sun_angle = 225.0;
        assert_eq!(c.hour(), 21);
        assert_eq!(c.phase(), DayPhase::Night);
        assert_eq!(c.daylight(), Daylight::Night);
        c.sun_angle = 315.0;
        assert_eq!(c.phase(), DayPhase::DeepNight);
    }

    #[test]
    fn daylight_follows_sun_angle_not_hour() {
        let mut c = cycle();
        // Hour 18 is sunset, but the sun is already below the horizon.
        c.sun_angle = 180.0;
        assert_eq!(c.phase(), DayPhase::Sunset);
        assert_eq!(c.daylight(), Daylight::Night);
        // Hour 6 is dawn, but the sun is up.
        c.sun_angle = 10.0;
        assert_eq!(c.phase(), DayPhase::Dawn);
        assert_eq!(c.daylight(), Daylight::Day);
        c.sun_angle = 350.0;
        assert_eq!(c.daylight(), Daylight::Day);
        c.sun_angle = 170.0;
        assert_eq!(c.daylight(), Daylight::Day);
    }

    #[test]
    fn angle_wraps() {
        let mut c = cycle();
        c.sun_angle = 359.5;
        c.advance();
        assert!(c.sun_angle() < 1.0);
    }

    #[test]
    fn disabled_cycle_stays_put() {
        let config = DayNightConfig {
            enabled: false,
            ..DayNightConfig::default()
        };
        let mut c = DayNightCycle::new(&config).unwrap();
        for _ in 0..100 {
            c.advance();
        }
        assert!((c.sun_angle() - 90.0).abs() < 1e-12);
    }

    #[test]
    fn random_start_is_seeded() {
        let config = DayNightConfig {
            random_sun_angle: true,
            ..DayNightConfig::default()
        };
        let mut a = DayNightCycle::new(&config).unwrap();
        let mut b = DayNightCycle::new(&config).unwrap();
        a.reset(&mut derive_rng(9, Stream::DayNight));
        b.reset(&mut derive_rng(9, Stream::DayNight));
        assert!((a.sun_angle() - b.sun_angle()).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_buckets_rejected() {
        let config = DayNightConfig {
            temperature_update_steps: 0,
            ..DayNightConfig::default()
        };
        assert!(DayNightCycle::new(&config).is_err());
    }
}
