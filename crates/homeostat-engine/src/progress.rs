//! Tick callback that traces an instance's progress.

use homeostat_core::{SimulationState, TickCallback, TickSummary};
use tracing::{debug, trace};

/// Logs hour changes and event firings of one instance.
pub struct ProgressCallback {
    instance: u32,
    last_hour: Option<u32>,
}

impl ProgressCallback {
    /// Create a callback for `instance`.
    pub const fn new(instance: u32) -> Self {
        Self {
            instance,
            last_hour: None,
        }
    }
}

impl TickCallback for ProgressCallback {
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
        if self.last_hour != Some(summary.hour) {
            self.last_hour = Some(summary.hour);
            trace!(
                instance = self.instance,
                episode = state.episode,
                tick = summary.tick,
                hour = summary.hour,
                "Hour changed"
            );
        }
        for tag in &summary.events {
            debug!(
                instance = self.instance,
                episode = state.episode,
                tick = summary.tick,
                tag = tag.as_str(),
                "Event fired"
            );
        }
        if let Some(reason) = summary.end_reason {
            debug!(
                instance = self.instance,
                episode = state.episode,
                tick = summary.tick,
                reason = ?reason,
                average_reward = summary.average_reward,
                "Episode ended"
            );
        }
    }
}
