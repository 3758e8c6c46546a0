//! Metrics sink: the discrete events the core reports to an external
//! recorder.
//!
//! The core never formats or persists records. It calls a
//! [`MetricsSink`]; [`EpisodeRecorder`] aggregates the calls into an
//! [`EpisodeSummary`] and [`NoOpSink`] discards them.

use std::collections::{BTreeMap, BTreeSet};

use homeostat_agents::EssentialVariables;
use homeostat_types::{Action, EpisodeEndReason, ResourceKind};
use serde::Serialize;

/// Receiver of simulation metrics.
///
/// `episode_end` is always called before the next `episode_begin`.
pub trait MetricsSink: Send {
    /// A new episode starts.
    fn episode_begin(&mut self, episode: u32);

    /// The agent took an action.
    fn record_action(&mut self, tick: u64, action: Action);

    /// The agent consumed a resource of `kind`.
    fn record_consumption(&mut self, kind: ResourceKind);

    /// A contact dealt more than the collision threshold.
    fn record_collision(&mut self, damage: f64);

    /// An event tag fired.
    fn record_event(&mut self, tag: &str);

    /// A tick finished with this reward and these levels.
    fn record_step(&mut self, _reward: f64, _levels: &EssentialVariables) {}

    /// The episode ended.
    fn episode_end(&mut self, summary: &EpisodeSummary);
}

/// A sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl MetricsSink for NoOpSink {
    fn episode_begin(&mut self, _episode: u32) {}
    fn record_action(&mut self, _tick: u64, _action: Action) {}
    fn record_consumption(&mut self, _kind: ResourceKind) {}
    fn record_collision(&mut self, _damage: f64) {}
    fn record_event(&mut self, _tag: &str) {}
    fn episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// Aggregated metrics of one episode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeSummary {
    /// Episode number, starting at 1.
    pub episode: u32,
    /// Ticks recorded.
    pub total_steps: u32,
    /// Mean reward over the episode.
    pub average_reward: f64,
    /// Highest reward.
    pub max_reward: f64,
    /// Lowest reward.
    pub min_reward: f64,
    /// Food resources consumed.
    pub food_consumed: u32,
    /// Water and pond resources consumed.
    pub water_consumed: u32,
    /// Contacts above the collision threshold.
    pub collisions: u32,
    /// Event firings.
    pub total_events: u32,
    /// Distinct event tags fired.
    pub unique_event_types: u32,
    /// Share of each action in percent, keyed by label.
    pub action_percentages: BTreeMap<String, f64>,
    /// Levels after the last tick.
    pub final_levels: EssentialVariables,
    /// Why the episode ended, if it did.
    pub end_reason: Option<EpisodeEndReason>,
}

/// In-memory aggregating sink.
#[derive(Debug, Clone, Default)]
pub struct EpisodeRecorder {
    episode: u32,
    steps: u32,
    reward_sum: f64,
    reward_min: Option<f64>,
    reward_max: Option<f64>,
    food: u32,
    water: u32,
    collisions: u32,
    events: u32,
    event_tags: BTreeSet<String>,
    actions: BTreeMap<&'static str, u32>,
    last_levels: EssentialVariables,
}

impl EpisodeRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of the episode so far.
    pub fn summary(&self, end_reason: Option<EpisodeEndReason>) -> EpisodeSummary {
        let total_actions: u32 = self.actions.values().sum();
        let action_percentages = Action::ALL
            .iter()
            .map(|action| {
                let count = self.actions.get(action.label()).copied().unwrap_or(0);
                let share = if total_actions == 0 {
                    0.0
                } else {
                    f64::from(count) / f64::from(total_actions) * 100.0
                };
                (action.label().to_owned(), share)
            })
            .collect();

        EpisodeSummary {
            episode: self.episode,
            total_steps: self.steps,
            average_reward: if self.steps == 0 {
                0.0
            } else {
                self.reward_sum / f64::from(self.steps)
            },
            max_reward: self.reward_max.unwrap_or(0.0),
            min_reward: self.reward_min.unwrap_or(0.0),
            food_consumed: self.food,
            water_consumed: self.water,
            collisions: self.collisions,
            total_events: self.events,
            unique_event_types: u32::try_from(self.event_tags.len()).unwrap_or(u32::MAX),
            action_percentages,
            final_levels: self.last_levels,
            end_reason,
        }
    }

    /// Current episode number.
    pub const fn episode(&self) -> u32 {
        self.episode
    }
}

impl MetricsSink for EpisodeRecorder {
    fn episode_begin(&mut self, episode: u32) {
        *self = Self {
            episode,
            ..Self::default()
        };
    }

    fn record_action(&mut self, _tick: u64, action: Action) {
        let count = self.actions.entry(action.label()).or_insert(0);
        *count = count.saturating_add(1);
    }

    fn record_consumption(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Food => self.food = self.food.saturating_add(1),
            ResourceKind::Water | ResourceKind::Pond => {
                self.water = self.water.saturating_add(1);
            }
        }
    }

    fn record_collision(&mut self, _damage: f64) {
        self.collisions = self.collisions.saturating_add(1);
    }

    fn record_event(&mut self, tag: &str) {
        self.events = self.events.saturating_add(1);
        self.event_tags.insert(tag.to_owned());
    }

    fn record_step(&mut self, reward: f64, levels: &EssentialVariables) {
        self.steps = self.steps.saturating_add(1);
        self.reward_sum += reward;
        self.reward_min = Some(self.reward_min.map_or(reward, |m| m.min(reward)));
        self.reward_max = Some(self.reward_max.map_or(reward, |m| m.max(reward)));
        self.last_levels = *levels;
    }

    fn episode_end(&mut self, _summary: &EpisodeSummary) {}
}

/// Forwards every call to an [`EpisodeRecorder`] and a second sink.
pub struct MetricsTee<'a> {
    /// The environment's own recorder.
    pub recorder: &'a mut EpisodeRecorder,
    /// The caller-supplied sink.
    pub sink: &'a mut dyn MetricsSink,
}

impl MetricsSink for MetricsTee<'_> {
    fn episode_begin(&mut self, episode: u32) {
        self.recorder.episode_begin(episode);
        self.sink.episode_begin(episode);
    }

    fn record_action(&mut self, tick: u64, action: Action) {
        self.recorder.record_action(tick, action);
        self.sink.record_action(tick, action);
    }

    fn record_consumption(&mut self, kind: ResourceKind) {
        self.recorder.record_consumption(kind);
        self.sink.record_consumption(kind);
    }

    fn record_collision(&mut self, damage: f64) {
        self.recorder.record_collision(damage);
        self.sink.record_collision(damage);
    }

    fn record_event(&mut self, tag: &str) {
        self.recorder.record_event(tag);
        self.sink.record_event(tag);
    }

    fn record_step(&mut self, reward: f64, levels: &EssentialVariables) {
        self.recorder.record_step(reward, levels);
        self.sink.record_step(reward, levels);
    }

    fn episode_end(&mut self, summary: &EpisodeSummary) {
        self.recorder.episode_end(summary);
        self.sink.episode_end(summary);
    }
}
