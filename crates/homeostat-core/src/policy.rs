//! Action sources that drive the agent when no learner is attached.
//!
//! The [`ActionSource`] trait abstracts where each tick's action comes
//! from. A training loop would wrap its learner in one; the engine binary
//! uses the built-in idle, scripted, and random sources.

use homeostat_types::Action;
use homeostat_world::{SimRng, Stream, derive_rng};
use rand::Rng;

use crate::config::{PolicyConfig, PolicyKind};
use crate::observation::Observation;

/// A source of agent actions.
pub trait ActionSource: Send {
    /// Choose the action for `tick` given the latest observation.
    fn next_action(&mut self, tick: u64, observation: &Observation) -> Action;
}

/// Always returns [`Action::Idle`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleActionSource;

impl IdleActionSource {
    /// Create a new idle source.
    pub const fn new() -> Self {
        Self
    }
}

impl ActionSource for IdleActionSource {
    fn next_action(&mut self, _tick: u64, _observation: &Observation) -> Action {
        Action::Idle
    }
}

/// Replays a fixed action list, looping at the end.
#[derive(Debug, Clone)]
pub struct ScriptedActionSource {
    script: Vec<Action>,
    cursor: usize,
}

impl ScriptedActionSource {
    /// Create a source over `script`. An empty script idles.
    pub const fn new(script: Vec<Action>) -> Self {
        Self { script, cursor: 0 }
    }
}

impl ActionSource for ScriptedActionSource {
    fn next_action(&mut self, _tick: u64, _observation: &Observation) -> Action {
        let action = self.script.get(self.cursor).copied().unwrap_or_default();
        self.cursor = self
            .cursor
            .saturating_add(1)
            .checked_rem(self.script.len())
            .unwrap_or(0);
        action
    }
}

/// Uniformly random actions from a seeded stream.
#[derive(Debug, Clone)]
pub struct RandomActionSource {
    rng: SimRng,
}

impl RandomActionSource {
    /// Create a source on the policy stream of `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: derive_rng(seed, Stream::Policy),
        }
    }
}

impl ActionSource for RandomActionSource {
    fn next_action(&mut self, _tick: u64, _observation: &Observation) -> Action {
        let index = self.rng.random_range(0..Action::ALL.len());
        Action::ALL.get(index).copied().unwrap_or_default()
    }
}

/// Build the configured policy.
pub fn from_config(config: &PolicyConfig, seed: u64) -> Box<dyn ActionSource> {
    match config.kind {
        PolicyKind::Idle => Box::new(IdleActionSource::new()),
        PolicyKind::Scripted => Box::new(ScriptedActionSource::new(config.script.clone())),
        PolicyKind::Random => Box::new(RandomActionSource::new(seed)),
    }
}
