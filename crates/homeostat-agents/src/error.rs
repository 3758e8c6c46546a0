//! Error types for the homeostat-agents crate.
//!
//! Only configuration problems are errors here. Out-of-range essential
//! variables end the episode, lost targets and missing paths change predator
//! state; neither is reported through [`AgentError`].

/// Errors that can occur while building agents or predators.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A configuration value is missing or out of its valid domain.
    #[error("invalid agent configuration: {field}: {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// Explanation of what is wrong with the value.
        reason: String,
    },

    /// The fixed time step is negative or not finite.
    #[error("fixed delta time must be finite and non-negative (got {dt})")]
    InvalidTimeStep {
        /// The rejected step length in seconds.
        dt: f64,
    },
}

impl AgentError {
    /// Shorthand for an [`AgentError::InvalidConfig`] value.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}
