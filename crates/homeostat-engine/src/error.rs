//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and of the
//! environment instances, so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading or validation failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: homeostat_core::ConfigError,
    },

    /// An environment instance failed while running.
    #[error("instance {instance} failed: {source}")]
    Instance {
        /// Zero-based instance index.
        instance: u32,
        /// The underlying runner error.
        source: homeostat_core::RunnerError,
    },

    /// A blocking instance task panicked or was cancelled.
    #[error("join error: {message}")]
    Join {
        /// Description of the join failure.
        message: String,
    },
}
