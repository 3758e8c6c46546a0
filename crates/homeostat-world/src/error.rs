//! Error types for the `homeostat-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`]. Placement
//! failures are deliberately absent: they fall back and log instead.

use homeostat_types::ResourceId;

/// Errors that can occur while building or mutating the world.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A configuration value is missing or out of its valid domain.
    #[error("invalid world configuration: {field}: {reason}")]
    InvalidConfig {
        /// Dotted path of the offending field.
        field: String,
        /// Explanation of what is wrong with the value.
        reason: String,
    },

    /// The thermal grid has a zero-sized dimension.
    #[error("thermal grid must be at least 1x1 (got {cells_x}x{cells_z})")]
    EmptyGrid {
        /// Configured cell count along x.
        cells_x: u32,
        /// Configured cell count along z.
        cells_z: u32,
    },

    /// A consumption was reported for a resource the pool does not own.
    #[error("resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// A consumption was reported for a resource that is already inactive.
    #[error("resource {0} is not active")]
    ResourceInactive(ResourceId),
}

impl WorldError {
    /// Shorthand for an [`WorldError::InvalidConfig`] value.
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}
