//! Type-safe identifier wrappers around `u32` slot numbers.
//!
//! Every spawned entity in an episode has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. IDs are handed out
//! sequentially by the owning subsystem and are only unique within one
//! simulation instance, which keeps them reproducible under a fixed seed.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u32` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            /// Create an identifier from its slot number.
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Return the inner slot number.
            pub const fn into_inner(self) -> u32 {
                self.0
            }

            /// Return the identifier following this one, saturating at `u32::MAX`.
            #[must_use]
            pub const fn next(self) -> Self {
                Self(self.0.saturating_add(1))
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}-{}", stringify!($name), self.0)
            }
        }

        impl From<u32> for $name {
            fn from(raw: u32) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a consumable resource entity.
    ResourceId
}

define_id! {
    /// Unique identifier for a predator.
    PredatorId
}

define_id! {
    /// Unique identifier for a static arena obstacle.
    ObstacleId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let resource = ResourceId::new(3);
        let predator = PredatorId::new(3);
        // Same slot, different types -- the compiler enforces no mixing.
        assert_eq!(resource.into_inner(), predator.into_inner());
    }

    #[test]
    fn next_saturates() {
        assert_eq!(ResourceId::new(u32::MAX).next(), ResourceId::new(u32::MAX));
        assert_eq!(PredatorId::new(1).next(), PredatorId::new(2));
    }

    #[test]
    fn display_names_the_kind() {
        assert_eq!(PredatorId::new(7).to_string(), "PredatorId-7");
    }
}
