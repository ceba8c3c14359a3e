//! Registry configuration.
//!
//! Loaded by the composition root (the CLI reads it from the `[registry]`
//! table of its TOML file). Every field has a default, so an empty table is valid.

use serde::{Deserialize, Serialize};

/// Default limit for nested encoder delegation.
pub const DEFAULT_MAX_DELEGATION_DEPTH: u32 = 32;

/// What `register` does when a different implementation claims a key that is
/// already taken.
///
/// Re-registering the *same* implementation is always a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail with [`crate::RegistryError::AmbiguousRegistration`].
    #[default]
    Reject,
    /// Keep the implementation registered first and log a warning.
    KeepFirst,
    /// Overwrite with the implementation registered last and log a warning.
    LastWins,
}

/// Settings applied to a [`crate::Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    /// Handling of startup-time key conflicts.
    pub on_conflict: ConflictPolicy,

    /// How many levels of nested encoder delegation are allowed before an
    /// encode call fails with
    /// [`crate::EncodingError::DelegationDepthExceeded`].
    ///
    /// The top-level encoder counts as the first level.
    pub max_delegation_depth: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            on_conflict: ConflictPolicy::default(),
            max_delegation_depth: DEFAULT_MAX_DELEGATION_DEPTH,
        }
    }
}
