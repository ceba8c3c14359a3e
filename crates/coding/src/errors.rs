//! Error types for registry resolution and codec invocation.
//!
//! [`RegistryError`] covers configuration and lookup problems: a startup-time
//! conflict, an invalid key, or a resolution that exhausted every query.
//!
//! [`EncodingError`] and [`DecodingError`] are what a codec returns. Per-field
//! failures inside a codec are reported once, wrapped with their original cause;
//! nothing in this domain is retried, because every failure is deterministic
//! given the same input.
//!
//! Translating these into protocol-level fault responses is the caller's job.

use thiserror::Error;

use crate::keys::join_keys;
use crate::markup::{ParseError, ValidationError};
use crate::{Key, PayloadType};

/// A boxed error carried as the cause of a codec failure.
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Registry errors
// ---------------------------------------------------------------------------

fn render_queries(queries: &[Key]) -> String {
    join_keys(queries)
}

/// Errors raised while building a registry or resolving a codec from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// No registered or factory-produced codec matched any supplied query.
    ///
    /// Never substituted with a default codec; always surfaced to the caller.
    #[error("No codec found for {}", render_queries(.queries))]
    NoCodecFound {
        /// Every query that was tried, in the order it was tried.
        queries: Vec<Key>,
    },

    /// Two different implementations claimed the same key at startup.
    ///
    /// Raised by `register` under [`crate::ConflictPolicy::Reject`], so the
    /// fault shows up during `init` rather than at the first `resolve`.
    #[error("Ambiguous registration for {key}: '{existing}' and '{incoming}' both claim it")]
    AmbiguousRegistration {
        /// The contested key.
        key: Key,
        /// Name of the codec already indexed under `key`.
        existing: String,
        /// Name of the codec whose registration was rejected.
        incoming: String,
    },

    /// A composite key was built from zero keys.
    #[error("Composite key must contain at least one key")]
    EmptyCompositeKey,

    /// A codec was registered with an empty key set, so nothing could find it.
    #[error("Codec '{codec}' declares no keys")]
    EmptyKeySet {
        /// Name of the offending codec.
        codec: String,
    },
}

// ---------------------------------------------------------------------------
// Encoding errors
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::Encoder::encode`].
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The domain object could not be converted.
    #[error("Encoding failed: {message}")]
    Failed {
        /// Human-readable description of the failure.
        message: String,
        /// The underlying cause, when one exists.
        #[source]
        source: Option<BoxedCause>,
    },

    /// A field the external representation requires is absent.
    #[error("Required field '{field}' is missing on {payload}")]
    MissingField {
        /// Payload type of the object being encoded.
        payload: PayloadType,
        /// Name of the missing field.
        field: String,
    },

    /// The encoder was handed a domain object outside its declared keys.
    ///
    /// Indicates a registration or resolution bug rather than bad data.
    #[error("Encoder '{encoder}' cannot handle {payload}")]
    UnsupportedInput {
        /// Name of the encoder that refused the input.
        encoder: String,
        /// Payload type of the rejected input.
        payload: PayloadType,
    },

    /// The encoded output failed validation against its declared schema.
    #[error("Encoded output failed validation")]
    Validation(#[from] ValidationError),

    /// A nested encoder could not be resolved.
    #[error("No encoder available")]
    Resolution(#[from] RegistryError),

    /// Recursive delegation went deeper than the configured limit.
    ///
    /// Usually a cycle in the domain object graph.
    #[error("Nested encoding exceeded the maximum delegation depth of {limit}")]
    DelegationDepthExceeded {
        /// The configured limit.
        limit: u32,
    },
}

impl EncodingError {
    /// Creates an [`EncodingError::Failed`] without a cause.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an [`EncodingError::Failed`] wrapping `cause`.
    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        Self::Failed {
            message: message.into(),
            source: Some(cause.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding errors
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::Decoder::decode`].
#[derive(Debug, Error)]
pub enum DecodingError {
    /// The input is structurally or semantically invalid for this decoder.
    #[error("Invalid input: {message}")]
    Invalid {
        /// Human-readable description of the problem.
        message: String,
        /// The underlying cause, when one exists.
        #[source]
        source: Option<BoxedCause>,
    },

    /// A required child element is absent.
    #[error("Element '{parent}' is missing required child '{element}'")]
    MissingElement {
        /// Qualified name of the parent element.
        parent: String,
        /// Local name of the missing child.
        element: String,
    },

    /// The decoder was handed an input its keys should have excluded.
    #[error("Decoder '{decoder}' cannot handle '{input}'")]
    UnsupportedInput {
        /// Name of the decoder that refused the input.
        decoder: String,
        /// Description of the rejected input (usually its qualified name).
        input: String,
    },

    /// The raw bytes could not be parsed into a tree.
    #[error("Input could not be parsed")]
    Parse(#[from] ParseError),

    /// The parsed tree failed validation against its declared schema.
    #[error("Input failed validation")]
    Validation(#[from] ValidationError),

    /// No decoder could be resolved for the input.
    #[error("No decoder available")]
    Resolution(#[from] RegistryError),
}

impl DecodingError {
    /// Creates a [`DecodingError::Invalid`] without a cause.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a [`DecodingError::Invalid`] wrapping `cause`.
    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxedCause>) -> Self {
        Self::Invalid {
            message: message.into(),
            source: Some(cause.into()),
        }
    }
}
