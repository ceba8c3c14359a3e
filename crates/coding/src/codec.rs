//! The operation surface every encoder and decoder implements.
//!
//! A codec declares what it accepts through [`Codec::keys`] and converts
//! between a domain value and an external representation. Inputs are borrowed
//! immutably, so a codec cannot mutate what it is given.
//!
//! Encoders for composite structures encode their nested elements by
//! re-entering the encoder registry through a [`Delegate`]. The delegate counts
//! nesting depth and stops runaway recursion (for example a cycle in the
//! domain object graph) at the configured limit.

use std::collections::BTreeSet;

use tracing::trace;

use crate::{
    DecodingError, EncodingContext, EncodingError, Key, PayloadType, Registry, ServiceName,
    ServiceVersion,
};

/// Capabilities shared by encoders and decoders.
pub trait Codec: Send + Sync {
    /// Human-readable name used in logs and error messages.
    fn name(&self) -> &str;

    /// The keys this codec answers to.
    fn keys(&self) -> BTreeSet<Key>;

    /// Conformance classes this codec implements for `service`/`version`.
    ///
    /// A side channel for capability reporting; not used for dispatch.
    fn conformance_classes(
        &self,
        _service: &ServiceName,
        _version: &ServiceVersion,
    ) -> BTreeSet<String> {
        BTreeSet::new()
    }
}

/// Converts a domain value `S` into an external representation `T`.
pub trait Encoder<S, T>: Codec {
    /// Encodes `input`.
    ///
    /// `nested` resolves and invokes encoders for nested elements.
    ///
    /// # Errors
    ///
    /// - [`EncodingError::UnsupportedInput`] when `input` is outside this
    ///   encoder's declared handling.
    /// - Any other [`EncodingError`] variant when conversion fails.
    fn encode(
        &self,
        input: &S,
        ctx: &EncodingContext,
        nested: &Delegate<'_, S, T>,
    ) -> Result<T, EncodingError>;
}

/// Converts an external representation `S` into a domain value `T`.
pub trait Decoder<S, T>: Codec {
    /// Decodes `input`.
    ///
    /// # Errors
    ///
    /// - [`DecodingError::UnsupportedInput`] when `input` has a shape this
    ///   decoder's keys should have excluded.
    /// - Any other [`DecodingError`] variant when `input` is invalid.
    fn decode(&self, input: &S) -> Result<T, DecodingError>;
}

/// A domain value that can name its own payload type.
///
/// Implemented by closed sum types over a family's concrete shapes, so the
/// encoder key for a value is derived once at the call site.
pub trait Payload {
    /// Payload type of the concrete variant held.
    fn payload_type(&self) -> PayloadType;
}

// ---------------------------------------------------------------------------
// Delegation
// ---------------------------------------------------------------------------

/// Handle through which an encoder encodes nested elements.
///
/// Created at depth 0 by the caller of the top-level encode. Each call to
/// [`Delegate::encode`] hands the resolved encoder a child delegate one level
/// deeper.
pub struct Delegate<'r, S, T> {
    encoders: &'r Registry<dyn Encoder<S, T>>,
    depth: u32,
}

impl<'r, S, T> Delegate<'r, S, T> {
    /// Creates the top-level delegate for `encoders`.
    pub fn root(encoders: &'r Registry<dyn Encoder<S, T>>) -> Self {
        Self { encoders, depth: 0 }
    }

    /// Current nesting depth; 0 before the top-level encoder runs.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Returns `true` if an encoder could be resolved for any of the queries.
    pub fn has(&self, query: &Key, alternatives: &[Key]) -> bool {
        self.encoders.has(query, alternatives)
    }

    /// Resolves an encoder for the queries and encodes `input` with it.
    ///
    /// # Errors
    ///
    /// - [`EncodingError::DelegationDepthExceeded`] past the configured depth.
    /// - [`EncodingError::Resolution`] if no encoder matches.
    /// - Whatever the resolved encoder returns.
    pub fn encode(
        &self,
        query: &Key,
        alternatives: &[Key],
        input: &S,
        ctx: &EncodingContext,
    ) -> Result<T, EncodingError> {
        let limit = self.encoders.config().max_delegation_depth;
        if self.depth >= limit {
            return Err(EncodingError::DelegationDepthExceeded { limit });
        }
        let encoder = self.encoders.resolve(query, alternatives)?;
        let child = Delegate {
            encoders: self.encoders,
            depth: self.depth + 1,
        };
        trace!(codec = encoder.name(), %query, depth = child.depth, "encoding");
        encoder.encode(input, ctx, &child)
    }
}

impl<S, T> std::fmt::Debug for Delegate<'_, S, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Delegate")
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}
