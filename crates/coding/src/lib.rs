//! Codec registry domain.
//!
//! This crate contains the key model, the similarity scoring, the registry and
//! its resolution algorithm, and the encoder/decoder contract every codec
//! implements. Infrastructure crates implement the traits defined here; they
//! never add resolution rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! Parsing and writing markup are reached only through the port traits in
//! [`markup`].
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`Namespace`, `ServiceName`, `MediaType`, etc.) |
//! | [`keys`] | `Key` variants and `MatchScore` similarity |
//! | [`context`] | `EncodingContext` options passed to encoders |
//! | [`codec`] | `Codec`, `Encoder`, `Decoder` traits and the nested-encoding `Delegate` |
//! | [`factory`] | Lazy codec producers |
//! | [`registry`] | `Registry` indexing and resolution |
//! | [`shared`] | Atomically replaceable registry handle |
//! | [`repository`] | Encoder + decoder registries built at bootstrap |
//! | [`helpers`] | Key-set shorthand |
//! | [`markup`] | Parser, writer and validator port traits |
//! | [`config`] | Registry configuration |
//! | [`errors`] | Registry, encoding and decoding error types |

pub mod codec;
pub mod config;
pub mod context;
pub mod errors;
pub mod factory;
pub mod helpers;
pub mod identifiers;
pub mod keys;
pub mod markup;
pub mod registry;
pub mod repository;
pub mod shared;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use codec::{Codec, Decoder, Delegate, Encoder, Payload};
pub use config::{ConflictPolicy, RegistryConfig, DEFAULT_MAX_DELEGATION_DEPTH};
pub use context::{EncodingContext, EncodingOption, OptionValue};
pub use errors::{BoxedCause, DecodingError, EncodingError, RegistryError};
pub use factory::{Factory, FactoryId, FnFactory};
pub use helpers::{
    decoder_key_for, encoder_key_for, keys_for_elements, operation_key, xml_keys_for_operations,
};
pub use identifiers::{
    EmptyIdentifier, MediaType, Namespace, OperationName, PayloadType, ServiceName, ServiceVersion,
};
pub use keys::{CompositeKey, Key, MatchScore, NamespaceTypeKey, OperationKey};
pub use markup::{
    MarkupParser, MarkupWriter, ParseError, QualifiedNode, SchemaValidator, TextPosition,
    ValidationError, WriteError,
};
pub use registry::{MatchKind, Registry, Resolution};
pub use repository::{CodingRepository, Discovered};
pub use shared::SharedRegistry;
