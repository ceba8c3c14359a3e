//! Newtype identifiers for the dimensions a codec key is built from.
//!
//! Every dimension of a [`crate::Key`] is a distinct newtype wrapping a string.
//! This prevents accidentally interchanging, for example, a [`ServiceName`]
//! with an [`OperationName`] even though both are plain text under the hood.
//!
//! Identifiers are never empty. Runtime values go through `new`, which returns
//! `None` for empty input; compile-time constants use `from_static`.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when an identifier is built from an empty string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("identifier must not be empty")]
pub struct EmptyIdentifier;

// ---------------------------------------------------------------------------
// Macro for string-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, const from_static(),
// as_str(), Display, TryFrom<String> (used by serde).
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String")]
        pub struct $name(Cow<'static, str>);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(Cow::Owned(v))) }
            }

            /// Creates an identifier from a non-empty string literal.
            pub const fn from_static(value: &'static str) -> Self {
                Self(Cow::Borrowed(value))
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyIdentifier;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or(EmptyIdentifier)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Markup dimensions
// ---------------------------------------------------------------------------

string_id! {
    /// A markup namespace URI (e.g. `"http://www.opengis.net/swe/2.0"`).
    Namespace
}

string_id! {
    /// Identifies the shape of a payload: either a domain type or a markup
    /// element local name.
    ///
    /// Domain types use [`PayloadType::of`], which takes the fully qualified
    /// Rust type name. Markup elements use the element's local name.
    PayloadType
}

impl PayloadType {
    /// Returns the payload type identifying the Rust type `T`.
    pub fn of<T: ?Sized>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// Returns the payload type naming the markup element `local_name`.
    ///
    /// Returns `None` if `local_name` is empty.
    pub fn element(local_name: impl Into<String>) -> Option<Self> {
        Self::new(local_name)
    }
}

// ---------------------------------------------------------------------------
// Protocol operation dimensions
// ---------------------------------------------------------------------------

string_id! {
    /// A protocol service name (e.g. `"SOS"`, `"OWS"`).
    ServiceName
}

string_id! {
    /// A protocol service version (e.g. `"2.0.0"`).
    ServiceVersion
}

string_id! {
    /// A protocol operation name (e.g. `"GetDataAvailability"`).
    OperationName
}

string_id! {
    /// A MIME media type (e.g. `"text/xml"`).
    MediaType
}

impl MediaType {
    /// `text/xml`
    pub const TEXT_XML: MediaType = MediaType::from_static("text/xml");

    /// `application/xml`
    pub const APPLICATION_XML: MediaType = MediaType::from_static("application/xml");
}
