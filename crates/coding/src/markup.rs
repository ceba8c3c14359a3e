//! Port traits for the markup layer.
//!
//! Parsing bytes into a tree, writing a tree back out, and validating a tree
//! against its declared schema are supplied by an infrastructure crate. This
//! crate only names the operations and their failures.

use thiserror::Error;

/// A markup node with a qualified name.
///
/// Lets key helpers derive a decoder key from a parsed document without
/// knowing the concrete tree type.
pub trait QualifiedNode {
    /// Namespace URI of the node, if it has one.
    fn namespace(&self) -> Option<&str>;

    /// Local (unprefixed) name of the node.
    fn local_name(&self) -> &str;
}

/// A 1-based position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextPosition {
    /// Line number.
    pub line: u32,
    /// Column number.
    pub column: u32,
}

impl std::fmt::Display for TextPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

fn render_position(position: &Option<TextPosition>) -> String {
    position.map(|p| format!(" at {p}")).unwrap_or_default()
}

/// The input bytes are not well-formed markup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Malformed markup{}: {message}", render_position(.position))]
pub struct ParseError {
    /// Description of the problem.
    pub message: String,
    /// Where the problem was detected, when known.
    pub position: Option<TextPosition>,
}

/// A tree does not conform to its declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{element}' is invalid: {message}")]
pub struct ValidationError {
    /// Qualified name of the offending element.
    pub element: String,
    /// Description of the violation.
    pub message: String,
}

/// A tree could not be serialised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Markup could not be written: {message}")]
pub struct WriteError {
    /// Description of the problem.
    pub message: String,
}

/// Parses raw bytes into a tree.
pub trait MarkupParser: Send + Sync {
    /// The tree type produced.
    type Tree;

    /// Parses `bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] if `bytes` are not well-formed.
    fn parse(&self, bytes: &[u8]) -> Result<Self::Tree, ParseError>;
}

/// Serialises a tree into bytes.
pub trait MarkupWriter: Send + Sync {
    /// The tree type consumed.
    type Tree;

    /// Writes `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError`] if `tree` cannot be represented.
    fn write(&self, tree: &Self::Tree) -> Result<Vec<u8>, WriteError>;
}

/// Validates a tree against the schema it declares.
pub trait SchemaValidator<Tree: ?Sized>: Send + Sync {
    /// Checks `tree`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found.
    fn validate(&self, tree: &Tree) -> Result<(), ValidationError>;
}
