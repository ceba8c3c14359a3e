//! XML adapter for the codec registry.
//!
//! Implements the [`coding::MarkupParser`], [`coding::MarkupWriter`] and
//! [`coding::SchemaValidator`] ports over an owned element tree.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Byte-level parsing, escaping and namespace prefix
//! assignment all live here. The [`coding`] crate sees only the port traits.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`tree`] | `QName`, `Element`, `Node` |
//! | [`parser`] | `XmlParser` (bytes → tree) |
//! | [`writer`] | `XmlWriter` (tree → bytes) |
//! | [`schema`] | `SchemaRules` structural validation |

pub mod parser;
pub mod schema;
pub mod tree;
pub mod writer;

pub use parser::{XmlParser, DEFAULT_MAX_DEPTH};
pub use schema::SchemaRules;
pub use tree::{Element, Node, QName};
pub use writer::XmlWriter;
