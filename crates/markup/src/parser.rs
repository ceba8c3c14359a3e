//! Bytes to [`Element`] tree, backed by `roxmltree`.
//!
//! Element nesting is measured by a linear scan before the document is handed
//! to `roxmltree`, so input nested deeper than the configured limit is
//! rejected with a [`ParseError`] instead of exhausting the stack.

use coding::{MarkupParser, ParseError, TextPosition};
use tracing::trace;

use crate::{Element, Node, QName};

/// Default limit on element nesting.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Parses UTF-8 XML documents into owned trees.
///
/// Whitespace-only text between child elements is dropped as indentation;
/// all other text, including whitespace-only content of leaf elements, is kept
/// verbatim.
/// Comments and processing instructions are ignored.
#[derive(Debug, Clone, Copy)]
pub struct XmlParser {
    max_depth: usize,
}

impl XmlParser {
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Rejects documents whose elements nest deeper than `max_depth`.
    /// The root element is at depth 1.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for XmlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkupParser for XmlParser {
    type Tree = Element;

    fn parse(&self, bytes: &[u8]) -> Result<Element, ParseError> {
        let text = std::str::from_utf8(bytes).map_err(|err| ParseError {
            message: format!("input is not UTF-8: {err}"),
            position: None,
        })?;
        check_depth(text, self.max_depth)?;
        let document = roxmltree::Document::parse(text).map_err(|err| {
            let pos = err.pos();
            ParseError {
                message: err.to_string(),
                position: Some(TextPosition {
                    line: pos.row,
                    column: pos.col,
                }),
            }
        })?;
        let root = convert(document.root_element());
        trace!(root = %root.name(), bytes = bytes.len(), "parsed document");
        Ok(root)
    }
}

/// Fails at the first start tag that opens below `max_depth`.
///
/// Only tags are tracked. Well-formedness is left to `roxmltree`, so
/// unbalanced input passes here and is reported by the real parse.
fn check_depth(text: &str, max_depth: usize) -> Result<(), ParseError> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0usize;
    while let Some(offset) = bytes[i..].iter().position(|&b| b == b'<') {
        let start = i + offset;
        let rest = &text[start..];
        i = if rest.starts_with("<!--") {
            skip_past(text, start, "-->")
        } else if rest.starts_with("<![CDATA[") {
            skip_past(text, start, "]]>")
        } else if rest.starts_with("<?") {
            skip_past(text, start, "?>")
        } else if rest.starts_with("<!") {
            skip_declaration(bytes, start)
        } else if rest.starts_with("</") {
            depth = depth.saturating_sub(1);
            skip_past(text, start, ">")
        } else {
            if depth + 1 > max_depth {
                return Err(ParseError {
                    message: format!("element nesting exceeds the limit of {max_depth}"),
                    position: Some(position_of(text, start)),
                });
            }
            let end = end_of_tag(bytes, start);
            if bytes.get(end.wrapping_sub(2)) != Some(&b'/') {
                depth += 1;
            }
            end
        };
    }
    Ok(())
}

/// Offset just past the next `terminator` after `from`, or the end of input.
fn skip_past(text: &str, from: usize, terminator: &str) -> usize {
    text[from + 1..]
        .find(terminator)
        .map_or(text.len(), |at| from + 1 + at + terminator.len())
}

/// Offset just past the `>` closing a start tag, ignoring `>` in quoted values.
fn end_of_tag(bytes: &[u8], from: usize) -> usize {
    let mut quote = None;
    for (at, &b) in bytes.iter().enumerate().skip(from + 1) {
        match (quote, b) {
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return at + 1,
            _ => {}
        }
    }
    bytes.len()
}

/// Offset just past a `<!DOCTYPE …>`-style declaration, including any
/// bracketed internal subset.
fn skip_declaration(bytes: &[u8], from: usize) -> usize {
    let mut brackets = 0usize;
    for (at, &b) in bytes.iter().enumerate().skip(from + 2) {
        match b {
            b'[' => brackets += 1,
            b']' => brackets = brackets.saturating_sub(1),
            b'>' if brackets == 0 => return at + 1,
            _ => {}
        }
    }
    bytes.len()
}

fn position_of(text: &str, offset: usize) -> TextPosition {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before, |newline| &before[newline + 1..])
        .chars()
        .count()
        + 1;
    TextPosition {
        line: u32::try_from(line).unwrap_or(u32::MAX),
        column: u32::try_from(column).unwrap_or(u32::MAX),
    }
}

fn convert(node: roxmltree::Node<'_, '_>) -> Element {
    let tag = node.tag_name();
    let mut element = Element::new(qname(tag.namespace(), tag.name()));
    for attribute in node.attributes() {
        element = element.with_attribute(
            qname(attribute.namespace(), attribute.name()),
            attribute.value(),
        );
    }
    let leaf = !node.children().any(|child| child.is_element());
    for child in node.children() {
        if child.is_element() {
            element.push(Node::Element(convert(child)));
        } else if child.is_text() {
            if let Some(text) = child.text().filter(|t| leaf || !t.trim().is_empty()) {
                element.push(Node::Text(text.to_owned()));
            }
        }
    }
    element
}

fn qname(namespace: Option<&str>, local: &str) -> QName {
    match namespace {
        Some(ns) => QName::new(ns, local),
        None => QName::local(local),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_namespaces_attributes_and_text() {
        let xml = br#"<?xml version="1.0"?>
<sos:DeleteObservation xmlns:sos="http://www.opengis.net/sosdo/1.0" service="SOS" version="2.0.0">
    <sos:observation>http://example.org/obs/1</sos:observation>
</sos:DeleteObservation>"#;
        let root = XmlParser::new().parse(xml).expect("well-formed");

        assert_eq!(
            root.name(),
            &QName::new("http://www.opengis.net/sosdo/1.0", "DeleteObservation")
        );
        assert_eq!(root.attribute(&QName::local("service")), Some("SOS"));
        assert_eq!(root.children().len(), 1, "indentation is dropped");
        let observation = root
            .child(Some("http://www.opengis.net/sosdo/1.0"), "observation")
            .expect("child present");
        assert_eq!(observation.text(), "http://example.org/obs/1");
    }

    #[test]
    fn test_leaf_whitespace_is_kept() {
        let root = XmlParser::new()
            .parse(b"<r>\n  <v> a </v>\n  <w>  </w>\n</r>")
            .expect("well-formed");
        assert_eq!(root.children().len(), 2);
        let texts: Vec<String> = root.elements().map(Element::text).collect();
        assert_eq!(texts, [" a ", "  "]);
    }

    #[test]
    fn test_malformed_input_reports_position() {
        let err = XmlParser::new().parse(b"<a>\n  <b></a>").expect_err("mismatched tags");
        let position = err.position.expect("roxmltree reports a position");
        assert_eq!(position.line, 2);
    }

    #[test]
    fn test_non_utf8_input_is_rejected() {
        let err = XmlParser::new().parse(&[0x3c, 0xff, 0x3e]).expect_err("invalid UTF-8");
        assert!(err.message.contains("UTF-8"));
        assert_eq!(err.position, None);
    }

    #[test]
    fn test_deeply_nested_document_is_an_error() {
        let depth = 10_000;
        let xml = format!("{}{}", "<a>".repeat(depth), "</a>".repeat(depth));
        let err = XmlParser::new().parse(xml.as_bytes()).expect_err("too deep");
        assert!(err.message.contains("nesting"), "{}", err.message);
        let position = err.position.expect("offending tag is located");
        assert_eq!(position.line, 1);
        assert_eq!(position.column, 3 * DEFAULT_MAX_DEPTH as u32 + 1);
    }

    #[test]
    fn test_depth_limit_is_inclusive() {
        let parser = XmlParser::new().with_max_depth(3);
        assert!(parser.parse(b"<a><b><c/></b></a>").is_ok());
        assert!(parser.parse(b"<a><b><c x='>'></c></b></a>").is_ok());

        let err = parser
            .parse(b"<a>\n <b>\n  <c>\n   <d/>\n  </c>\n </b>\n</a>")
            .expect_err("four levels");
        assert_eq!(err.position, Some(TextPosition { line: 4, column: 4 }));
    }

    #[test]
    fn test_markup_inside_comments_and_cdata_does_not_count() {
        let parser = XmlParser::new().with_max_depth(1);
        let xml = br#"<?xml version="1.0"?>
<a><!-- <b><c> --><![CDATA[<x><y>]]></a>"#;
        assert!(parser.parse(xml).is_ok());
    }
}
