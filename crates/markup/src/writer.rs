//! [`Element`] tree to bytes.
//!
//! Every namespace used anywhere in the tree is declared once on the root
//! element. Namespaces with a configured prefix use it; the rest get `ns0`,
//! `ns1`, … in first-use order. Output is compact (no added whitespace).

use std::collections::BTreeMap;

use coding::{MarkupWriter, WriteError};

use crate::{Element, Node, QName};

/// Serialises trees as UTF-8 XML.
#[derive(Debug, Clone, Default)]
pub struct XmlWriter {
    prefixes: BTreeMap<String, String>,
    declaration: bool,
}

impl XmlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `prefix` for `namespace`.
    #[must_use]
    pub fn with_prefix(mut self, namespace: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.prefixes.insert(namespace.into(), prefix.into());
        self
    }

    /// Emits an `<?xml …?>` declaration before the root element.
    #[must_use]
    pub fn with_declaration(mut self) -> Self {
        self.declaration = true;
        self
    }

    fn assign_prefixes(&self, root: &Element) -> Result<Vec<(String, String)>, WriteError> {
        let mut used: Vec<String> = Vec::new();
        collect_namespaces(root, &mut used);

        let mut generated = 0usize;
        let mut assigned: Vec<(String, String)> = Vec::with_capacity(used.len());
        for namespace in used {
            let prefix = match self.prefixes.get(&namespace) {
                Some(prefix) => prefix.clone(),
                None => loop {
                    let candidate = format!("ns{generated}");
                    generated += 1;
                    if !self.prefixes.values().any(|p| *p == candidate) {
                        break candidate;
                    }
                },
            };
            if !is_name(&prefix) {
                return Err(WriteError {
                    message: format!("invalid prefix '{prefix}' for namespace '{namespace}'"),
                });
            }
            if let Some((other, _)) = assigned.iter().find(|(_, p)| *p == prefix) {
                return Err(WriteError {
                    message: format!(
                        "prefix '{prefix}' is bound to both '{other}' and '{namespace}'"
                    ),
                });
            }
            assigned.push((namespace, prefix));
        }
        Ok(assigned)
    }
}

impl MarkupWriter for XmlWriter {
    type Tree = Element;

    fn write(&self, tree: &Element) -> Result<Vec<u8>, WriteError> {
        let prefixes = self.assign_prefixes(tree)?;
        let mut out = String::new();
        if self.declaration {
            out.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        }
        write_element(tree, &prefixes, true, &mut out)?;
        Ok(out.into_bytes())
    }
}

fn collect_namespaces(element: &Element, used: &mut Vec<String>) {
    let names = std::iter::once(element.name()).chain(element.attributes().map(|(name, _)| name));
    for name in names {
        if let Some(ns) = name.namespace() {
            if !used.iter().any(|u| u == ns) {
                used.push(ns.to_owned());
            }
        }
    }
    for child in element.elements() {
        collect_namespaces(child, used);
    }
}

fn write_element(
    element: &Element,
    prefixes: &[(String, String)],
    is_root: bool,
    out: &mut String,
) -> Result<(), WriteError> {
    let tag = qualified(element.name(), prefixes)?;
    out.push('<');
    out.push_str(&tag);
    if is_root {
        for (namespace, prefix) in prefixes {
            out.push_str(" xmlns:");
            out.push_str(prefix);
            out.push_str("=\"");
            escape_into(namespace, true, out)?;
            out.push('"');
        }
    }
    for (name, value) in element.attributes() {
        out.push(' ');
        out.push_str(&qualified(name, prefixes)?);
        out.push_str("=\"");
        escape_into(value, true, out)?;
        out.push('"');
    }
    if element.children().is_empty() {
        out.push_str("/>");
        return Ok(());
    }
    out.push('>');
    for child in element.children() {
        match child {
            Node::Element(child) => write_element(child, prefixes, false, out)?,
            Node::Text(text) => escape_into(text, false, out)?,
        }
    }
    out.push_str("</");
    out.push_str(&tag);
    out.push('>');
    Ok(())
}

fn qualified(name: &QName, prefixes: &[(String, String)]) -> Result<String, WriteError> {
    if !is_name(name.local_name()) {
        return Err(WriteError {
            message: format!("invalid name '{name}'"),
        });
    }
    match name.namespace() {
        None => Ok(name.local_name().to_owned()),
        Some(ns) => prefixes
            .iter()
            .find(|(namespace, _)| namespace == ns)
            .map(|(_, prefix)| format!("{prefix}:{}", name.local_name()))
            .ok_or_else(|| WriteError {
                message: format!("no prefix assigned to namespace '{ns}'"),
            }),
    }
}

/// Rejects names that would produce malformed markup. Not a full XML Name check.
fn is_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '.')
        && !name
            .chars()
            .any(|c| {
                c.is_whitespace() || matches!(c, '<' | '>' | '&' | '"' | '\'' | '/' | '=' | ':')
            })
}

/// Escapes markup characters and whitespace a parser would normalise away.
/// Characters XML 1.0 cannot carry at all are an error.
fn escape_into(text: &str, attribute: bool, out: &mut String) -> Result<(), WriteError> {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            '\r' => out.push_str("&#xD;"),
            '\t' => out.push_str("&#x9;"),
            '\n' if attribute => out.push_str("&#xA;"),
            '\n' => out.push('\n'),
            c if c < ' ' || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                return Err(WriteError {
                    message: format!("character U+{:04X} cannot be written as XML", u32::from(c)),
                })
            }
            other => out.push(other),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use coding::MarkupParser;

    use super::*;
    use crate::XmlParser;

    const SWE: &str = "http://www.opengis.net/swe/2.0";
    const XLINK: &str = "http://www.w3.org/1999/xlink";

    fn write(writer: &XmlWriter, tree: &Element) -> String {
        String::from_utf8(writer.write(tree).expect("writable")).expect("UTF-8")
    }

    #[test]
    fn test_declares_configured_prefixes_on_root() {
        let tree = Element::new(QName::new(SWE, "Quantity"))
            .with_attribute(QName::new(XLINK, "href"), "#q")
            .with_child(Element::new(QName::new(SWE, "value")).with_text("1.5"));
        let writer = XmlWriter::new().with_prefix(SWE, "swe");
        assert_eq!(
            write(&writer, &tree),
            r##"<swe:Quantity xmlns:swe="http://www.opengis.net/swe/2.0" xmlns:ns0="http://www.w3.org/1999/xlink" ns0:href="#q"><swe:value>1.5</swe:value></swe:Quantity>"##
        );
    }

    #[test]
    fn test_escapes_text_and_attribute_values() {
        let tree = Element::new(QName::local("v"))
            .with_attribute(QName::local("a"), r#"x"<y"#)
            .with_text("a & b < c");
        assert_eq!(
            write(&XmlWriter::new(), &tree),
            r#"<v a="x&quot;&lt;y">a &amp; b &lt; c</v>"#
        );
    }

    #[test]
    fn test_whitespace_and_control_characters_survive_a_reparse() {
        let tree = Element::new(QName::local("v"))
            .with_attribute(QName::local("a"), "x\ty\nz")
            .with_text(" line\r\n\tnext ");
        let xml = write(&XmlWriter::new(), &tree);
        assert_eq!(xml, "<v a=\"x&#x9;y&#xA;z\"> line&#xD;\n&#x9;next </v>");
        assert_eq!(XmlParser::new().parse(xml.as_bytes()).expect("well-formed"), tree);
    }

    #[test]
    fn test_rejects_characters_xml_cannot_carry() {
        let text = Element::new(QName::local("v")).with_text("a\u{1}b");
        let err = XmlWriter::new().write(&text).expect_err("U+0001");
        assert!(err.message.contains("U+0001"), "{}", err.message);

        let attribute =
            Element::new(QName::local("v")).with_attribute(QName::local("a"), "\u{FFFF}");
        assert!(XmlWriter::new().write(&attribute).is_err());
    }

    #[test]
    fn test_rejects_names_that_cannot_be_written() {
        let tree = Element::new(QName::local("bad name"));
        assert!(XmlWriter::new().write(&tree).is_err());
    }

    #[test]
    fn test_rejects_one_prefix_for_two_namespaces() {
        let tree =
            Element::new(QName::new(SWE, "a")).with_child(Element::new(QName::new(XLINK, "b")));
        let writer = XmlWriter::new().with_prefix(SWE, "p").with_prefix(XLINK, "p");
        assert!(writer.write(&tree).is_err());
    }

    #[test]
    fn test_written_document_parses_back_to_the_same_tree() {
        let tree = Element::new(QName::new(SWE, "DataRecord"))
            .with_child(
                Element::new(QName::new(SWE, "field"))
                    .with_attribute(QName::local("name"), "temp")
                    .with_child(Element::new(QName::new(SWE, "Count")).with_child(
                        Element::new(QName::new(SWE, "value")).with_text("3"),
                    )),
            );
        let bytes = XmlWriter::new().with_declaration().write(&tree).expect("writable");
        assert_eq!(XmlParser::new().parse(&bytes).expect("well-formed"), tree);
    }
}
