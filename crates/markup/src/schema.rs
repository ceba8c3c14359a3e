//! Structural validation of element trees.
//!
//! Rules are keyed by qualified element name and apply wherever such an
//! element appears in the tree: required child elements and required
//! attributes. This is enough for encoders to check their own output before
//! handing it on; it is not a schema language.

use std::collections::BTreeMap;

use coding::{SchemaValidator, ValidationError};
use tracing::debug;

use crate::{Element, QName};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ElementRule {
    children: Vec<QName>,
    attributes: Vec<QName>,
}

/// Required children and attributes per element name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaRules {
    rules: BTreeMap<QName, ElementRule>,
}

impl SchemaRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `element` must contain at least one `child`.
    #[must_use]
    pub fn require_child(mut self, element: QName, child: QName) -> Self {
        self.rules.entry(element).or_default().children.push(child);
        self
    }

    /// Every `element` must carry `attribute`.
    #[must_use]
    pub fn require_attribute(mut self, element: QName, attribute: QName) -> Self {
        self.rules
            .entry(element)
            .or_default()
            .attributes
            .push(attribute);
        self
    }

    fn check(&self, element: &Element) -> Result<(), ValidationError> {
        if let Some(rule) = self.rules.get(element.name()) {
            let violation = |message: String| ValidationError {
                element: element.name().to_string(),
                message,
            };
            if let Some(missing) = rule
                .attributes
                .iter()
                .find(|name| element.attribute(name).is_none())
            {
                return Err(violation(format!("missing attribute '{missing}'")));
            }
            if let Some(missing) = rule.children.iter().find(|name| {
                element
                    .child(name.namespace(), name.local_name())
                    .is_none()
            }) {
                return Err(violation(format!("missing child element '{missing}'")));
            }
        }
        element.elements().try_for_each(|child| self.check(child))
    }
}

impl SchemaValidator<Element> for SchemaRules {
    fn validate(&self, tree: &Element) -> Result<(), ValidationError> {
        self.check(tree).inspect_err(|err| {
            debug!(root = %tree.name(), element = %err.element, "schema validation failed");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GDA: &str = "http://www.opengis.net/sosgda/1.0";

    fn rules() -> SchemaRules {
        SchemaRules::new()
            .require_child(
                QName::new(GDA, "dataAvailabilityMember"),
                QName::new(GDA, "procedure"),
            )
            .require_attribute(QName::new(GDA, "dataAvailabilityMember"), QName::local("id"))
    }

    fn member() -> Element {
        Element::new(QName::new(GDA, "dataAvailabilityMember"))
    }

    #[test]
    fn test_accepts_tree_satisfying_every_rule() {
        let tree = Element::new(QName::new(GDA, "GetDataAvailabilityResponse")).with_child(
            member()
                .with_attribute(QName::local("id"), "dam_1")
                .with_child(Element::new(QName::new(GDA, "procedure"))),
        );
        assert_eq!(rules().validate(&tree), Ok(()));
    }

    #[test]
    fn test_reports_nested_missing_child() {
        let tree = Element::new(QName::new(GDA, "GetDataAvailabilityResponse"))
            .with_child(member().with_attribute(QName::local("id"), "dam_1"));
        let err = rules().validate(&tree).expect_err("procedure missing");
        assert_eq!(err.element, format!("{{{GDA}}}dataAvailabilityMember"));
        assert!(err.message.contains("procedure"));
    }

    #[test]
    fn test_reports_missing_attribute() {
        let tree = member().with_child(Element::new(QName::new(GDA, "procedure")));
        let err = rules().validate(&tree).expect_err("id missing");
        assert_eq!(err.message, "missing attribute 'id'");
    }
}
