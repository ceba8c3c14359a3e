//! Options threaded through an encode call.
//!
//! An [`EncodingContext`] is an open option bag. Encoders query it with
//! [`EncodingContext::has`] / [`EncodingContext::get`]; an empty context is the
//! normal default. Each top-level call owns its context, and encoders derive
//! the context for nested calls with [`EncodingContext::without`] or
//! [`EncodingContext::with`] instead of mutating what they were given.

use std::collections::BTreeMap;

/// An option recognised by one or more encoders.
///
/// The set is open: collaborators may define their own with
/// [`EncodingOption::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EncodingOption {
    /// Emit a standalone document rather than a bare fragment.
    AsDocumentRoot,
    /// Wrap the result in a property (reference) wrapper element.
    AsPropertyType,
    /// The result will be embedded in a parent; the value names the parent.
    ForEmbeddingInParent,
    /// Encode for a specific protocol version; the value is the version.
    TargetVersion,
    /// An option defined outside this crate.
    Custom(String),
}

/// The value attached to an [`EncodingOption`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// The option is present without a payload.
    Flag,
    /// The option carries text (a parent hint, a version, …).
    Text(String),
}

impl OptionValue {
    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Flag => None,
            Self::Text(text) => Some(text),
        }
    }
}

/// Order-independent mapping from option to value.
///
/// Iteration is in option order, so log output is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodingContext {
    options: BTreeMap<EncodingOption, OptionValue>,
}

impl EncodingContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `option` set as a flag.
    #[must_use]
    pub fn with(&self, option: EncodingOption) -> Self {
        self.with_entry(option, OptionValue::Flag)
    }

    /// Returns a copy with `option` set to a text value.
    #[must_use]
    pub fn with_value(&self, option: EncodingOption, value: impl Into<String>) -> Self {
        self.with_entry(option, OptionValue::Text(value.into()))
    }

    /// Returns a copy with `option` removed.
    #[must_use]
    pub fn without(&self, option: &EncodingOption) -> Self {
        let mut next = self.clone();
        next.options.remove(option);
        next
    }

    fn with_entry(&self, option: EncodingOption, value: OptionValue) -> Self {
        let mut next = self.clone();
        next.options.insert(option, value);
        next
    }

    /// Returns `true` if `option` is set, with or without a value.
    pub fn has(&self, option: &EncodingOption) -> bool {
        self.options.contains_key(option)
    }

    /// Returns the value of `option`, if set.
    pub fn get(&self, option: &EncodingOption) -> Option<&OptionValue> {
        self.options.get(option)
    }

    /// Returns the text value of `option`, if set with one.
    pub fn text(&self, option: &EncodingOption) -> Option<&str> {
        self.get(option).and_then(OptionValue::as_text)
    }

    /// Returns `true` if no option is set.
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Returns the number of options set.
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Iterates options in their total order.
    pub fn iter(&self) -> impl Iterator<Item = (&EncodingOption, &OptionValue)> {
        self.options.iter()
    }
}

impl FromIterator<(EncodingOption, OptionValue)> for EncodingContext {
    fn from_iter<I: IntoIterator<Item = (EncodingOption, OptionValue)>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_context_is_a_valid_default() {
        let ctx = EncodingContext::default();
        assert!(ctx.is_empty());
        assert!(!ctx.has(&EncodingOption::AsDocumentRoot));
        assert_eq!(ctx.get(&EncodingOption::TargetVersion), None);
    }

    #[test]
    fn test_derived_contexts_leave_the_original_untouched() {
        let root = EncodingContext::new().with(EncodingOption::AsDocumentRoot);
        let nested = root
            .without(&EncodingOption::AsDocumentRoot)
            .with_value(EncodingOption::ForEmbeddingInParent, "DataRecord");

        assert!(root.has(&EncodingOption::AsDocumentRoot));
        assert!(!nested.has(&EncodingOption::AsDocumentRoot));
        assert_eq!(
            nested.text(&EncodingOption::ForEmbeddingInParent),
            Some("DataRecord")
        );
    }

    #[test]
    fn test_option_order_does_not_matter() {
        let a: EncodingContext = [
            (EncodingOption::TargetVersion, OptionValue::Text("2.0.0".into())),
            (EncodingOption::Custom("gml-id".into()), OptionValue::Flag),
        ]
        .into_iter()
        .collect();
        let b = EncodingContext::new()
            .with(EncodingOption::Custom("gml-id".into()))
            .with_value(EncodingOption::TargetVersion, "2.0.0");
        assert_eq!(a, b);
        assert_eq!(a.len(), 2);
    }

    #[test]
    fn test_flags_have_no_text() {
        let ctx = EncodingContext::new().with(EncodingOption::AsPropertyType);
        assert_eq!(ctx.get(&EncodingOption::AsPropertyType), Some(&OptionValue::Flag));
        assert_eq!(ctx.text(&EncodingOption::AsPropertyType), None);
    }
}
