//! Keys describing what a codec can handle, and how close two keys are.
//!
//! A [`Key`] is an immutable value with structural equality, hashing and a
//! deterministic total order. The order exists for stable logging and
//! tie-breaking only; it never decides whether two keys match.
//!
//! | Variant | Dimensions |
//! |---------|------------|
//! | [`NamespaceTypeKey`] | optional namespace, payload type |
//! | [`OperationKey`] | service, optional version, operation, optional media type |
//! | [`CompositeKey`] | a non-empty set of the above, all required at once |
//!
//! Matching is graded by [`MatchScore`]. An absent optional dimension acts as
//! a wildcard: it matches any value of the other side, but at a cost of one
//! unit of distance so that a fully specified registration always ranks first.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::{
    MediaType, Namespace, OperationName, PayloadType, RegistryError, ServiceName, ServiceVersion,
};

// ---------------------------------------------------------------------------
// Match scores
// ---------------------------------------------------------------------------

/// How close a registered key is to a query key.
///
/// Ordered best-first: `Exact < Partial(1) < Partial(2) < … < NoMatch`.
/// Build partial scores through [`MatchScore::from_distance`], which never
/// yields `Partial(0)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchScore {
    /// The keys are structurally equal.
    Exact,
    /// The keys match through wildcards; the value is the distance (≥ 1).
    Partial(u32),
    /// The keys cannot match.
    NoMatch,
}

impl MatchScore {
    /// Converts a wildcard distance into a score; zero is an exact match.
    pub fn from_distance(distance: u32) -> Self {
        if distance == 0 {
            Self::Exact
        } else {
            Self::Partial(distance)
        }
    }

    /// Returns the distance, or `None` for [`MatchScore::NoMatch`].
    pub fn distance(self) -> Option<u32> {
        match self {
            Self::Exact => Some(0),
            Self::Partial(distance) => Some(distance),
            Self::NoMatch => None,
        }
    }

    /// Returns `true` for exact and partial matches.
    pub fn is_match(self) -> bool {
        !matches!(self, Self::NoMatch)
    }

    /// Returns `true` only for [`MatchScore::Exact`].
    pub fn is_exact(self) -> bool {
        matches!(self, Self::Exact)
    }
}

/// Distance contributed by one optional dimension, or `None` on a conflict.
fn wildcard_distance<T: PartialEq>(left: Option<&T>, right: Option<&T>) -> Option<u32> {
    match (left, right) {
        (Some(l), Some(r)) if l == r => Some(0),
        (Some(_), Some(_)) => None,
        (None, None) => Some(0),
        (Some(_), None) | (None, Some(_)) => Some(1),
    }
}

// ---------------------------------------------------------------------------
// Namespace-type keys
// ---------------------------------------------------------------------------

/// Matches codecs handling markup elements in a namespace and/or domain
/// objects of a payload type.
///
/// An absent namespace means "any namespace, distinguish by type only".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NamespaceTypeKey {
    namespace: Option<Namespace>,
    payload_type: PayloadType,
}

impl NamespaceTypeKey {
    /// Creates a key for `payload_type` within `namespace`.
    pub fn new(namespace: impl Into<Option<Namespace>>, payload_type: PayloadType) -> Self {
        Self {
            namespace: namespace.into(),
            payload_type,
        }
    }

    /// Creates a key matching `payload_type` in any namespace.
    pub fn any_namespace(payload_type: PayloadType) -> Self {
        Self::new(None, payload_type)
    }

    /// Returns the namespace, if one is set.
    pub fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    /// Returns the payload type.
    pub fn payload_type(&self) -> &PayloadType {
        &self.payload_type
    }

    /// Scores this key against `other`.
    ///
    /// The payload types must be equal. Equal namespaces match exactly; an
    /// absent namespace on either side matches at distance 1.
    pub fn similarity_to(&self, other: &Self) -> MatchScore {
        if self.payload_type != other.payload_type {
            return MatchScore::NoMatch;
        }
        match wildcard_distance(self.namespace.as_ref(), other.namespace.as_ref()) {
            Some(distance) => MatchScore::from_distance(distance),
            None => MatchScore::NoMatch,
        }
    }
}

impl std::fmt::Display for NamespaceTypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.payload_type),
            None => write!(f, "{{*}}{}", self.payload_type),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation keys
// ---------------------------------------------------------------------------

/// Matches codecs bound to one protocol operation.
///
/// Ordered by service, then version, then operation, then media type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct OperationKey {
    service: ServiceName,
    version: Option<ServiceVersion>,
    operation: OperationName,
    media_type: Option<MediaType>,
}

impl OperationKey {
    /// Creates a key without a media type.
    ///
    /// `version` may be `None` for operations such as capabilities requests
    /// that are not bound to a version.
    pub fn new(
        service: ServiceName,
        version: impl Into<Option<ServiceVersion>>,
        operation: OperationName,
    ) -> Self {
        Self {
            service,
            version: version.into(),
            operation,
            media_type: None,
        }
    }

    /// Returns a copy of this key bound to `media_type`.
    #[must_use]
    pub fn with_media_type(mut self, media_type: MediaType) -> Self {
        self.media_type = Some(media_type);
        self
    }

    /// Returns the service name.
    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    /// Returns the service version, if bound.
    pub fn version(&self) -> Option<&ServiceVersion> {
        self.version.as_ref()
    }

    /// Returns the operation name.
    pub fn operation(&self) -> &OperationName {
        &self.operation
    }

    /// Returns the media type, if bound.
    pub fn media_type(&self) -> Option<&MediaType> {
        self.media_type.as_ref()
    }

    /// Scores this key against `other`.
    ///
    /// Service and operation must be equal. Each of version and media type
    /// adds 1 to the distance when exactly one side leaves it open, and
    /// rules the match out when both sides set it to different values.
    pub fn similarity_to(&self, other: &Self) -> MatchScore {
        if self.service != other.service || self.operation != other.operation {
            return MatchScore::NoMatch;
        }
        let version = wildcard_distance(self.version.as_ref(), other.version.as_ref());
        let media_type = wildcard_distance(self.media_type.as_ref(), other.media_type.as_ref());
        match (version, media_type) {
            (Some(v), Some(m)) => MatchScore::from_distance(v + m),
            _ => MatchScore::NoMatch,
        }
    }
}

impl std::fmt::Display for OperationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let version = self.version.as_ref().map_or("*", ServiceVersion::as_str);
        let media_type = self.media_type.as_ref().map_or("*", MediaType::as_str);
        write!(
            f,
            "{}/{}/{} [{}]",
            self.service, version, self.operation, media_type
        )
    }
}

// ---------------------------------------------------------------------------
// Composite keys
// ---------------------------------------------------------------------------

/// A conjunction of atomic keys, all of which must hold at once.
///
/// The set is sorted and deduplicated, so `{A, B}` and `{B, A}` are the same
/// key. Nested composites are flattened on construction.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct CompositeKey {
    keys: BTreeSet<Key>,
}

impl CompositeKey {
    /// Builds a composite from `keys`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyCompositeKey`] if `keys` yields nothing.
    pub fn new<I>(keys: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Key>,
    {
        let mut set = BTreeSet::new();
        for key in keys {
            match key {
                Key::Composite(inner) => set.extend(inner.keys),
                atomic => {
                    set.insert(atomic);
                }
            }
        }
        if set.is_empty() {
            return Err(RegistryError::EmptyCompositeKey);
        }
        Ok(Self { keys: set })
    }

    /// Returns the member keys in their total order.
    pub fn keys(&self) -> &BTreeSet<Key> {
        &self.keys
    }

    /// Returns the number of member keys (never zero).
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Always `false`; present for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns `true` if `key` is one of the members.
    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    /// All-or-nothing: equal member sets match exactly, anything else not at all.
    pub fn similarity_to(&self, other: &Self) -> MatchScore {
        if self.keys == other.keys {
            MatchScore::Exact
        } else {
            MatchScore::NoMatch
        }
    }
}

impl std::fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all({})", join_keys(&self.keys))
    }
}

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Identifies the class of requests a codec can serve.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Key {
    /// Namespace and payload type.
    NamespaceType(NamespaceTypeKey),
    /// Protocol operation.
    Operation(OperationKey),
    /// Conjunction of atomic keys.
    Composite(CompositeKey),
}

impl Key {
    /// Combines `keys` into one key.
    ///
    /// A single key (after flattening and deduplication) is returned as is;
    /// two or more become a [`CompositeKey`].
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::EmptyCompositeKey`] if `keys` yields nothing.
    pub fn all_of<I>(keys: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Key>,
    {
        let composite = CompositeKey::new(keys)?;
        Ok(Self::Composite(composite).normalized())
    }

    /// Collapses a single-member composite into its member.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Composite(mut composite) if composite.len() == 1 => {
                match composite.keys.pop_first() {
                    Some(only) => only,
                    None => Self::Composite(composite),
                }
            }
            other => other,
        }
    }

    /// Borrowing form of [`Key::normalized`].
    pub(crate) fn canonical(&self) -> &Key {
        match self {
            Self::Composite(composite) if composite.len() == 1 => {
                composite.keys.first().unwrap_or(self)
            }
            other => other,
        }
    }

    /// Returns `true` for [`Key::Composite`].
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Composite(_))
    }

    /// Iterates the atomic keys this key stands for.
    ///
    /// An atomic key yields itself; a composite yields its members.
    pub fn atoms(&self) -> Box<dyn Iterator<Item = &Key> + '_> {
        match self {
            Self::Composite(composite) => Box::new(composite.keys.iter()),
            atomic => Box::new(std::iter::once(atomic)),
        }
    }

    /// Scores this key against `other`. The relation is symmetric.
    ///
    /// Keys of different variants never match.
    pub fn similarity_to(&self, other: &Key) -> MatchScore {
        match (self, other) {
            (Self::NamespaceType(a), Self::NamespaceType(b)) => a.similarity_to(b),
            (Self::Operation(a), Self::Operation(b)) => a.similarity_to(b),
            (Self::Composite(a), Self::Composite(b)) => a.similarity_to(b),
            _ => MatchScore::NoMatch,
        }
    }
}

impl From<NamespaceTypeKey> for Key {
    fn from(key: NamespaceTypeKey) -> Self {
        Self::NamespaceType(key)
    }
}

impl From<OperationKey> for Key {
    fn from(key: OperationKey) -> Self {
        Self::Operation(key)
    }
}

impl From<CompositeKey> for Key {
    fn from(key: CompositeKey) -> Self {
        Self::Composite(key)
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NamespaceType(key) => key.fmt(f),
            Self::Operation(key) => key.fmt(f),
            Self::Composite(key) => key.fmt(f),
        }
    }
}

/// Renders keys as a comma-separated list for log lines and error messages.
pub(crate) fn join_keys<'a>(keys: impl IntoIterator<Item = &'a Key>) -> String {
    keys.into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(version: Option<&'static str>, media_type: Option<&'static str>) -> OperationKey {
        let key = OperationKey::new(
            ServiceName::from_static("OWS"),
            version.map(ServiceVersion::from_static),
            OperationName::from_static("Describe"),
        );
        match media_type {
            Some(mt) => key.with_media_type(MediaType::from_static(mt)),
            None => key,
        }
    }

    fn ns_type(namespace: Option<&'static str>, payload: &'static str) -> NamespaceTypeKey {
        NamespaceTypeKey::new(
            namespace.map(Namespace::from_static),
            PayloadType::from_static(payload),
        )
    }

    #[test]
    fn test_equal_operation_keys_match_exactly() {
        let a = op(Some("2.0.0"), Some("text/xml"));
        assert_eq!(a.similarity_to(&a.clone()), MatchScore::Exact);
    }

    #[test]
    fn test_absent_media_type_is_a_wildcard_at_distance_one() {
        let registered = op(Some("2.0.0"), None);
        let query = op(Some("2.0.0"), Some("text/xml"));
        assert_eq!(registered.similarity_to(&query), MatchScore::Partial(1));
    }

    #[test]
    fn test_wildcards_on_both_optional_dimensions_add_up() {
        let registered = op(None, None);
        let query = op(Some("2.0.0"), Some("text/xml"));
        assert_eq!(registered.similarity_to(&query), MatchScore::Partial(2));
    }

    #[test]
    fn test_conflicting_concrete_values_never_match() {
        assert_eq!(
            op(Some("1.0.0"), None).similarity_to(&op(Some("2.0.0"), None)),
            MatchScore::NoMatch
        );
        let other_operation = OperationKey::new(
            ServiceName::from_static("OWS"),
            ServiceVersion::from_static("2.0.0"),
            OperationName::from_static("GetData"),
        );
        assert_eq!(
            op(Some("2.0.0"), None).similarity_to(&other_operation),
            MatchScore::NoMatch
        );
    }

    #[test]
    fn test_namespace_wildcard_and_type_mismatch() {
        let any = ns_type(None, "Quantity");
        let swe = ns_type(Some("urn:swe"), "Quantity");
        assert_eq!(any.similarity_to(&swe), MatchScore::Partial(1));
        assert_eq!(swe.similarity_to(&swe.clone()), MatchScore::Exact);
        assert_eq!(
            swe.similarity_to(&ns_type(Some("urn:gml"), "Quantity")),
            MatchScore::NoMatch
        );
        assert_eq!(
            swe.similarity_to(&ns_type(Some("urn:swe"), "Count")),
            MatchScore::NoMatch
        );
    }

    #[test]
    fn test_composite_key_is_order_independent_and_deduplicated() {
        let a = Key::from(op(Some("2.0.0"), None));
        let b = Key::from(ns_type(Some("urn:swe"), "Quantity"));
        let ab = CompositeKey::new([a.clone(), b.clone(), a.clone()]).expect("non-empty");
        let ba = CompositeKey::new([b, a]).expect("non-empty");
        assert_eq!(ab, ba);
        assert_eq!(ab.len(), 2);
        assert_eq!(ab.similarity_to(&ba), MatchScore::Exact);
    }

    #[test]
    fn test_composite_matching_is_all_or_nothing() {
        let a = Key::from(op(Some("2.0.0"), None));
        let b = Key::from(ns_type(Some("urn:swe"), "Quantity"));
        let c = Key::from(ns_type(None, "Quantity"));
        let ab = CompositeKey::new([a.clone(), b]).expect("non-empty");
        let ac = CompositeKey::new([a, c]).expect("non-empty");
        assert_eq!(ab.similarity_to(&ac), MatchScore::NoMatch);
    }

    #[test]
    fn test_empty_composite_is_rejected() {
        assert_eq!(
            CompositeKey::new(Vec::new()),
            Err(RegistryError::EmptyCompositeKey)
        );
        assert_eq!(Key::all_of([]), Err(RegistryError::EmptyCompositeKey));
    }

    #[test]
    fn test_nested_composites_flatten_and_single_members_normalise() {
        let a = Key::from(op(Some("2.0.0"), None));
        let b = Key::from(ns_type(None, "Quantity"));
        let inner = Key::all_of([a.clone(), b.clone()]).expect("non-empty");
        let outer = Key::all_of([inner.clone(), a.clone()]).expect("non-empty");
        assert_eq!(outer, inner);
        assert_eq!(Key::all_of([a.clone(), a.clone()]).expect("non-empty"), a);
    }

    #[test]
    fn test_keys_of_different_variants_never_match() {
        let a = Key::from(op(Some("2.0.0"), None));
        let b = Key::from(ns_type(None, "Quantity"));
        assert_eq!(a.similarity_to(&b), MatchScore::NoMatch);
    }

    #[test]
    fn test_operation_keys_order_by_service_then_version_then_operation() {
        let mut keys = vec![
            OperationKey::new(
                ServiceName::from_static("SOS"),
                ServiceVersion::from_static("1.0.0"),
                OperationName::from_static("A"),
            ),
            OperationKey::new(
                ServiceName::from_static("OWS"),
                ServiceVersion::from_static("2.0.0"),
                OperationName::from_static("B"),
            ),
            OperationKey::new(
                ServiceName::from_static("OWS"),
                ServiceVersion::from_static("1.0.0"),
                OperationName::from_static("Z"),
            ),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            ["OWS/1.0.0/Z [*]", "OWS/2.0.0/B [*]", "SOS/1.0.0/A [*]"]
        );
    }

    #[test]
    fn test_match_scores_order_best_first() {
        assert!(MatchScore::Exact < MatchScore::Partial(1));
        assert!(MatchScore::Partial(1) < MatchScore::Partial(2));
        assert!(MatchScore::Partial(u32::MAX) < MatchScore::NoMatch);
        assert_eq!(MatchScore::from_distance(0), MatchScore::Exact);
        assert_eq!(MatchScore::NoMatch.distance(), None);
    }
}
