//! Lazy producers of codecs.
//!
//! A [`Factory`] is consulted only when exact lookup fails. It answers whether
//! it supports a query key and, if so, produces a codec for it. The registry
//! memoises what a factory produces per key, so a factory never needs shared
//! mutable builder state of its own.

use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;

use crate::Key;

/// Position of a factory in the registry's factory arena.
///
/// Lower ids were registered earlier and are consulted first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FactoryId(usize);

impl FactoryId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for FactoryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "factory#{}", self.0)
    }
}

/// Produces codecs of type `C` on demand.
///
/// `supports` and `produce` may be called concurrently for the same key and
/// must be independently safe. `produce` must not re-enter the registry that
/// owns the factory.
pub trait Factory<C: ?Sized>: Send + Sync {
    /// Human-readable name used in logs.
    fn name(&self) -> &str;

    /// Returns `true` if this factory can produce a codec for `key`.
    fn supports(&self, key: &Key) -> bool;

    /// Produces a codec for `key`, or `None` if it declines after all.
    fn produce(&self, key: &Key) -> Option<Arc<C>>;

    /// Keys worth listing in diagnostics. May be a subset of what
    /// [`Factory::supports`] accepts.
    fn declared_keys(&self) -> BTreeSet<Key> {
        BTreeSet::new()
    }
}

/// A factory built from a predicate and a producer closure.
pub struct FnFactory<C: ?Sized, P, F> {
    name: String,
    predicate: P,
    producer: F,
    declared: BTreeSet<Key>,
    _codec: PhantomData<fn() -> Arc<C>>,
}

impl<C, P, F> FnFactory<C, P, F>
where
    C: ?Sized,
    P: Fn(&Key) -> bool + Send + Sync,
    F: Fn(&Key) -> Option<Arc<C>> + Send + Sync,
{
    /// Creates a factory named `name`.
    pub fn new(name: impl Into<String>, predicate: P, producer: F) -> Self {
        Self {
            name: name.into(),
            predicate,
            producer,
            declared: BTreeSet::new(),
            _codec: PhantomData,
        }
    }

    /// Sets the keys reported by [`Factory::declared_keys`].
    #[must_use]
    pub fn with_declared_keys(mut self, keys: impl IntoIterator<Item = Key>) -> Self {
        self.declared = keys.into_iter().collect();
        self
    }
}

impl<C, P, F> Factory<C> for FnFactory<C, P, F>
where
    C: ?Sized,
    P: Fn(&Key) -> bool + Send + Sync,
    F: Fn(&Key) -> Option<Arc<C>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn supports(&self, key: &Key) -> bool {
        (self.predicate)(key)
    }

    fn produce(&self, key: &Key) -> Option<Arc<C>> {
        (self.producer)(key)
    }

    fn declared_keys(&self) -> BTreeSet<Key> {
        self.declared.clone()
    }
}

impl<C: ?Sized, P, F> std::fmt::Debug for FnFactory<C, P, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnFactory")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .finish_non_exhaustive()
    }
}
