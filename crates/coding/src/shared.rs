//! A published registry that can be replaced as a whole at runtime.
//!
//! Readers take a snapshot and resolve against it without locking. A reload
//! builds a complete new [`Registry`] off to the side and swaps it in; readers
//! in flight keep the snapshot they started with.

use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::info;

use crate::{Codec, Key, Registry, RegistryError};

/// Atomically replaceable handle to a [`Registry`].
pub struct SharedRegistry<C: ?Sized> {
    current: ArcSwap<Registry<C>>,
}

impl<C: ?Sized + Codec> SharedRegistry<C> {
    /// Publishes `registry`.
    pub fn new(registry: Registry<C>) -> Self {
        Self {
            current: ArcSwap::from_pointee(registry),
        }
    }

    /// Returns the registry currently published.
    pub fn snapshot(&self) -> Arc<Registry<C>> {
        self.current.load_full()
    }

    /// Publishes `registry` in place of the current one and returns the old one.
    pub fn replace(&self, registry: Registry<C>) -> Arc<Registry<C>> {
        let keys = registry.all_keys().len();
        let previous = self.current.swap(Arc::new(registry));
        info!(keys, "codec registry replaced");
        previous
    }

    /// Resolves against the current snapshot.
    ///
    /// # Errors
    ///
    /// See [`Registry::resolve`].
    pub fn resolve(&self, query: &Key, alternatives: &[Key]) -> Result<Arc<C>, RegistryError> {
        self.current.load().resolve(query, alternatives)
    }

    /// Returns `true` iff [`SharedRegistry::resolve`] would succeed right now.
    pub fn has(&self, query: &Key, alternatives: &[Key]) -> bool {
        self.current.load().has(query, alternatives)
    }
}

impl<C: ?Sized> std::fmt::Debug for SharedRegistry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedRegistry")
            .field("current", &*self.current.load())
            .finish()
    }
}
