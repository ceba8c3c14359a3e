//! Key-indexed registry of codecs and the resolution algorithm.
//!
//! A [`Registry`] is populated once at startup and read many times afterwards.
//! Mutation takes `&mut self`, so the borrow checker enforces the required
//! discipline: finish registering, publish (for example behind an `Arc` or a
//! [`crate::SharedRegistry`]), then resolve concurrently without locks.
//!
//! ## Indexing
//!
//! Every atomic key of a registered key set points at the implementation. A
//! set of two or more keys is also indexed as one [`CompositeKey`], so a
//! caller can demand that all of them hold at once.
//!
//! ## Resolution
//!
//! For each query, in argument order:
//!
//! 1. exact lookup: an exact hit returns immediately;
//! 2. factories, in registration order: the first that supports the query
//!    and produces a codec wins;
//! 3. similarity ranking over registered atomic keys: the smallest wildcard
//!    distance wins, ties broken by the key total order.
//!
//! The first query with any match decides. If none matches,
//! [`RegistryError::NoCodecFound`] lists every query tried.

use std::collections::hash_map::Entry as IndexEntry;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use dashmap::mapref::entry::Entry as CacheEntry;
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::keys::join_keys;
use crate::{
    Codec, CompositeKey, ConflictPolicy, Factory, FactoryId, Key, MatchScore, RegistryConfig,
    RegistryError,
};

// ---------------------------------------------------------------------------
// Resolution results
// ---------------------------------------------------------------------------

/// How a query was satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum MatchKind {
    /// A registered key equals the query.
    Exact,
    /// A factory produced the codec.
    Factory {
        /// The producing factory.
        factory: FactoryId,
    },
    /// A registered key matches the query through wildcards.
    Similar {
        /// Wildcard distance (≥ 1).
        distance: u32,
    },
}

/// The outcome of a successful resolution.
pub struct Resolution<C: ?Sized> {
    /// The resolved codec.
    pub codec: Arc<C>,
    /// Index of the query that matched (0 is the first query).
    pub query_position: usize,
    /// The registered key that matched, or the query itself for factories.
    pub matched_key: Key,
    /// How the match was made.
    pub kind: MatchKind,
}

impl<C: ?Sized + Codec> std::fmt::Debug for Resolution<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolution")
            .field("codec", &self.codec.name())
            .field("query_position", &self.query_position)
            .field("matched_key", &self.matched_key)
            .field("kind", &self.kind)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Index from [`Key`] to codec implementation.
pub struct Registry<C: ?Sized> {
    config: RegistryConfig,
    index: HashMap<Key, Arc<C>>,
    factories: Vec<Arc<dyn Factory<C>>>,
    produced: DashMap<(FactoryId, Key), Arc<C>>,
}

impl<C: ?Sized + Codec> Registry<C> {
    /// Creates an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            index: HashMap::new(),
            factories: Vec::new(),
            produced: DashMap::new(),
        }
    }

    /// Builds a registry from every discovered codec and factory.
    ///
    /// This is the single bootstrap entry point; conflicts surface here.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] raised by [`Registry::register`].
    pub fn init<I, F>(
        codecs: I,
        factories: F,
        config: RegistryConfig,
    ) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = Arc<C>>,
        F: IntoIterator<Item = Arc<dyn Factory<C>>>,
    {
        let mut registry = Self::new(config);
        for codec in codecs {
            registry.register(codec)?;
        }
        for factory in factories {
            registry.register_factory(factory);
        }
        info!(
            keys = registry.index.len(),
            factories = registry.factories.len(),
            "codec registry initialised"
        );
        Ok(registry)
    }

    /// Returns the configuration this registry was built with.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Registers `codec` under its own [`Codec::keys`].
    ///
    /// # Errors
    ///
    /// See [`Registry::register_keys`].
    pub fn register(&mut self, codec: Arc<C>) -> Result<(), RegistryError> {
        let keys = codec.keys();
        self.register_keys(keys, codec)
    }

    /// Registers `codec` under `keys`.
    ///
    /// Composite keys in `keys` are flattened into their members. Registering
    /// the same implementation again is a no-op. A different implementation
    /// under an already-indexed key is handled by the configured
    /// [`ConflictPolicy`]; under `Reject` nothing is indexed.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::EmptyKeySet`] if `keys` is empty.
    /// - [`RegistryError::AmbiguousRegistration`] on a conflict under `Reject`.
    pub fn register_keys<I>(&mut self, keys: I, codec: Arc<C>) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = Key>,
    {
        let atoms: BTreeSet<Key> = keys
            .into_iter()
            .flat_map(|key| key.atoms().cloned().collect::<Vec<_>>())
            .collect();
        if atoms.is_empty() {
            return Err(RegistryError::EmptyKeySet {
                codec: codec.name().to_owned(),
            });
        }

        let mut index_keys: Vec<Key> = atoms.iter().cloned().collect();
        if atoms.len() > 1 {
            index_keys.push(Key::Composite(CompositeKey::new(atoms.iter().cloned())?));
        }

        if self.config.on_conflict == ConflictPolicy::Reject {
            if let Some((key, existing)) = index_keys.iter().find_map(|key| {
                self.index
                    .get(key)
                    .filter(|existing| !Arc::ptr_eq(existing, &codec))
                    .map(|existing| (key, existing))
            }) {
                return Err(RegistryError::AmbiguousRegistration {
                    key: key.clone(),
                    existing: existing.name().to_owned(),
                    incoming: codec.name().to_owned(),
                });
            }
        }

        for key in index_keys {
            match self.index.entry(key) {
                IndexEntry::Vacant(slot) => {
                    slot.insert(Arc::clone(&codec));
                }
                IndexEntry::Occupied(slot) if Arc::ptr_eq(slot.get(), &codec) => {
                    trace!(codec = codec.name(), key = %slot.key(), "already registered");
                }
                IndexEntry::Occupied(mut slot) => match self.config.on_conflict {
                    ConflictPolicy::LastWins => {
                        warn!(
                            key = %slot.key(),
                            replaced = slot.get().name(),
                            codec = codec.name(),
                            "conflicting registration, last one wins"
                        );
                        slot.insert(Arc::clone(&codec));
                    }
                    // Conflicts under `Reject` were turned away above.
                    ConflictPolicy::KeepFirst | ConflictPolicy::Reject => {
                        warn!(
                            key = %slot.key(),
                            kept = slot.get().name(),
                            codec = codec.name(),
                            "conflicting registration, first one kept"
                        );
                    }
                },
            }
        }

        debug!(codec = codec.name(), keys = %join_keys(&atoms), "codec registered");
        Ok(())
    }

    /// Adds a lazy producer, consulted only when exact lookup fails.
    pub fn register_factory(&mut self, factory: Arc<dyn Factory<C>>) -> FactoryId {
        let id = FactoryId::new(self.factories.len());
        debug!(factory = factory.name(), %id, "factory registered");
        self.factories.push(factory);
        id
    }

    /// Exact lookup only.
    ///
    /// A single-member composite query is treated as its member.
    pub fn lookup(&self, query: &Key) -> Option<Arc<C>> {
        self.index.get(query.canonical()).cloned()
    }

    /// Resolves one codec for `query`, falling back to each alternative in order.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoCodecFound`] if nothing matches any query.
    pub fn resolve(&self, query: &Key, alternatives: &[Key]) -> Result<Arc<C>, RegistryError> {
        self.explain(query, alternatives)
            .map(|resolution| resolution.codec)
    }

    /// Like [`Registry::resolve`], but reports how the codec was found.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NoCodecFound`] if nothing matches any query.
    pub fn explain(
        &self,
        query: &Key,
        alternatives: &[Key],
    ) -> Result<Resolution<C>, RegistryError> {
        let queries = std::iter::once(query).chain(alternatives);
        for (position, candidate) in queries.clone().enumerate() {
            if let Some(mut resolution) = self.resolve_one(candidate) {
                resolution.query_position = position;
                trace!(
                    codec = resolution.codec.name(),
                    query = %candidate,
                    kind = ?resolution.kind,
                    "resolved"
                );
                return Ok(resolution);
            }
        }
        Err(RegistryError::NoCodecFound {
            queries: queries.cloned().collect(),
        })
    }

    /// Returns `true` iff [`Registry::resolve`] would succeed.
    pub fn has(&self, query: &Key, alternatives: &[Key]) -> bool {
        self.explain(query, alternatives).is_ok()
    }

    /// Every registered key plus every key declared by a factory.
    pub fn all_keys(&self) -> BTreeSet<Key> {
        self.index
            .keys()
            .cloned()
            .chain(self.factories.iter().flat_map(|f| f.declared_keys()))
            .collect()
    }

    /// Distinct registered implementations, ordered by their smallest key.
    pub fn codecs(&self) -> Vec<Arc<C>> {
        let mut entries: Vec<(&Key, &Arc<C>)> = self.index.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let mut distinct: Vec<Arc<C>> = Vec::new();
        for (_, codec) in entries {
            if !distinct.iter().any(|seen| Arc::ptr_eq(seen, codec)) {
                distinct.push(Arc::clone(codec));
            }
        }
        distinct
    }

    /// Number of indexed keys, composites included.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Number of registered factories.
    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }

    /// Returns `true` if nothing is registered at all.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.factories.is_empty()
    }

    fn resolve_one(&self, query: &Key) -> Option<Resolution<C>> {
        let query = query.canonical();

        if let Some(codec) = self.index.get(query) {
            return Some(Resolution {
                codec: Arc::clone(codec),
                query_position: 0,
                matched_key: query.clone(),
                kind: MatchKind::Exact,
            });
        }

        for (index, factory) in self.factories.iter().enumerate() {
            let id = FactoryId::new(index);
            if !factory.supports(query) {
                continue;
            }
            if let Some(codec) = self.produce(id, factory.as_ref(), query) {
                return Some(Resolution {
                    codec,
                    query_position: 0,
                    matched_key: query.clone(),
                    kind: MatchKind::Factory { factory: id },
                });
            }
            trace!(factory = factory.name(), %query, "factory declined");
        }

        self.closest(query)
    }

    /// Construct-or-fetch through the per-key cache.
    ///
    /// The entry lock is held while producing, so two threads never register
    /// two different instances for the same key.
    fn produce(&self, id: FactoryId, factory: &dyn Factory<C>, query: &Key) -> Option<Arc<C>> {
        let cache_key = (id, query.clone());
        if let Some(hit) = self.produced.get(&cache_key) {
            return Some(Arc::clone(hit.value()));
        }
        match self.produced.entry(cache_key) {
            CacheEntry::Occupied(entry) => Some(Arc::clone(entry.get())),
            CacheEntry::Vacant(entry) => {
                let codec = factory.produce(query)?;
                debug!(
                    factory = factory.name(),
                    codec = codec.name(),
                    %query,
                    "factory produced codec"
                );
                Some(Arc::clone(entry.insert(codec).value()))
            }
        }
    }

    fn closest(&self, query: &Key) -> Option<Resolution<C>> {
        // Composite matching is all-or-nothing, so only exact lookup applies.
        if query.is_composite() {
            return None;
        }
        self.index
            .iter()
            .filter(|(key, _)| !key.is_composite())
            .filter_map(|(key, codec)| match key.similarity_to(query) {
                MatchScore::Partial(distance) => Some((distance, key, codec)),
                MatchScore::Exact | MatchScore::NoMatch => None,
            })
            .min_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)))
            .map(|(distance, key, codec)| Resolution {
                codec: Arc::clone(codec),
                query_position: 0,
                matched_key: key.clone(),
                kind: MatchKind::Similar { distance },
            })
    }
}

impl<C: ?Sized + Codec> Default for Registry<C> {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl<C: ?Sized> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("config", &self.config)
            .field("keys", &self.index.len())
            .field("factories", &self.factories.len())
            .field("produced", &self.produced.len())
            .finish()
    }
}
