//! Encoder and decoder registries built together at startup.
//!
//! [`CodingRepository::init`] is the single bootstrap entry point: every
//! discovered codec and factory goes in, and any key conflict fails startup.
//! After that the repository is read-only and can be shared across threads.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::keys::join_keys;
use crate::{
    Codec, Decoder, DecodingError, Delegate, Encoder, EncodingContext, EncodingError, Factory,
    Key, Registry, RegistryConfig, RegistryError, ServiceName, ServiceVersion,
};

/// Everything a codec family contributes at bootstrap.
///
/// `D` is the domain type and `X` the external representation. Encoders turn
/// `D` into `X`; decoders turn `X` back into `D`.
pub struct Discovered<D, X> {
    /// Encoder implementations.
    pub encoders: Vec<Arc<dyn Encoder<D, X>>>,
    /// Decoder implementations.
    pub decoders: Vec<Arc<dyn Decoder<X, D>>>,
    /// Lazy encoder producers.
    pub encoder_factories: Vec<Arc<dyn Factory<dyn Encoder<D, X>>>>,
    /// Lazy decoder producers.
    pub decoder_factories: Vec<Arc<dyn Factory<dyn Decoder<X, D>>>>,
}

impl<D, X> Discovered<D, X> {
    /// Appends everything in `other`.
    pub fn extend(&mut self, other: Self) {
        self.encoders.extend(other.encoders);
        self.decoders.extend(other.decoders);
        self.encoder_factories.extend(other.encoder_factories);
        self.decoder_factories.extend(other.decoder_factories);
    }
}

impl<D, X> Default for Discovered<D, X> {
    fn default() -> Self {
        Self {
            encoders: Vec::new(),
            decoders: Vec::new(),
            encoder_factories: Vec::new(),
            decoder_factories: Vec::new(),
        }
    }
}

impl<D, X> std::fmt::Debug for Discovered<D, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Discovered")
            .field("encoders", &self.encoders.len())
            .field("decoders", &self.decoders.len())
            .field("encoder_factories", &self.encoder_factories.len())
            .field("decoder_factories", &self.decoder_factories.len())
            .finish()
    }
}

/// Paired encoder and decoder registries for one domain/representation pair.
pub struct CodingRepository<D, X> {
    encoders: Registry<dyn Encoder<D, X>>,
    decoders: Registry<dyn Decoder<X, D>>,
}

impl<D, X> CodingRepository<D, X> {
    /// Builds both registries from `discovered`.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] raised while registering, typically
    /// [`RegistryError::AmbiguousRegistration`].
    pub fn init(
        discovered: Discovered<D, X>,
        config: RegistryConfig,
    ) -> Result<Self, RegistryError> {
        log_keys("encoder", &discovered.encoders);
        log_keys("decoder", &discovered.decoders);

        let encoders = Registry::init(
            discovered.encoders,
            discovered.encoder_factories,
            config.clone(),
        )?;
        let decoders = Registry::init(discovered.decoders, discovered.decoder_factories, config)?;

        info!(
            encoder_keys = encoders.len(),
            decoder_keys = decoders.len(),
            "coding repository initialised"
        );
        Ok(Self { encoders, decoders })
    }

    /// The encoder registry.
    pub fn encoders(&self) -> &Registry<dyn Encoder<D, X>> {
        &self.encoders
    }

    /// The decoder registry.
    pub fn decoders(&self) -> &Registry<dyn Decoder<X, D>> {
        &self.decoders
    }

    /// Whether [`Self::encode`] would find an encoder for these queries.
    pub fn has_encoder(&self, query: &Key, alternatives: &[Key]) -> bool {
        self.encoders.has(query, alternatives)
    }

    /// Whether [`Self::decode`] would find a decoder for these queries.
    pub fn has_decoder(&self, query: &Key, alternatives: &[Key]) -> bool {
        self.decoders.has(query, alternatives)
    }

    /// Resolves an encoder and encodes `input` at the top level.
    ///
    /// # Errors
    ///
    /// See [`Delegate::encode`].
    pub fn encode(
        &self,
        query: &Key,
        alternatives: &[Key],
        input: &D,
        ctx: &EncodingContext,
    ) -> Result<X, EncodingError> {
        Delegate::root(&self.encoders).encode(query, alternatives, input, ctx)
    }

    /// Resolves a decoder and decodes `input`.
    ///
    /// # Errors
    ///
    /// - [`DecodingError::Resolution`] if no decoder matches.
    /// - Whatever the resolved decoder returns.
    pub fn decode(&self, query: &Key, alternatives: &[Key], input: &X) -> Result<D, DecodingError> {
        let decoder = self.decoders.resolve(query, alternatives)?;
        trace!(codec = decoder.name(), %query, "decoding");
        decoder.decode(input)
    }

    /// Union of the conformance classes every registered codec reports.
    pub fn conformance_classes(
        &self,
        service: &ServiceName,
        version: &ServiceVersion,
    ) -> BTreeSet<String> {
        let encoders = self.encoders.codecs().into_iter().flat_map(|codec| {
            codec.conformance_classes(service, version)
        });
        let decoders = self.decoders.codecs().into_iter().flat_map(|codec| {
            codec.conformance_classes(service, version)
        });
        encoders.chain(decoders).collect()
    }
}

impl<D, X> std::fmt::Debug for CodingRepository<D, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodingRepository")
            .field("encoders", &self.encoders)
            .field("decoders", &self.decoders)
            .finish()
    }
}

fn log_keys<C: ?Sized + Codec>(role: &str, codecs: &[Arc<C>]) {
    for codec in codecs {
        debug!(role, codec = codec.name(), keys = %join_keys(&codec.keys()), "discovered");
    }
}
