//! Sensor Observation Service codec family.
//!
//! Encoders and decoders between [`SosObject`] domain values and
//! [`markup::Element`] trees, registered through [`discovered`].
//!
//! ## Architectural Layer
//!
//! **Codec implementations.** Every type here implements a port from the
//! [`coding`] crate. Resolution and dispatch stay in [`coding`]; this crate
//! only declares keys and converts values.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`model`] | `SosObject` and the SWE Common component model |
//! | [`swe`] | SWE Common 2.0 encoder and decoder |
//! | [`delete_observation`] | DeleteObservation request codecs, response encoder factory |
//! | [`data_availability`] | GetDataAvailability response encoder |
//! | [`vocabulary`] | Namespaces, operation names, conformance classes |

use std::sync::Arc;

use coding::{CodingRepository, Discovered, RegistryConfig, RegistryError};
use markup::Element;

pub mod data_availability;
pub mod delete_observation;
pub mod model;
pub mod swe;
pub mod vocabulary;

pub use data_availability::GetDataAvailabilityEncoder;
pub use delete_observation::{
    DeleteObservationDecoder, DeleteObservationEncoder, DeleteObservationResponseEncoder,
    DeleteObservationResponseEncoderFactory,
};
pub use model::{
    Boolean, Count, DataAvailability, DataRecord, DeleteObservationRequest,
    DeleteObservationResponse, Field, GetDataAvailabilityResponse, Quantity, SosObject,
    SweComponent, Text, TimePeriod,
};
pub use swe::{SweCommonDecoder, SweCommonEncoder};

/// Repository type for this family.
pub type SosRepository = CodingRepository<SosObject, Element>;

/// Every codec and factory this family provides.
pub fn discovered() -> Discovered<SosObject, Element> {
    Discovered {
        encoders: vec![
            Arc::new(SweCommonEncoder),
            Arc::new(DeleteObservationEncoder),
            Arc::new(GetDataAvailabilityEncoder::new()),
        ],
        decoders: vec![Arc::new(SweCommonDecoder), Arc::new(DeleteObservationDecoder)],
        encoder_factories: vec![Arc::new(DeleteObservationResponseEncoderFactory)],
        decoder_factories: Vec::new(),
    }
}

/// Builds a repository holding [`discovered`].
///
/// # Errors
///
/// Returns [`RegistryError`] if the family's keys conflict under `config`.
pub fn repository(config: RegistryConfig) -> Result<SosRepository, RegistryError> {
    CodingRepository::init(discovered(), config)
}
