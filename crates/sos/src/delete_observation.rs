//! DeleteObservation request and response codecs.

use std::collections::BTreeSet;
use std::sync::Arc;

use coding::{
    keys_for_elements, xml_keys_for_operations, Codec, Decoder, DecodingError, Delegate, Encoder,
    EncodingContext, EncodingError, Factory, Key, MediaType, OperationKey, Payload, PayloadType,
    ServiceName, ServiceVersion,
};
use markup::{Element, QName};
use tracing::debug;

use crate::model::{DeleteObservationRequest, DeleteObservationResponse, SosObject};
use crate::vocabulary::{
    is_sos_2, DELETE_OBSERVATION, DELETE_OBSERVATION_CONFORMANCE_CLASS, NS_SOSDO_10, SOS,
    SOS_1_0_0, SOS_2_0_0,
};

fn sosdo(local: &str) -> QName {
    QName::new(NS_SOSDO_10.as_str(), local)
}

fn request_element_keys() -> BTreeSet<Key> {
    keys_for_elements(&NS_SOSDO_10, [PayloadType::from_static("DeleteObservation")])
}

/// Requests also arrive identified by operation rather than root element.
fn request_keys() -> BTreeSet<Key> {
    let mut keys = request_element_keys();
    keys.extend(xml_keys_for_operations(&SOS, &SOS_2_0_0, [DELETE_OBSERVATION]));
    keys
}

fn delete_observation_conformance(
    service: &ServiceName,
    version: &ServiceVersion,
) -> BTreeSet<String> {
    if is_sos_2(service, version) {
        BTreeSet::from([DELETE_OBSERVATION_CONFORMANCE_CLASS.to_owned()])
    } else {
        BTreeSet::new()
    }
}

// ---------------------------------------------------------------------------
// Request decoder
// ---------------------------------------------------------------------------

/// Reads `sosdo:DeleteObservation` requests.
#[derive(Debug, Default)]
pub struct DeleteObservationDecoder;

impl Codec for DeleteObservationDecoder {
    fn name(&self) -> &str {
        "delete-observation-decoder"
    }

    fn keys(&self) -> BTreeSet<Key> {
        request_keys()
    }

    fn conformance_classes(
        &self,
        service: &ServiceName,
        version: &ServiceVersion,
    ) -> BTreeSet<String> {
        delete_observation_conformance(service, version)
    }
}

impl Decoder<Element, SosObject> for DeleteObservationDecoder {
    fn decode(&self, input: &Element) -> Result<SosObject, DecodingError> {
        if !input.name().is(Some(NS_SOSDO_10.as_str()), "DeleteObservation") {
            return Err(DecodingError::UnsupportedInput {
                decoder: self.name().to_owned(),
                input: input.name().to_string(),
            });
        }
        let attribute = |name: &str| {
            input
                .attribute(&QName::local(name))
                .map(str::to_owned)
                .ok_or_else(|| {
                    DecodingError::invalid(format!("DeleteObservation has no {name} attribute"))
                })
        };
        let observation_identifiers = input
            .children_named(Some(NS_SOSDO_10.as_str()), "observation")
            .enumerate()
            .map(|(i, observation)| {
                let id = observation.text().trim().to_owned();
                if id.is_empty() {
                    Err(DecodingError::invalid(format!(
                        "DeleteObservation observation #{} is empty",
                        i + 1
                    )))
                } else {
                    Ok(id)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        if observation_identifiers.is_empty() {
            return Err(DecodingError::invalid(
                "DeleteObservation names no observation identifier",
            ));
        }

        let request = DeleteObservationRequest {
            service: attribute("service")?,
            version: attribute("version")?,
            observation_identifiers,
        };
        debug!(?request, "decoded DeleteObservation request");
        Ok(SosObject::DeleteObservationRequest(request))
    }
}

// ---------------------------------------------------------------------------
// Request encoder
// ---------------------------------------------------------------------------

/// Writes `sosdo:DeleteObservation` requests.
#[derive(Debug, Default)]
pub struct DeleteObservationEncoder;

impl Codec for DeleteObservationEncoder {
    fn name(&self) -> &str {
        "delete-observation-encoder"
    }

    fn keys(&self) -> BTreeSet<Key> {
        request_element_keys()
    }

    fn conformance_classes(
        &self,
        service: &ServiceName,
        version: &ServiceVersion,
    ) -> BTreeSet<String> {
        delete_observation_conformance(service, version)
    }
}

impl Encoder<SosObject, Element> for DeleteObservationEncoder {
    fn encode(
        &self,
        input: &SosObject,
        _ctx: &EncodingContext,
        _nested: &Delegate<'_, SosObject, Element>,
    ) -> Result<Element, EncodingError> {
        let SosObject::DeleteObservationRequest(request) = input else {
            return Err(EncodingError::UnsupportedInput {
                encoder: self.name().to_owned(),
                payload: input.payload_type(),
            });
        };
        if request.observation_identifiers.is_empty() {
            return Err(EncodingError::MissingField {
                payload: input.payload_type(),
                field: "observation".into(),
            });
        }
        let root = Element::new(sosdo("DeleteObservation"))
            .with_attribute(QName::local("service"), request.service.as_str())
            .with_attribute(QName::local("version"), request.version.as_str());
        Ok(request
            .observation_identifiers
            .iter()
            .fold(root, |root, id| {
                root.with_child(Element::new(sosdo("observation")).with_text(id.as_str()))
            }))
    }
}

// ---------------------------------------------------------------------------
// Response encoder and its factory
// ---------------------------------------------------------------------------

/// Writes `sosdo:DeleteObservationResponse` for one SOS version.
#[derive(Debug)]
pub struct DeleteObservationResponseEncoder {
    version: ServiceVersion,
    name: String,
}

impl DeleteObservationResponseEncoder {
    pub fn new(version: ServiceVersion) -> Self {
        let name = format!("delete-observation-response-encoder-{version}");
        Self { version, name }
    }

    pub fn version(&self) -> &ServiceVersion {
        &self.version
    }
}

impl Codec for DeleteObservationResponseEncoder {
    fn name(&self) -> &str {
        &self.name
    }

    fn keys(&self) -> BTreeSet<Key> {
        BTreeSet::from([OperationKey::new(SOS, self.version.clone(), DELETE_OBSERVATION).into()])
    }

    fn conformance_classes(
        &self,
        service: &ServiceName,
        version: &ServiceVersion,
    ) -> BTreeSet<String> {
        if *version == self.version {
            delete_observation_conformance(service, version)
        } else {
            BTreeSet::new()
        }
    }
}

impl Encoder<SosObject, Element> for DeleteObservationResponseEncoder {
    fn encode(
        &self,
        input: &SosObject,
        _ctx: &EncodingContext,
        _nested: &Delegate<'_, SosObject, Element>,
    ) -> Result<Element, EncodingError> {
        let response = match input {
            SosObject::DeleteObservationResponse(response) if response.version == self.version => {
                response
            }
            SosObject::DeleteObservationResponse(response) => {
                return Err(EncodingError::failed(format!(
                    "response for version {} handed to the {} encoder",
                    response.version, self.version
                )))
            }
            other => {
                return Err(EncodingError::UnsupportedInput {
                    encoder: self.name.clone(),
                    payload: other.payload_type(),
                })
            }
        };
        Ok(encode_response(response))
    }
}

fn encode_response(response: &DeleteObservationResponse) -> Element {
    // SOS 1.0.0 responses carry no service/version attributes.
    let mut root = Element::new(sosdo("DeleteObservationResponse"));
    if response.version != SOS_1_0_0 {
        root = root
            .with_attribute(QName::local("service"), SOS.as_str())
            .with_attribute(QName::local("version"), response.version.as_str());
    }
    response.deleted_observations.iter().fold(root, |root, id| {
        root.with_child(Element::new(sosdo("deletedObservation")).with_text(id.as_str()))
    })
}

/// Produces a [`DeleteObservationResponseEncoder`] for SOS DeleteObservation
/// operation keys with version 1.0.0 or 2.0.0.
///
/// Any media type is accepted; the produced encoder emits XML regardless.
#[derive(Debug, Default)]
pub struct DeleteObservationResponseEncoderFactory;

impl DeleteObservationResponseEncoderFactory {
    const VERSIONS: [ServiceVersion; 2] = [SOS_1_0_0, SOS_2_0_0];

    fn version_of(key: &Key) -> Option<&ServiceVersion> {
        let Key::Operation(op) = key else {
            return None;
        };
        let media_type_ok = op
            .media_type()
            .map_or(true, |mt| *mt == MediaType::TEXT_XML || *mt == MediaType::APPLICATION_XML);
        if *op.service() != SOS || *op.operation() != DELETE_OBSERVATION || !media_type_ok {
            return None;
        }
        op.version().filter(|v| Self::VERSIONS.contains(v))
    }
}

impl Factory<dyn Encoder<SosObject, Element>> for DeleteObservationResponseEncoderFactory {
    fn name(&self) -> &str {
        "delete-observation-response-encoder-factory"
    }

    fn supports(&self, key: &Key) -> bool {
        Self::version_of(key).is_some()
    }

    fn produce(&self, key: &Key) -> Option<Arc<dyn Encoder<SosObject, Element>>> {
        let version = Self::version_of(key)?.clone();
        debug!(%version, "producing DeleteObservation response encoder");
        Some(Arc::new(DeleteObservationResponseEncoder::new(version)))
    }

    fn declared_keys(&self) -> BTreeSet<Key> {
        Self::VERSIONS
            .into_iter()
            .map(|version| OperationKey::new(SOS, version, DELETE_OBSERVATION).into())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use coding::MarkupParser;
    use markup::XmlParser;

    use super::*;

    fn parse(xml: &str) -> Element {
        XmlParser::new().parse(xml.as_bytes()).expect("well-formed")
    }

    #[test]
    fn test_decodes_every_observation_identifier() {
        let tree = parse(
            r#"<sosdo:DeleteObservation xmlns:sosdo="http://www.opengis.net/sosdo/1.0" service="SOS" version="2.0.0">
                 <sosdo:observation>o1</sosdo:observation>
                 <sosdo:observation>o2</sosdo:observation>
               </sosdo:DeleteObservation>"#,
        );
        let decoded = DeleteObservationDecoder.decode(&tree).expect("valid request");
        assert_eq!(
            decoded,
            SosObject::DeleteObservationRequest(DeleteObservationRequest {
                service: "SOS".into(),
                version: "2.0.0".into(),
                observation_identifiers: vec!["o1".into(), "o2".into()],
            })
        );
    }

    #[test]
    fn test_request_without_observation_is_invalid() {
        let tree = parse(
            r#"<sosdo:DeleteObservation xmlns:sosdo="http://www.opengis.net/sosdo/1.0" service="SOS" version="2.0.0"/>"#,
        );
        assert!(matches!(
            DeleteObservationDecoder.decode(&tree),
            Err(DecodingError::Invalid { .. })
        ));
    }

    #[test]
    fn test_empty_observation_identifier_is_invalid() {
        let tree = parse(
            r#"<sosdo:DeleteObservation xmlns:sosdo="http://www.opengis.net/sosdo/1.0" service="SOS" version="2.0.0">
                 <sosdo:observation/>
                 <sosdo:observation>o1</sosdo:observation>
               </sosdo:DeleteObservation>"#,
        );
        match DeleteObservationDecoder.decode(&tree) {
            Err(DecodingError::Invalid { message, .. }) => {
                assert!(message.contains("#1"), "{message}")
            }
            other => panic!("expected invalid request, got {other:?}"),
        }
    }

    #[test]
    fn test_other_root_element_is_unsupported() {
        let tree = parse(r#"<GetCapabilities xmlns="http://www.opengis.net/sos/2.0"/>"#);
        assert!(matches!(
            DeleteObservationDecoder.decode(&tree),
            Err(DecodingError::UnsupportedInput { .. })
        ));
    }

    #[test]
    fn test_conformance_reported_for_sos_2_only() {
        assert_eq!(
            DeleteObservationDecoder.conformance_classes(&SOS, &SOS_2_0_0),
            BTreeSet::from([DELETE_OBSERVATION_CONFORMANCE_CLASS.to_owned()])
        );
        assert!(DeleteObservationDecoder
            .conformance_classes(&SOS, &SOS_1_0_0)
            .is_empty());
    }

    #[test]
    fn test_factory_supports_known_versions_only() {
        let factory = DeleteObservationResponseEncoderFactory;
        let key = |version: &'static str| -> Key {
            OperationKey::new(SOS, ServiceVersion::from_static(version), DELETE_OBSERVATION)
                .with_media_type(MediaType::TEXT_XML)
                .into()
        };
        assert!(factory.supports(&key("1.0.0")));
        assert!(factory.supports(&key("2.0.0")));
        assert!(!factory.supports(&key("3.0.0")));
        assert!(!factory.supports(&OperationKey::new(SOS, None, DELETE_OBSERVATION).into()));

        let produced = factory.produce(&key("1.0.0")).expect("supported");
        assert_eq!(produced.name(), "delete-observation-response-encoder-1.0.0");
        assert_eq!(factory.declared_keys().len(), 2);
    }
}
