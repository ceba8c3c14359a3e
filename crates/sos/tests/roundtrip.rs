//! The SOS family wired through a repository, from bytes to objects and back.

use coding::{
    decoder_key_for, Codec, EncodingContext, EncodingError, EncodingOption, Key, MarkupParser,
    MarkupWriter, MatchKind, MediaType, OperationKey, RegistryConfig,
};
use markup::DEFAULT_MAX_DEPTH;
use markup::XmlParser;
use sos::vocabulary::{self, DELETE_OBSERVATION, GET_DATA_AVAILABILITY, SOS, SOS_1_0_0, SOS_2_0_0};
use sos::{
    Count, DataAvailability, DataRecord, DeleteObservationResponse, Field,
    GetDataAvailabilityResponse, Quantity, SosObject, SosRepository, SweComponent, Text,
};

const DELETE_REQUEST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sosdo:DeleteObservation xmlns:sosdo="http://www.opengis.net/sosdo/1.0" service="SOS" version="2.0.0">
  <sosdo:observation>http://example.org/observation/42</sosdo:observation>
</sosdo:DeleteObservation>"#;

fn repository() -> SosRepository {
    sos::repository(RegistryConfig::default()).expect("family keys do not conflict")
}

fn decode(repo: &SosRepository, xml: &str) -> SosObject {
    let tree = XmlParser::new().parse(xml.as_bytes()).expect("well-formed");
    let key = decoder_key_for(&tree).expect("named root");
    repo.decode(&key, &[], &tree).expect("decodes")
}

fn encode(
    repo: &SosRepository,
    object: &SosObject,
    ctx: &EncodingContext,
) -> Result<String, EncodingError> {
    let (query, alternatives) = object.encoder_queries();
    let tree = repo.encode(&query, &alternatives, object, ctx)?;
    let bytes = vocabulary::writer().write(&tree).expect("writable");
    Ok(String::from_utf8(bytes).expect("UTF-8"))
}

fn record() -> SosObject {
    SosObject::Swe(SweComponent::DataRecord(DataRecord {
        definition: Some("urn:ogc:def:dataType:weather".into()),
        fields: vec![
            Field {
                name: "temperature".into(),
                component: SweComponent::Quantity(Quantity {
                    definition: None,
                    uom: "Cel".into(),
                    value: Some(12.5),
                }),
            },
            Field {
                name: "station".into(),
                component: SweComponent::Text(Text {
                    definition: None,
                    value: Some("north & east".into()),
                }),
            },
            Field {
                name: "nested".into(),
                component: SweComponent::DataRecord(DataRecord {
                    definition: None,
                    fields: vec![Field {
                        name: "samples".into(),
                        component: SweComponent::Count(Count {
                            definition: None,
                            value: Some(7),
                        }),
                    }],
                }),
            },
        ],
    }))
}

#[test]
fn delete_observation_request_survives_a_roundtrip() {
    let repo = repository();
    let request = decode(&repo, DELETE_REQUEST);
    let xml = encode(&repo, &request, &EncodingContext::new()).expect("encodes");
    assert_eq!(decode(&repo, &xml), request);
}

#[test]
fn nested_data_record_survives_a_roundtrip() {
    let repo = repository();
    let original = record();
    let xml = encode(&repo, &original, &EncodingContext::new()).expect("encodes");
    assert!(xml.contains("north &amp; east"));
    assert_eq!(decode(&repo, &xml), original);
}

#[test]
fn document_root_option_applies_to_the_outer_element_only() {
    let repo = repository();
    let ctx = EncodingContext::new().with(EncodingOption::AsDocumentRoot);
    let xml = encode(&repo, &record(), &ctx).expect("encodes");
    assert_eq!(xml.matches("xsi:schemaLocation").count(), 1);
}

#[test]
fn empty_data_record_is_a_missing_field() {
    let repo = repository();
    let empty = SosObject::Swe(SweComponent::DataRecord(DataRecord {
        definition: None,
        fields: Vec::new(),
    }));
    let err = encode(&repo, &empty, &EncodingContext::new()).expect_err("no fields");
    assert!(matches!(err, EncodingError::MissingField { .. }));
}

#[test]
fn response_encoder_is_produced_per_version() {
    let repo = repository();
    for (version, expect_version_attribute) in [(SOS_1_0_0, false), (SOS_2_0_0, true)] {
        let response = SosObject::DeleteObservationResponse(DeleteObservationResponse {
            version: version.clone(),
            deleted_observations: vec!["o1".into()],
        });
        let xml = encode(&repo, &response, &EncodingContext::new())
            .expect("factory produces an encoder");
        assert!(xml.contains("<sosdo:deletedObservation>o1</sosdo:deletedObservation>"));
        assert_eq!(xml.contains(r#"version="2.0.0""#), expect_version_attribute, "{version}");
    }
}

#[test]
fn operation_key_with_media_type_finds_media_agnostic_encoder() {
    let repo = repository();
    let query: Key = OperationKey::new(SOS, SOS_2_0_0, GET_DATA_AVAILABILITY)
        .with_media_type(MediaType::APPLICATION_XML)
        .into();
    let resolution = repo.encoders().explain(&query, &[]).expect("wildcard match");
    assert_eq!(resolution.codec.name(), "get-data-availability-encoder");
    assert_eq!(resolution.kind, MatchKind::Similar { distance: 1 });
}

#[test]
fn operation_key_resolves_the_delete_observation_decoder() {
    let repo = repository();
    let query: Key = OperationKey::new(SOS, SOS_2_0_0, DELETE_OBSERVATION)
        .with_media_type(MediaType::TEXT_XML)
        .into();
    assert!(repo.has_decoder(&query, &[]));
}

#[test]
fn invalid_availability_response_surfaces_validation_error() {
    let repo = repository();
    let response = SosObject::GetDataAvailabilityResponse(GetDataAvailabilityResponse {
        members: vec![DataAvailability {
            procedure: "p".into(),
            observed_property: "op".into(),
            feature_of_interest: "f".into(),
            phenomenon_time: None,
        }],
    });
    let err = encode(&repo, &response, &EncodingContext::new())
        .expect_err("phenomenonTime required");
    assert!(matches!(err, EncodingError::Validation(_)));
}

#[test]
fn conformance_classes_union_swe_and_delete_observation() {
    let repo = repository();
    let classes = repo.conformance_classes(&SOS, &SOS_2_0_0);
    assert!(classes.contains(vocabulary::DELETE_OBSERVATION_CONFORMANCE_CLASS));
    assert!(classes.contains("http://www.opengis.net/spec/SWE/2.0/conf/core"));
    assert!(repo.conformance_classes(&SOS, &SOS_1_0_0).is_empty());
}

#[test]
fn decoded_objects_serialise_to_tagged_json() {
    let repo = repository();
    let json = serde_json::to_value(decode(&repo, DELETE_REQUEST)).expect("serialisable");
    assert_eq!(json["type"], "delete_observation_request");
    assert_eq!(json["observation_identifiers"][0], "http://example.org/observation/42");
}

#[test]
fn text_values_keep_surrounding_whitespace() {
    let repo = repository();
    let original = SosObject::Swe(SweComponent::Text(Text {
        definition: None,
        value: Some(" padded\tvalue ".into()),
    }));
    let xml = encode(&repo, &original, &EncodingContext::new()).expect("encodes");
    assert_eq!(decode(&repo, &xml), original);
}

#[test]
fn text_with_control_characters_fails_to_write() {
    let repo = repository();
    let object = SosObject::Swe(SweComponent::Text(Text {
        definition: None,
        value: Some("bell\u{7}".into()),
    }));
    let (query, alternatives) = object.encoder_queries();
    let tree = repo
        .encode(&query, &alternatives, &object, &EncodingContext::new())
        .expect("encodes to a tree");
    assert!(vocabulary::writer().write(&tree).is_err());
}

#[test]
fn deeply_nested_record_is_a_parse_error() {
    let depth = 2 * DEFAULT_MAX_DEPTH;
    let mut xml = String::from(r#"<swe:DataRecord xmlns:swe="http://www.opengis.net/swe/2.0">"#);
    for _ in 0..depth {
        xml.push_str(r#"<swe:field name="f"><swe:DataRecord>"#);
    }
    for _ in 0..depth {
        xml.push_str("</swe:DataRecord></swe:field>");
    }
    xml.push_str("</swe:DataRecord>");

    let err = XmlParser::new().parse(xml.as_bytes()).expect_err("nesting limit");
    assert!(err.message.contains("nesting"), "{}", err.message);
}
