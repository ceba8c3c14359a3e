//! GetDataAvailability response encoder.

use std::collections::BTreeSet;

use coding::{
    keys_for_elements, operation_key, Codec, Delegate, Encoder, EncodingContext, EncodingError,
    Key, Payload, PayloadType, SchemaValidator,
};
use markup::{Element, QName, SchemaRules};
use tracing::debug;

use crate::model::{DataAvailability, GetDataAvailabilityResponse, SosObject, TimePeriod};
use crate::vocabulary::{GET_DATA_AVAILABILITY, NS_GDA_10, NS_GML_32, NS_XLINK, SOS, SOS_2_0_0};

fn gda(local: &str) -> QName {
    QName::new(NS_GDA_10.as_str(), local)
}

fn gml(local: &str) -> QName {
    QName::new(NS_GML_32, local)
}

fn href(element: QName, target: &str) -> Element {
    Element::new(element).with_attribute(QName::new(NS_XLINK, "href"), target)
}

/// Writes `gda:GetDataAvailabilityResponse` documents and checks them against
/// the structural rules of the GDA 1.0 schema before returning.
///
/// Registered under the SOS 2.0.0 operation key without a media type, so it
/// answers queries for any media type.
#[derive(Debug)]
pub struct GetDataAvailabilityEncoder {
    rules: SchemaRules,
}

impl GetDataAvailabilityEncoder {
    pub fn new() -> Self {
        let member = gda("dataAvailabilityMember");
        let rules = ["procedure", "observedProperty", "featureOfInterest", "phenomenonTime"]
            .into_iter()
            .fold(SchemaRules::new(), |rules, child| {
                rules.require_child(member.clone(), gda(child))
            })
            .require_attribute(member, gml("id"))
            .require_child(gml("TimePeriod"), gml("beginPosition"))
            .require_child(gml("TimePeriod"), gml("endPosition"));
        Self { rules }
    }
}

impl Default for GetDataAvailabilityEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Codec for GetDataAvailabilityEncoder {
    fn name(&self) -> &str {
        "get-data-availability-encoder"
    }

    fn keys(&self) -> BTreeSet<Key> {
        let mut keys = keys_for_elements(
            &NS_GDA_10,
            [PayloadType::from_static("GetDataAvailabilityResponse")],
        );
        keys.insert(operation_key(&SOS, SOS_2_0_0, &GET_DATA_AVAILABILITY));
        keys
    }
}

impl Encoder<SosObject, Element> for GetDataAvailabilityEncoder {
    fn encode(
        &self,
        input: &SosObject,
        _ctx: &EncodingContext,
        _nested: &Delegate<'_, SosObject, Element>,
    ) -> Result<Element, EncodingError> {
        let SosObject::GetDataAvailabilityResponse(response) = input else {
            return Err(EncodingError::UnsupportedInput {
                encoder: self.name().to_owned(),
                payload: input.payload_type(),
            });
        };
        let document = encode_response(response);
        self.rules.validate(&document)?;
        debug!(members = response.members.len(), "encoded GetDataAvailability response");
        Ok(document)
    }
}

fn encode_response(response: &GetDataAvailabilityResponse) -> Element {
    response
        .members
        .iter()
        .enumerate()
        .fold(Element::new(gda("GetDataAvailabilityResponse")), |root, (i, member)| {
            root.with_child(encode_member(i + 1, member))
        })
}

fn encode_member(n: usize, member: &DataAvailability) -> Element {
    let element = Element::new(gda("dataAvailabilityMember"))
        .with_attribute(gml("id"), format!("dam_{n}"))
        .with_child(href(gda("procedure"), &member.procedure))
        .with_child(href(gda("observedProperty"), &member.observed_property))
        .with_child(href(gda("featureOfInterest"), &member.feature_of_interest));
    match &member.phenomenon_time {
        Some(period) => element.with_child(
            Element::new(gda("phenomenonTime")).with_child(encode_period(n, period)),
        ),
        None => element,
    }
}

fn encode_period(n: usize, period: &TimePeriod) -> Element {
    Element::new(gml("TimePeriod"))
        .with_attribute(gml("id"), format!("tp_{n}"))
        .with_child(Element::new(gml("beginPosition")).with_text(period.begin.as_str()))
        .with_child(Element::new(gml("endPosition")).with_text(period.end.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(period: Option<TimePeriod>) -> DataAvailability {
        DataAvailability {
            procedure: "http://example.org/procedure/1".into(),
            observed_property: "http://example.org/property/temp".into(),
            feature_of_interest: "http://example.org/feature/lake".into(),
            phenomenon_time: period,
        }
    }

    #[test]
    fn test_members_get_sequential_gml_ids() {
        let response = GetDataAvailabilityResponse {
            members: vec![
                member(Some(TimePeriod {
                    begin: "2024-01-01T00:00:00Z".into(),
                    end: "2024-02-01T00:00:00Z".into(),
                })),
                member(Some(TimePeriod {
                    begin: "2024-03-01T00:00:00Z".into(),
                    end: "2024-04-01T00:00:00Z".into(),
                })),
            ],
        };
        let document = encode_response(&response);
        let ids: Vec<_> = document
            .elements()
            .filter_map(|m| m.attribute(&gml("id")))
            .collect();
        assert_eq!(ids, ["dam_1", "dam_2"]);
        assert_eq!(GetDataAvailabilityEncoder::new().rules.validate(&document), Ok(()));
    }

    #[test]
    fn test_member_without_phenomenon_time_fails_validation() {
        let document = encode_response(&GetDataAvailabilityResponse {
            members: vec![member(None)],
        });
        let err = GetDataAvailabilityEncoder::new()
            .rules
            .validate(&document)
            .expect_err("phenomenonTime is required");
        assert!(err.message.contains("phenomenonTime"));
    }

    #[test]
    fn test_keys_combine_element_and_wildcard_media_operation() {
        let keys = GetDataAvailabilityEncoder::new().keys();
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().any(|key| match key {
            Key::Operation(op) => {
                op.media_type().is_none() && op.operation() == &GET_DATA_AVAILABILITY
            }
            _ => false,
        }));
    }
}
