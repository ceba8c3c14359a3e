//! SWE Common 2.0 data components.
//!
//! Data records encode their fields by delegating each field's component back
//! into the encoder registry, so a record may hold components handled by any
//! registered encoder. Decoding is self-contained.

use std::collections::BTreeSet;

use coding::{
    keys_for_elements, Codec, Decoder, DecodingError, Delegate, Encoder, EncodingContext,
    EncodingError, EncodingOption, Key, PayloadType, ServiceName, ServiceVersion,
};
use markup::{Element, QName};
use tracing::debug;

use crate::model::{Boolean, Count, DataRecord, Field, Quantity, SosObject, SweComponent, Text};
use crate::vocabulary::{
    is_sos_2, NS_SWE_20, NS_XSI, SWE_20_SCHEMA_LOCATION, SWE_CONFORMANCE_CLASSES,
};

const COMPONENTS: [&str; 5] = ["Quantity", "Count", "Boolean", "Text", "DataRecord"];

fn swe_keys() -> BTreeSet<Key> {
    keys_for_elements(&NS_SWE_20, COMPONENTS.map(PayloadType::from_static))
}

fn swe(local: &str) -> QName {
    QName::new(NS_SWE_20.as_str(), local)
}

fn swe_conformance(service: &ServiceName, version: &ServiceVersion) -> BTreeSet<String> {
    if is_sos_2(service, version) {
        SWE_CONFORMANCE_CLASSES.iter().map(|c| (*c).to_owned()).collect()
    } else {
        BTreeSet::new()
    }
}

// ---------------------------------------------------------------------------
// Encoder
// ---------------------------------------------------------------------------

/// Writes [`SweComponent`]s as SWE Common 2.0 elements.
///
/// Honours [`EncodingOption::AsDocumentRoot`] (adds the schema location) and
/// [`EncodingOption::AsPropertyType`] (wraps the component in a
/// `swe:<Name>Property` element). Neither option is passed on to fields.
#[derive(Debug, Default)]
pub struct SweCommonEncoder;

impl Codec for SweCommonEncoder {
    fn name(&self) -> &str {
        "swe-common-2.0-encoder"
    }

    fn keys(&self) -> BTreeSet<Key> {
        swe_keys()
    }

    fn conformance_classes(
        &self,
        service: &ServiceName,
        version: &ServiceVersion,
    ) -> BTreeSet<String> {
        swe_conformance(service, version)
    }
}

impl Encoder<SosObject, Element> for SweCommonEncoder {
    fn encode(
        &self,
        input: &SosObject,
        ctx: &EncodingContext,
        nested: &Delegate<'_, SosObject, Element>,
    ) -> Result<Element, EncodingError> {
        let SosObject::Swe(component) = input else {
            return Err(EncodingError::UnsupportedInput {
                encoder: self.name().to_owned(),
                payload: coding::Payload::payload_type(input),
            });
        };

        let mut element = match component {
            SweComponent::Quantity(quantity) => encode_quantity(quantity),
            SweComponent::Count(count) => {
                with_value(Element::new(swe("Count")), count.value.map(|v| v.to_string()))
            }
            SweComponent::Boolean(boolean) => {
                with_value(Element::new(swe("Boolean")), boolean.value.map(|v| v.to_string()))
            }
            SweComponent::Text(text) => {
                with_value(Element::new(swe("Text")), text.value.clone())
            }
            SweComponent::DataRecord(record) => encode_record(record, ctx, nested)?,
        };
        if let Some(definition) = component.definition() {
            element = element.with_attribute(QName::local("definition"), definition);
        }

        if ctx.has(&EncodingOption::AsDocumentRoot) {
            element = element
                .with_attribute(QName::new(NS_XSI, "schemaLocation"), SWE_20_SCHEMA_LOCATION);
        }
        if ctx.has(&EncodingOption::AsPropertyType) {
            let wrapper = format!("{}Property", component.element_name());
            element = Element::new(swe(&wrapper)).with_child(element);
        }
        Ok(element)
    }
}

fn encode_quantity(quantity: &Quantity) -> Element {
    let uom = Element::new(swe("uom")).with_attribute(QName::local("code"), quantity.uom.as_str());
    with_value(
        Element::new(swe("Quantity")).with_child(uom),
        quantity.value.map(|v| v.to_string()),
    )
}

fn with_value(element: Element, value: Option<String>) -> Element {
    match value {
        Some(value) => element.with_child(Element::new(swe("value")).with_text(value)),
        None => element,
    }
}

fn encode_record(
    record: &DataRecord,
    ctx: &EncodingContext,
    nested: &Delegate<'_, SosObject, Element>,
) -> Result<Element, EncodingError> {
    if record.fields.is_empty() {
        return Err(EncodingError::MissingField {
            payload: PayloadType::from_static("DataRecord"),
            field: "field".into(),
        });
    }
    let field_ctx = ctx
        .without(&EncodingOption::AsDocumentRoot)
        .without(&EncodingOption::AsPropertyType);

    let mut element = Element::new(swe("DataRecord"));
    for field in &record.fields {
        let object = SosObject::Swe(field.component.clone());
        let (query, alternatives) = object.encoder_queries();
        let encoded = nested.encode(&query, &alternatives, &object, &field_ctx)?;
        element = element.with_child(
            Element::new(swe("field"))
                .with_attribute(QName::local("name"), field.name.as_str())
                .with_child(encoded),
        );
    }
    Ok(element)
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// Reads SWE Common 2.0 component elements.
#[derive(Debug, Default)]
pub struct SweCommonDecoder;

impl Codec for SweCommonDecoder {
    fn name(&self) -> &str {
        "swe-common-2.0-decoder"
    }

    fn keys(&self) -> BTreeSet<Key> {
        swe_keys()
    }

    fn conformance_classes(
        &self,
        service: &ServiceName,
        version: &ServiceVersion,
    ) -> BTreeSet<String> {
        swe_conformance(service, version)
    }
}

impl Decoder<Element, SosObject> for SweCommonDecoder {
    fn decode(&self, input: &Element) -> Result<SosObject, DecodingError> {
        if !is_component(input) {
            return Err(DecodingError::UnsupportedInput {
                decoder: self.name().to_owned(),
                input: input.name().to_string(),
            });
        }
        let component = decode_component(input)?;
        debug!(component = component.element_name(), "decoded SWE component");
        Ok(SosObject::Swe(component))
    }
}

fn is_component(element: &Element) -> bool {
    let name = element.name();
    name.namespace() == Some(NS_SWE_20.as_str()) && COMPONENTS.contains(&name.local_name())
}

/// Decodes a component the caller has already accepted. Unknown elements met
/// below the root are invalid content, not a dispatch mismatch.
fn decode_component(element: &Element) -> Result<SweComponent, DecodingError> {
    let name = element.name();
    if !is_component(element) {
        return Err(DecodingError::invalid(format!("{name} is not a SWE Common 2.0 component")));
    }
    let definition = element
        .attribute(&QName::local("definition"))
        .map(str::to_owned);

    let component = match name.local_name() {
        "Quantity" => {
            let uom = element
                .child(Some(NS_SWE_20.as_str()), "uom")
                .ok_or_else(|| missing(element, "uom"))?;
            let code = uom
                .attribute(&QName::local("code"))
                .ok_or_else(|| DecodingError::invalid("swe:uom has no code attribute"))?;
            SweComponent::Quantity(Quantity {
                definition,
                uom: code.to_owned(),
                value: parse_value(element)?,
            })
        }
        "Count" => SweComponent::Count(Count {
            definition,
            value: parse_value(element)?,
        }),
        "Boolean" => SweComponent::Boolean(Boolean {
            definition,
            value: parse_value(element)?,
        }),
        "Text" => SweComponent::Text(Text {
            definition,
            value: value_text(element),
        }),
        "DataRecord" => {
            let fields = element
                .children_named(Some(NS_SWE_20.as_str()), "field")
                .map(decode_field)
                .collect::<Result<Vec<_>, _>>()?;
            if fields.is_empty() {
                return Err(missing(element, "field"));
            }
            SweComponent::DataRecord(DataRecord { definition, fields })
        }
        other => {
            return Err(DecodingError::invalid(format!("unhandled SWE component '{other}'")))
        }
    };
    Ok(component)
}

fn decode_field(field: &Element) -> Result<Field, DecodingError> {
    let name = field
        .attribute(&QName::local("name"))
        .ok_or_else(|| DecodingError::invalid("swe:field has no name attribute"))?;
    let inner = field.elements().next().ok_or_else(|| missing(field, "component"))?;
    let component = decode_component(inner).map_err(|err| match err {
        DecodingError::MissingElement { .. } => err,
        other => DecodingError::with_cause(format!("swe:field '{name}' is invalid"), other),
    })?;
    Ok(Field {
        name: name.to_owned(),
        component,
    })
}

fn value_text(element: &Element) -> Option<String> {
    element
        .child(Some(NS_SWE_20.as_str()), "value")
        .map(Element::text)
}

fn parse_value<T>(element: &Element) -> Result<Option<T>, DecodingError>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value_text(element)
        .map(|text| {
            text.trim().parse::<T>().map_err(|err| {
                DecodingError::with_cause(
                    format!("invalid value '{text}' in {}", element.name()),
                    err,
                )
            })
        })
        .transpose()
}

fn missing(parent: &Element, element: &str) -> DecodingError {
    DecodingError::MissingElement {
        parent: parent.name().to_string(),
        element: element.to_owned(),
    }
}
