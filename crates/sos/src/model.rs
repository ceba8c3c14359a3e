//! Domain objects handled by this codec family.
//!
//! [`SosObject`] is a closed sum type over every shape the family encodes or
//! decodes. Dispatch from a value to its encoder goes through
//! [`SosObject::encoder_queries`].

use coding::{encoder_key_for, Key, Namespace, OperationKey, Payload, PayloadType};
use serde::Serialize;

use crate::vocabulary::{DELETE_OBSERVATION, NS_GDA_10, NS_SOSDO_10, NS_SWE_20, SOS};

/// Any object this family can encode or decode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SosObject {
    DeleteObservationRequest(DeleteObservationRequest),
    DeleteObservationResponse(DeleteObservationResponse),
    GetDataAvailabilityResponse(GetDataAvailabilityResponse),
    Swe(SweComponent),
}

impl SosObject {
    /// Namespace of the element this object is written as.
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::DeleteObservationRequest(_) | Self::DeleteObservationResponse(_) => NS_SOSDO_10,
            Self::GetDataAvailabilityResponse(_) => NS_GDA_10,
            Self::Swe(_) => NS_SWE_20,
        }
    }

    /// The key and fallbacks to resolve an encoder for this object with.
    ///
    /// Responses fall back to their operation key, which version-specific
    /// encoders are produced for on demand.
    pub fn encoder_queries(&self) -> (Key, Vec<Key>) {
        let key = encoder_key_for(&self.namespace(), self);
        let alternatives = match self {
            Self::DeleteObservationResponse(response) => {
                vec![OperationKey::new(SOS, response.version.clone(), DELETE_OBSERVATION).into()]
            }
            _ => Vec::new(),
        };
        (key, alternatives)
    }
}

impl Payload for SosObject {
    fn payload_type(&self) -> PayloadType {
        match self {
            Self::DeleteObservationRequest(_) => PayloadType::from_static("DeleteObservation"),
            Self::DeleteObservationResponse(_) => {
                PayloadType::from_static("DeleteObservationResponse")
            }
            Self::GetDataAvailabilityResponse(_) => {
                PayloadType::from_static("GetDataAvailabilityResponse")
            }
            Self::Swe(component) => component.payload_type(),
        }
    }
}

impl From<SweComponent> for SosObject {
    fn from(component: SweComponent) -> Self {
        Self::Swe(component)
    }
}

// ---------------------------------------------------------------------------
// DeleteObservation
// ---------------------------------------------------------------------------

/// Request to delete one or more observations by identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteObservationRequest {
    pub service: String,
    pub version: String,
    /// Never empty once decoded.
    pub observation_identifiers: Vec<String>,
}

/// Acknowledges deleted observations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteObservationResponse {
    pub version: coding::ServiceVersion,
    pub deleted_observations: Vec<String>,
}

// ---------------------------------------------------------------------------
// GetDataAvailability
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GetDataAvailabilityResponse {
    pub members: Vec<DataAvailability>,
}

/// Which procedure observed which property of which feature, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataAvailability {
    pub procedure: String,
    pub observed_property: String,
    pub feature_of_interest: String,
    /// Required in the encoded document; `None` fails validation.
    pub phenomenon_time: Option<TimePeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimePeriod {
    pub begin: String,
    pub end: String,
}

// ---------------------------------------------------------------------------
// SWE Common 2.0
// ---------------------------------------------------------------------------

/// A SWE Common data component.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "component", rename_all = "snake_case")]
pub enum SweComponent {
    Quantity(Quantity),
    Count(Count),
    Boolean(Boolean),
    Text(Text),
    DataRecord(DataRecord),
}

impl SweComponent {
    /// Local name of the element this component is written as.
    pub fn element_name(&self) -> &'static str {
        match self {
            Self::Quantity(_) => "Quantity",
            Self::Count(_) => "Count",
            Self::Boolean(_) => "Boolean",
            Self::Text(_) => "Text",
            Self::DataRecord(_) => "DataRecord",
        }
    }

    pub fn definition(&self) -> Option<&str> {
        match self {
            Self::Quantity(c) => c.definition.as_deref(),
            Self::Count(c) => c.definition.as_deref(),
            Self::Boolean(c) => c.definition.as_deref(),
            Self::Text(c) => c.definition.as_deref(),
            Self::DataRecord(c) => c.definition.as_deref(),
        }
    }
}

impl Payload for SweComponent {
    fn payload_type(&self) -> PayloadType {
        PayloadType::from_static(self.element_name())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub definition: Option<String>,
    /// Unit of measure code, e.g. `"Cel"`.
    pub uom: String,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Count {
    pub definition: Option<String>,
    pub value: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Boolean {
    pub definition: Option<String>,
    pub value: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Text {
    pub definition: Option<String>,
    pub value: Option<String>,
}

/// A named group of components; must hold at least one field when encoded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataRecord {
    pub definition: Option<String>,
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub component: SweComponent,
}
