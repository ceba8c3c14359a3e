//! Namespaces, operation names and conformance class URIs.

use coding::{Namespace, OperationName, ServiceName, ServiceVersion};

pub const SOS: ServiceName = ServiceName::from_static("SOS");
pub const SOS_1_0_0: ServiceVersion = ServiceVersion::from_static("1.0.0");
pub const SOS_2_0_0: ServiceVersion = ServiceVersion::from_static("2.0.0");

pub const DELETE_OBSERVATION: OperationName = OperationName::from_static("DeleteObservation");
pub const GET_DATA_AVAILABILITY: OperationName = OperationName::from_static("GetDataAvailability");

pub const NS_SWE_20: Namespace = Namespace::from_static("http://www.opengis.net/swe/2.0");
pub const NS_SOSDO_10: Namespace = Namespace::from_static("http://www.opengis.net/sosdo/1.0");
pub const NS_GDA_10: Namespace = Namespace::from_static("http://www.opengis.net/sosgda/1.0");
pub const NS_GML_32: &str = "http://www.opengis.net/gml/3.2";
pub const NS_XLINK: &str = "http://www.w3.org/1999/xlink";
pub const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

pub const SWE_20_SCHEMA_LOCATION: &str =
    "http://www.opengis.net/swe/2.0 http://schemas.opengis.net/sweCommon/2.0/swe.xsd";

pub const SWE_CONFORMANCE_CLASSES: [&str; 5] = [
    "http://www.opengis.net/spec/SWE/2.0/conf/core",
    "http://www.opengis.net/spec/SWE/2.0/conf/uml-simple-components",
    "http://www.opengis.net/spec/SWE/2.0/conf/uml-record-components",
    "http://www.opengis.net/spec/SWE/2.0/conf/xsd-simple-components",
    "http://www.opengis.net/spec/SWE/2.0/conf/xsd-record-components",
];

pub const DELETE_OBSERVATION_CONFORMANCE_CLASS: &str =
    "http://www.opengis.net/spec/SOS/2.0/conf/deleteObservation";

/// Prefixes used when writing documents of this family.
pub fn writer() -> markup::XmlWriter {
    markup::XmlWriter::new()
        .with_prefix(NS_SWE_20.as_str(), "swe")
        .with_prefix(NS_SOSDO_10.as_str(), "sosdo")
        .with_prefix(NS_GDA_10.as_str(), "gda")
        .with_prefix(NS_GML_32, "gml")
        .with_prefix(NS_XLINK, "xlink")
        .with_prefix(NS_XSI, "xsi")
}

/// Returns `true` for SOS 2.0.0, the only version these codecs conform to.
pub(crate) fn is_sos_2(service: &ServiceName, version: &ServiceVersion) -> bool {
    *service == SOS && *version == SOS_2_0_0
}
