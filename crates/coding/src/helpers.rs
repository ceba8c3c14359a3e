//! Shorthand for building the key sets codecs commonly declare.

use std::collections::BTreeSet;

use crate::{
    Key, MediaType, Namespace, NamespaceTypeKey, OperationKey, OperationName, Payload,
    PayloadType, QualifiedNode, ServiceName, ServiceVersion,
};

/// One namespace-type key per payload type, all in `namespace`.
pub fn keys_for_elements<I>(namespace: &Namespace, payload_types: I) -> BTreeSet<Key>
where
    I: IntoIterator<Item = PayloadType>,
{
    payload_types
        .into_iter()
        .map(|payload_type| NamespaceTypeKey::new(namespace.clone(), payload_type).into())
        .collect()
}

/// Operation keys for each operation bound to both XML media types.
pub fn xml_keys_for_operations<I>(
    service: &ServiceName,
    version: &ServiceVersion,
    operations: I,
) -> BTreeSet<Key>
where
    I: IntoIterator<Item = OperationName>,
{
    operations
        .into_iter()
        .flat_map(|operation| {
            let key = OperationKey::new(service.clone(), version.clone(), operation);
            [MediaType::TEXT_XML, MediaType::APPLICATION_XML]
                .map(|media_type| Key::from(key.clone().with_media_type(media_type)))
        })
        .collect()
}

/// An operation key with no media type, matching any media type at distance 1.
pub fn operation_key(
    service: &ServiceName,
    version: impl Into<Option<ServiceVersion>>,
    operation: &OperationName,
) -> Key {
    OperationKey::new(service.clone(), version, operation.clone()).into()
}

/// The key a decoder for `node` is registered under.
///
/// Returns `None` if the node has an empty local name.
pub fn decoder_key_for(node: &impl QualifiedNode) -> Option<Key> {
    let payload_type = PayloadType::element(node.local_name())?;
    let namespace = node.namespace().and_then(Namespace::new);
    Some(NamespaceTypeKey::new(namespace, payload_type).into())
}

/// The key an encoder for `payload` is registered under.
pub fn encoder_key_for(namespace: &Namespace, payload: &impl Payload) -> Key {
    NamespaceTypeKey::new(namespace.clone(), payload.payload_type()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Node(Option<&'static str>, &'static str);

    impl QualifiedNode for Node {
        fn namespace(&self) -> Option<&str> {
            self.0
        }

        fn local_name(&self) -> &str {
            self.1
        }
    }

    #[test]
    fn test_xml_keys_cover_both_media_types() {
        let keys = xml_keys_for_operations(
            &ServiceName::from_static("SOS"),
            &ServiceVersion::from_static("2.0.0"),
            [
                OperationName::from_static("DeleteObservation"),
                OperationName::from_static("GetDataAvailability"),
            ],
        );
        assert_eq!(keys.len(), 4);
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert!(rendered.contains(&"SOS/2.0.0/DeleteObservation [text/xml]".to_owned()));
        assert!(rendered.contains(&"SOS/2.0.0/GetDataAvailability [application/xml]".to_owned()));
    }

    #[test]
    fn test_decoder_key_uses_namespace_and_local_name() {
        let key = decoder_key_for(&Node(Some("urn:sos"), "DeleteObservation")).expect("named");
        assert_eq!(
            key,
            Key::from(NamespaceTypeKey::new(
                Namespace::from_static("urn:sos"),
                PayloadType::from_static("DeleteObservation"),
            ))
        );
    }

    #[test]
    fn test_decoder_key_without_namespace_is_wildcard() {
        let key = decoder_key_for(&Node(None, "Quantity")).expect("named");
        assert_eq!(
            key,
            Key::from(NamespaceTypeKey::any_namespace(PayloadType::from_static("Quantity")))
        );
        assert!(decoder_key_for(&Node(Some("urn:swe"), "")).is_none());
    }

    #[test]
    fn test_element_keys_share_the_namespace() {
        let ns = Namespace::from_static("urn:swe");
        let keys = keys_for_elements(
            &ns,
            [PayloadType::from_static("Quantity"), PayloadType::from_static("Count")],
        );
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|key| matches!(
            key,
            Key::NamespaceType(k) if k.namespace() == Some(&ns)
        )));
    }
}
