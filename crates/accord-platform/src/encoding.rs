//! Body encoding helpers.
//!
//! Serverless gateways carry bodies inside JSON documents, so binary payloads
//! travel as base64 strings next to an `isBase64Encoded` flag. Whether a body
//! counts as text is decided from its content type.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;

use crate::PlatformResult;

/// Encodes any byte buffer as standard base64.
///
/// ```rust
/// use accord_platform::bytes_to_base64;
///
/// assert_eq!(bytes_to_base64(b"hi"), "aGk=");
/// assert_eq!(bytes_to_base64(Vec::<u8>::new()), "");
/// ```
#[must_use]
pub fn bytes_to_base64(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Decodes standard base64 into bytes.
pub fn base64_to_bytes(encoded: &str) -> PlatformResult<Bytes> {
    Ok(Bytes::from(STANDARD.decode(encoded.trim())?))
}

/// Returns true if a body with this content type can be carried verbatim as
/// a string.
///
/// Text types (`text/*`), JSON, XML, JavaScript, form-urlencoded bodies and
/// any `+json`/`+xml` structured syntax suffix count as text. Everything
/// else, including a missing content type, is binary.
///
/// ```rust
/// use accord_platform::is_text_content_type;
///
/// assert!(is_text_content_type("application/json; charset=utf-8"));
/// assert!(is_text_content_type("application/problem+json"));
/// assert!(is_text_content_type("text/csv"));
/// assert!(!is_text_content_type("image/png"));
/// ```
#[must_use]
pub fn is_text_content_type(content_type: &str) -> bool {
    let Ok(parsed) = content_type.trim().parse::<mime::Mime>() else {
        return content_type.trim_start().starts_with("text/");
    };

    if parsed.type_() == mime::TEXT {
        return true;
    }
    if matches!(parsed.suffix(), Some(suffix) if suffix == mime::JSON || suffix == mime::XML) {
        return true;
    }
    parsed.type_() == mime::APPLICATION
        && matches!(
            parsed.subtype().as_str(),
            "json" | "xml" | "javascript" | "x-www-form-urlencoded" | "graphql"
        )
}

/// A body prepared for a JSON-carried transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBody {
    /// Body text, either verbatim or base64.
    pub body: String,
    /// Whether `body` is base64.
    pub is_base64_encoded: bool,
}

/// Chooses between a verbatim string and base64 for an outbound body.
///
/// Bytes with a text content type that are valid UTF-8 are emitted
/// verbatim; everything else is base64.
#[must_use]
pub fn encode_for_transport(bytes: &[u8], content_type: Option<&str>) -> EncodedBody {
    if bytes.is_empty() {
        return EncodedBody {
            body: String::new(),
            is_base64_encoded: false,
        };
    }

    if content_type.is_some_and(is_text_content_type) {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return EncodedBody {
                body: text.to_string(),
                is_base64_encoded: false,
            };
        }
    }

    EncodedBody {
        body: bytes_to_base64(bytes),
        is_base64_encoded: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_payload_round_trip() {
        let encoded = bytes_to_base64(Bytes::new());
        assert_eq!(encoded, "");
        assert!(base64_to_bytes(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_base64() {
        assert!(base64_to_bytes("not base64!").is_err());
    }

    #[test]
    fn test_text_detection() {
        assert!(is_text_content_type("text/html"));
        assert!(is_text_content_type("application/xml"));
        assert!(is_text_content_type("application/javascript"));
        assert!(is_text_content_type("application/x-www-form-urlencoded"));
        assert!(is_text_content_type("application/vnd.api+json"));
        assert!(!is_text_content_type("application/octet-stream"));
        assert!(!is_text_content_type("application/pdf"));
        assert!(!is_text_content_type("multipart/form-data; boundary=x"));
    }

    #[test]
    fn test_encode_for_transport() {
        let text = encode_for_transport(b"{\"a\":1}", Some("application/json"));
        assert_eq!(text.body, "{\"a\":1}");
        assert!(!text.is_base64_encoded);

        let binary = encode_for_transport(&[0, 159, 146, 150], Some("image/png"));
        assert!(binary.is_base64_encoded);
        assert_eq!(base64_to_bytes(&binary.body).unwrap().as_ref(), &[0, 159, 146, 150]);

        let untyped = encode_for_transport(b"abc", None);
        assert!(untyped.is_base64_encoded);

        let invalid_text = encode_for_transport(&[0xff], Some("text/plain"));
        assert!(invalid_text.is_base64_encoded);

        let empty = encode_for_transport(&[], Some("image/png"));
        assert!(!empty.is_base64_encoded);
        assert!(empty.body.is_empty());
    }

    proptest! {
        #[test]
        fn prop_base64_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            let encoded = bytes_to_base64(&bytes);
            let decoded = base64_to_bytes(&encoded).unwrap();
            prop_assert_eq!(decoded.as_ref(), bytes.as_slice());
        }
    }
}
