//! Extraction of the `google.api.http` method option.
//!
//! prost decodes `MethodOptions` into a struct without extension fields, so
//! the binding is recovered from the raw option bytes kept by
//! [`crate::descriptor::PluginRequest`].

use prost::DecodeError;
use prost::Message;

/// Field number of the `google.api.http` extension of `MethodOptions`.
pub const HTTP_EXTENSION_TAG: u32 = 72295728;

/// `google.api.HttpRule`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HttpRule {
    #[prost(string, tag = "1")]
    pub selector: ::prost::alloc::string::String,
    #[prost(string, tag = "7")]
    pub body: ::prost::alloc::string::String,
    #[prost(string, tag = "12")]
    pub response_body: ::prost::alloc::string::String,
    #[prost(message, repeated, tag = "11")]
    pub additional_bindings: ::prost::alloc::vec::Vec<HttpRule>,
    #[prost(oneof = "http_rule::Pattern", tags = "2, 3, 4, 5, 6, 8")]
    pub pattern: ::core::option::Option<http_rule::Pattern>,
}

/// Nested message and enum types in `HttpRule`.
pub mod http_rule {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Pattern {
        #[prost(string, tag = "2")]
        Get(::prost::alloc::string::String),
        #[prost(string, tag = "3")]
        Put(::prost::alloc::string::String),
        #[prost(string, tag = "4")]
        Post(::prost::alloc::string::String),
        #[prost(string, tag = "5")]
        Delete(::prost::alloc::string::String),
        #[prost(string, tag = "6")]
        Patch(::prost::alloc::string::String),
        #[prost(message, tag = "8")]
        Custom(super::CustomHttpPattern),
    }
}

/// `google.api.CustomHttpPattern`
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CustomHttpPattern {
    #[prost(string, tag = "1")]
    pub kind: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub path: ::prost::alloc::string::String,
}

/// The slice of `google.protobuf.MethodOptions` this plugin cares about.
#[derive(Clone, PartialEq, ::prost::Message)]
struct MethodOptionsExtensions {
    #[prost(bytes = "vec", optional, tag = "72295728")]
    http: ::core::option::Option<::prost::alloc::vec::Vec<u8>>,
}

impl HttpRule {
    /// Returns the HTTP verb and the URL template of this rule, e.g.
    /// `("GET", "/v1/people/{id}")`.
    pub fn binding(&self) -> Option<(String, &str)> {
        use http_rule::Pattern;

        let (verb, path) = match self.pattern.as_ref()? {
            Pattern::Get(path) => ("GET".to_string(), path),
            Pattern::Put(path) => ("PUT".to_string(), path),
            Pattern::Post(path) => ("POST".to_string(), path),
            Pattern::Delete(path) => ("DELETE".to_string(), path),
            Pattern::Patch(path) => ("PATCH".to_string(), path),
            Pattern::Custom(custom) => (custom.kind.to_uppercase(), &custom.path),
        };
        Some((verb, path.as_str()))
    }

    /// Encodes this rule as raw `MethodOptions` bytes carrying the
    /// `google.api.http` extension.
    pub fn into_method_options(self) -> Vec<u8> {
        MethodOptionsExtensions {
            http: Some(self.encode_to_vec()),
        }
        .encode_to_vec()
    }
}

/// Pulls the `google.api.http` binding out of raw `MethodOptions` bytes.
///
/// Returns `Ok(None)` when the method has no options or the extension is not
/// set, and an error when the extension is present but is not an `HttpRule`.
pub fn extract_http_rule(raw_options: Option<&[u8]>) -> Result<Option<HttpRule>, DecodeError> {
    let Some(raw_options) = raw_options else {
        return Ok(None);
    };
    match MethodOptionsExtensions::decode(raw_options)?.http {
        Some(http) => HttpRule::decode(http.as_slice()).map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::http_rule::Pattern;
    use super::*;

    pub(crate) fn get(path: &str) -> HttpRule {
        HttpRule {
            pattern: Some(Pattern::Get(path.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn no_options() {
        assert_eq!(None, extract_http_rule(None).unwrap());
    }

    #[test]
    fn options_without_extension() {
        // deprecated = true (field 33, varint)
        let raw = [0x88, 0x02, 0x01];
        assert_eq!(None, extract_http_rule(Some(&raw)).unwrap());
    }

    #[test]
    fn extension_present() {
        let raw = get("/v1/people").into_method_options();
        let rule = extract_http_rule(Some(&raw)).unwrap().unwrap();
        assert_eq!(Some(("GET".to_string(), "/v1/people")), rule.binding());
    }

    #[test]
    fn extension_with_unexpected_wire_type() {
        // field 72295728 encoded as a varint instead of a message
        let mut raw = Vec::new();
        prost::encoding::encode_key(
            HTTP_EXTENSION_TAG,
            prost::encoding::WireType::Varint,
            &mut raw,
        );
        prost::encoding::encode_varint(1, &mut raw);
        assert!(extract_http_rule(Some(&raw)).is_err());
    }

    #[test]
    fn extension_with_malformed_payload() {
        let raw = MethodOptionsExtensions {
            http: Some(vec![0x12, 0x05, b'/']),
        }
        .encode_to_vec();
        assert!(extract_http_rule(Some(&raw)).is_err());
    }

    #[test]
    fn custom_binding() {
        let rule = HttpRule {
            pattern: Some(Pattern::Custom(CustomHttpPattern {
                kind: "head".to_string(),
                path: "/v1/ping".to_string(),
            })),
            ..Default::default()
        };
        assert_eq!(Some(("HEAD".to_string(), "/v1/ping")), rule.binding());
    }

    #[test]
    fn rule_without_pattern() {
        assert_eq!(None, HttpRule::default().binding());
    }
}
