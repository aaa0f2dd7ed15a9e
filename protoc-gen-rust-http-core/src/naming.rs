//! Proto to Rust identifier conversion, following the conventions of
//! prost-build and tonic-build so generated adapters name the same items.

use heck::ToSnakeCase;
use heck::ToUpperCamelCase;
use syn::Ident;

/// `GetPerson` -> `get_person`, `type` -> `r#type`.
pub fn to_snake(name: &str) -> String {
    escape(name.to_snake_case())
}

/// `person_info` -> `PersonInfo`, `Self` -> `Self_`.
pub fn to_upper_camel(name: &str) -> String {
    escape(name.to_upper_camel_case())
}

/// Replaces `.` and `-`, which cannot appear in Rust module names, with `_`.
pub fn sanitize_package_name(name: &str) -> String {
    name.replace(['.', '-'], "_")
}

/// Name of a generated module, e.g. `example-v1` and `pb_http` give
/// `example_v1_pb_http`.
pub fn module_name(stem: &str, suffix: &str) -> String {
    format!("{}_{}", sanitize_package_name(stem).to_snake_case(), suffix)
}

fn escape(ident: String) -> String {
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{}", ident);
    }
    match ident.as_str() {
        // suffixed the way prost-build does
        "self" | "super" | "crate" | "Self" | "_" | "extern" => format!("{}_", ident),
        _ if syn::parse_str::<Ident>(&ident).is_ok() => ident,
        _ => format!("r#{}", ident),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("GetPerson", "get_person")]
    #[test_case("get_person", "get_person")]
    #[test_case("ListHTTPRoutes", "list_http_routes")]
    #[test_case("Type", "r#type")]
    #[test_case("Self", "self_")]
    #[test_case("Extern", "extern_")]
    #[test_case("async", "r#async")]
    #[test_case("1x", "_1x")]
    fn snake(input: &str, expected: &str) {
        assert_eq!(expected, to_snake(input));
    }

    #[test_case("Example", "Example")]
    #[test_case("person_info", "PersonInfo")]
    #[test_case("HTTPRequest", "HttpRequest")]
    #[test_case("Self", "Self_")]
    #[test_case("2fa", "_2fa")]
    fn upper_camel(input: &str, expected: &str) {
        assert_eq!(expected, to_upper_camel(input));
    }

    #[test]
    fn sanitize() {
        assert_eq!("foo_bar_baz", sanitize_package_name("foo.bar-baz"));
    }

    #[test_case("example", "example_pb_http")]
    #[test_case("example-v1.beta", "example_v1_beta_pb_http")]
    #[test_case("MyService", "my_service_pb_http")]
    #[test_case("type", "type_pb_http")]
    fn modules(stem: &str, expected: &str) {
        assert_eq!(expected, module_name(stem, "pb_http"));
    }
}
