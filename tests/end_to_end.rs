mod common;

use prost_types::compiler::code_generator_response::Feature;
use prost_types::field_descriptor_proto::Type;
use prost_types::FileDescriptorProto;
use prost_types::FileOptions;
use prost_types::ServiceDescriptorProto;
use protoc_gen_rust_http_core::options::http_rule::Pattern;
use protoc_gen_rust_http_core::SourceFile;
use test_case::test_case;

use common::encode;
use common::example;
use common::message;
use common::method;
use common::rule;
use common::run;

#[test]
// One file, one service, one eligible method gives one adapter and one router
fn example_service() {
    let response = run(&encode(vec![example()], &["example.proto"], ""));
    assert_eq!(None, response.error);
    assert_eq!(Some(Feature::Proto3Optional as u64), response.supported_features);

    let names: Vec<&str> = response.file.iter().map(|f| f.name()).collect();
    assert_eq!(vec!["example.pb.http.rs", "example.pb.http.router.rs"], names);

    let adapter = response.file[0].content();
    assert!(adapter.starts_with("// Code generated by protoc-gen-rust-http. DO NOT EDIT."));
    assert!(adapter.contains("pub mod example_pb_http {"));
    assert!(adapter.contains("pub struct HttpExampleServer<S, C>"));
    assert!(adapter.contains("S: example_server::Example,"));
    assert!(adapter.contains("pub async fn get_person("));
    assert!(adapter.contains("read_request::<Query>"));
    assert!(adapter.contains("pub use self::example_pb_http::*;"));

    let router = response.file[1].content();
    assert!(router.contains("pub mod example_pb_http_router {"));
    assert!(router.contains("pub struct ExampleRouter<C>"));
    assert!(router.contains("\"/example/getperson\""));
    assert!(router.contains("pub fn with_routes("));
    assert!(router.contains("pub fn with_swagger(mut self) -> Self"));
}

#[test]
// Streaming and unbound methods get no handler
fn only_unary_bound_methods() {
    let response = run(&encode(vec![example()], &["example.proto"], ""));
    for file in &response.file {
        let content = file.content();
        assert!(content.contains("get_person"));
        assert!(!content.contains("list_people"));
        assert!(!content.contains("fn ping("));
        assert!(!content.contains("/example/ping"));
    }
}

#[test]
fn request_context() {
    let response = run(&encode(
        vec![example()],
        &["example.proto"],
        "request_context=true",
    ));
    assert!(response.file[0]
        .content()
        .contains("::tonic::metadata::MetadataMap::from_headers(req.headers().clone())"));
}

#[test]
fn file_without_eligible_methods() {
    let mut source = example();
    source.method_options.clear();

    let response = run(&encode(vec![source], &["example.proto"], ""));
    assert_eq!(None, response.error);
    assert!(response.file.is_empty());
}

fn shared() -> SourceFile {
    SourceFile::new(FileDescriptorProto {
        name: Some("shared/search.proto".to_string()),
        package: Some("shared".to_string()),
        message_type: vec![message("Search", &[("text", Type::String, None)])],
        options: Some(FileOptions {
            go_package: Some("example.com/api/shared;shared".to_string()),
            ..Default::default()
        }),
        ..Default::default()
    })
}

fn with_search(mut source: SourceFile) -> SourceFile {
    source.descriptor.service[0]
        .method
        .push(method("Find", ".shared.Search", "Person"));
    source.with_method_options(
        "Example",
        "Find",
        rule(Pattern::Post("/v1/people:search".to_string())),
    )
}

#[test]
// Request types of other packages are imported under their module path
fn cross_package_request() {
    let response = run(&encode(
        vec![shared(), with_search(example())],
        &["example.proto"],
        "import_prefix=crate::pb",
    ));
    assert_eq!(None, response.error);

    let adapter = response.file[0].content();
    assert!(adapter.contains("use example_com::api::shared as shared;"));
    assert!(adapter.contains("read_request::<shared::Search>"));
    assert!(adapter.contains("pub async fn find("));
}

#[test]
fn package_override() {
    let response = run(&encode(
        vec![shared(), with_search(example())],
        &["example.proto"],
        "import_prefix=crate::pb,Mshared/search.proto=common::search",
    ));
    assert!(response.file[0]
        .content()
        .contains("use crate::pb::common::search as shared;"));
}

#[test]
// Output order: every adapter first, then every router, both in target order
fn multiple_targets() {
    let second = SourceFile::new(FileDescriptorProto {
        name: Some("api/health.proto".to_string()),
        package: Some("example".to_string()),
        message_type: vec![message("Status", &[])],
        service: vec![ServiceDescriptorProto {
            name: Some("Health".to_string()),
            method: vec![method("Check", "Status", "Status")],
            ..Default::default()
        }],
        ..Default::default()
    })
    .with_method_options(
        "Health",
        "Check",
        rule(Pattern::Get("/health".to_string())),
    );

    let response = run(&encode(
        vec![example(), second],
        &["example.proto", "api/health.proto"],
        "",
    ));
    let names: Vec<&str> = response.file.iter().map(|f| f.name()).collect();
    assert_eq!(
        vec![
            "example.pb.http.rs",
            "api/health.pb.http.rs",
            "example.pb.http.router.rs",
            "api/health.pb.http.router.rs",
        ],
        names
    );
    assert!(response.file[3].content().contains("pub struct HealthRouter<C>"));
    assert!(response.file[3].content().contains("\"/health/check\""));
}

#[test_case("" ; "no parameters")]
#[test_case("request_context" ; "request context")]
#[test_case("import_prefix=crate::pb" ; "import prefix")]
// Byte identical input gives byte identical output
fn deterministic(parameter: &str) {
    let input = encode(
        vec![shared(), with_search(example())],
        &["example.proto"],
        parameter,
    );
    let first = run(&input);
    for _ in 0..5 {
        assert_eq!(first, run(&input));
    }
}
