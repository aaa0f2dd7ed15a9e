#![allow(dead_code)]

use prost::Message;
use prost_types::compiler::CodeGeneratorResponse;
use prost_types::field_descriptor_proto::Label;
use prost_types::field_descriptor_proto::Type;
use prost_types::DescriptorProto;
use prost_types::FieldDescriptorProto;
use prost_types::FileDescriptorProto;
use prost_types::MethodDescriptorProto;
use prost_types::ServiceDescriptorProto;
use protoc_gen_rust_http::PluginRequest;
use protoc_gen_rust_http_core::options::http_rule::Pattern;
use protoc_gen_rust_http_core::options::HttpRule;
use protoc_gen_rust_http_core::SourceFile;

pub fn rule(pattern: Pattern) -> Vec<u8> {
    HttpRule {
        pattern: Some(pattern),
        body: "*".to_string(),
        ..Default::default()
    }
    .into_method_options()
}

pub fn message(name: &str, fields: &[(&str, Type, Option<&str>)]) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields
            .iter()
            .enumerate()
            .map(|(i, (name, kind, type_name))| FieldDescriptorProto {
                name: Some(name.to_string()),
                number: Some(i as i32 + 1),
                label: Some(Label::Optional as i32),
                r#type: Some(*kind as i32),
                type_name: type_name.map(str::to_string),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

pub fn method(name: &str, input: &str, output: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(output.to_string()),
        ..Default::default()
    }
}

/// `example.proto` of package `example`, with service `Example`:
/// `GetPerson` (GET, unary), `ListPeople` (POST, server streaming) and
/// `Ping` (unary, no binding).
pub fn example() -> SourceFile {
    let mut watch = method("ListPeople", "Query", "Person");
    watch.server_streaming = Some(true);

    let descriptor = FileDescriptorProto {
        name: Some("example.proto".to_string()),
        package: Some("example".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            message("Query", &[("id", Type::Int64, None)]),
            message(
                "Person",
                &[
                    ("name", Type::String, None),
                    ("age", Type::Int32, None),
                ],
            ),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("Example".to_string()),
            method: vec![
                method("GetPerson", "Query", "Person"),
                watch,
                method("Ping", ".example.Query", ".example.Query"),
            ],
            ..Default::default()
        }],
        ..Default::default()
    };

    SourceFile::new(descriptor)
        .with_method_options(
            "Example",
            "GetPerson",
            rule(Pattern::Get("/v1/people/{id}".to_string())),
        )
        .with_method_options(
            "Example",
            "ListPeople",
            rule(Pattern::Post("/v1/people:list".to_string())),
        )
}

pub fn encode(files: Vec<SourceFile>, targets: &[&str], parameter: &str) -> Vec<u8> {
    PluginRequest {
        file_to_generate: targets.iter().map(|t| t.to_string()).collect(),
        parameter: parameter.to_string(),
        proto_file: files,
    }
    .encode_to_vec()
}

/// Runs the plugin and decodes its output, as protoc would.
pub fn run(input: &[u8]) -> CodeGeneratorResponse {
    let response = protoc_gen_rust_http::run(input);
    CodeGeneratorResponse::decode(response.encode_to_vec().as_slice()).unwrap()
}
