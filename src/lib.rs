#![deny(
    missing_docs,
    missing_debug_implementations,
    missing_copy_implementations,
    unsafe_code,
    unstable_features,
    unused_import_braces
)]
#![doc = include_str!("../README.md")]

use prost_types::compiler::code_generator_response::Feature;
use prost_types::compiler::CodeGeneratorResponse;
use tracing::error;
use tracing::info;

pub use protoc_gen_rust_http_core::generate;
pub use protoc_gen_rust_http_core::Config;
pub use protoc_gen_rust_http_core::Error;
pub use protoc_gen_rust_http_core::PluginRequest;

/// Runs the plugin over an encoded `CodeGeneratorRequest`.
///
/// Never fails: errors are reported through the `error` field of the
/// response, with no files alongside.
pub fn run(input: &[u8]) -> CodeGeneratorResponse {
    let generated = PluginRequest::decode(input).and_then(|request| generate(&request));

    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };
    match generated {
        Ok(files) => {
            info!("generated {} file(s)", files.len());
            response.file = files;
        }
        Err(e) => {
            error!("{}", e);
            response.error = Some(e.to_string());
        }
    }
    response
}
