//! Registry, templates and generator behind `protoc-gen-rust-http`.
//!
//! The usual entry point is [`generate`], which turns a decoded
//! [`PluginRequest`] into the files of a plugin response.

pub mod config;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod naming;
pub mod options;
pub mod templates;

use prost_types::compiler::code_generator_response;
use tracing::debug;

pub use config::Config;
pub use config::ConfigBuilder;
pub use descriptor::PluginRequest;
pub use descriptor::Registry;
pub use descriptor::SourceFile;
pub use error::Error;
pub use error::Result;
pub use generator::ArtifactKind;
pub use generator::Generator;

/// Loads `request` into a fresh registry and renders the files to generate.
///
/// The run is all or nothing: any error discards every rendered file.
pub fn generate(request: &PluginRequest) -> Result<Vec<code_generator_response::File>> {
    let config = Config::from_parameter(&request.parameter)?;
    debug!("{:?}", config);
    let request_context = config.request_context;

    let mut registry = Registry::with_config(config);
    registry.load(request)?;

    let targets = request
        .file_to_generate
        .iter()
        .map(|name| registry.lookup_target(name))
        .collect::<Result<Vec<_>>>()?;
    Generator::new(&registry, request_context).generate(&targets)
}
