use std::path::Path;

use prost_types::compiler::code_generator_response;
use tracing::debug;
use tracing::info;
use tracing::trace;

use crate::descriptor::LinkedFile;
use crate::descriptor::Method;
use crate::descriptor::Registry;
use crate::error::Error;
use crate::error::Result;
use crate::naming;
use crate::templates;
use crate::templates::FileInput;
use crate::templates::HandlerInput;
use crate::templates::ImportInput;
use crate::templates::ServiceInput;

/// First line of every generated file.
pub const GENERATED_HEADER: &str = "// Code generated by protoc-gen-rust-http. DO NOT EDIT.";

/// The two renderings produced for each proto file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArtifactKind {
    /// One handler struct per service.
    Adapter,
    /// Route based dispatch over the handlers.
    Router,
}

impl ArtifactKind {
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Adapter => ".pb.http.rs",
            ArtifactKind::Router => ".pb.http.router.rs",
        }
    }

    /// `dir/example.proto` -> `dir/example.pb.http.rs`
    pub fn output_name(self, source: &str) -> String {
        format!("{}{}", strip_extension(source), self.suffix())
    }
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if !name[idx..].contains('/') => &name[..idx],
        _ => name,
    }
}

/// Renders the HTTP adapters of linked files.
pub struct Generator<'a> {
    registry: &'a Registry,
    request_context: bool,
    with_router: bool,
}

impl<'a> Generator<'a> {
    pub fn new(registry: &'a Registry, request_context: bool) -> Self {
        Generator {
            registry,
            request_context,
            with_router: true,
        }
    }

    /// Enables or disables the router files.
    pub fn with_router(mut self, with_router: bool) -> Self {
        self.with_router = with_router;
        self
    }

    /// Generates the adapter files of `targets`, then their router files.
    ///
    /// Files without a unary, HTTP bound method produce no output.
    pub fn generate(&self, targets: &[&LinkedFile]) -> Result<Vec<code_generator_response::File>> {
        let mut files = self.build_files(targets, ArtifactKind::Adapter)?;
        if self.with_router {
            files.extend(self.build_files(targets, ArtifactKind::Router)?);
        }
        Ok(files)
    }

    fn build_files(
        &self,
        targets: &[&LinkedFile],
        kind: ArtifactKind,
    ) -> Result<Vec<code_generator_response::File>> {
        let mut files = Vec::with_capacity(targets.len());
        for file in targets {
            info!("processing {}", file.name());

            let Some(input) = self.template_input(file)? else {
                info!("{}: no target service defined in the file", file.name());
                continue;
            };
            let code = match kind {
                ArtifactKind::Adapter => templates::render_adapter(&input)?,
                ArtifactKind::Router => templates::render_router(&input)?,
            };

            files.push(code_generator_response::File {
                name: Some(kind.output_name(file.name())),
                content: Some(format_source(file.name(), &code)?),
                ..Default::default()
            });
        }
        Ok(files)
    }

    /// Collects the eligible methods of `file`, or `None` if there are none.
    pub fn template_input(&self, file: &LinkedFile) -> Result<Option<FileInput>> {
        let current = file.package_identity().path.as_str();
        let mut imports: Vec<ImportInput> = Vec::new();
        let mut services = Vec::new();

        for service in &file.services {
            let mut handlers = Vec::new();
            for method in &service.methods {
                if !method.is_unary() {
                    trace!("skipping streaming method {}", method.qualified_name());
                    continue;
                }
                if method.http_rule.is_none() {
                    trace!("skipping unbound method {}", method.qualified_name());
                    continue;
                }

                handlers.push(HandlerInput {
                    name: method.name.clone(),
                    fn_name: naming::to_snake(&method.name),
                    arg: method.request_type.rust_type(current),
                    route: format!(
                        "/{}/{}",
                        service.name.to_lowercase(),
                        method.name.to_lowercase()
                    ),
                    doc: self.handler_doc(method)?,
                });
                mark_seen(&mut imports, current, method);
            }

            if handlers.is_empty() {
                debug!("{} has no eligible method", service.name);
                continue;
            }
            services.push(ServiceInput {
                name: service.name.clone(),
                server_module: format!("{}_server", naming::to_snake(&service.name)),
                trait_name: naming::to_upper_camel(&service.name),
                handlers,
            });
        }

        if services.is_empty() {
            return Ok(None);
        }

        let stem = Path::new(file.name())
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        Ok(Some(FileInput {
            source: file.name().to_string(),
            module: naming::module_name(stem, "pb_http"),
            imports,
            services,
            request_context: self.request_context,
        }))
    }

    /// Documents the HTTP binding of `method`. Body selectors must name
    /// fields of the request and response messages.
    fn handler_doc(&self, method: &Method) -> Result<String> {
        let Some(rule) = &method.http_rule else {
            return Ok(String::new());
        };

        let mut lines = Vec::new();
        if let Some((verb, path)) = rule.binding() {
            lines.push(format!("/// `{} {}`", verb, path));
        }
        if !rule.body.is_empty() && rule.body != "*" {
            let body = self
                .registry
                .resolve_field_path(&method.request_type, &rule.body)?;
            lines.push(format!("///\n/// Request body: `{}`.", body));
        }
        if !rule.response_body.is_empty() {
            let body = self
                .registry
                .resolve_field_path(&method.response_type, &rule.response_body)?;
            lines.push(format!("///\n/// Response body: `{}`.", body));
        }
        Ok(lines.join("\n"))
    }
}

/// Records the package of the request type of `method` unless it is the
/// current package or already imported.
fn mark_seen(imports: &mut Vec<ImportInput>, current: &str, method: &Method) {
    let identity = &method.request_type.file.package_identity;
    if identity.path == current || imports.iter().any(|i| i.path == identity.path) {
        return;
    }
    debug!("import {}", identity);
    imports.push(ImportInput {
        path: identity.path.clone(),
        name: identity.import_name().to_string(),
    });
}

/// Checks that `code` is valid Rust, pretty prints it and prepends the
/// generated file header.
pub fn format_source(source: &str, code: &str) -> Result<String> {
    let syntax = syn::parse_file(code).map_err(|e| {
        debug!("{}: {}", e, code);
        Error::Render {
            file: source.to_string(),
            source: e,
        }
    })?;
    Ok(format!(
        "{}\n// source: {}\n\n{}",
        GENERATED_HEADER,
        source,
        prettyplease::unparse(&syntax)
    ))
}
