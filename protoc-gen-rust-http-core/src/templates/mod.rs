//! Source templates of the generated files.
//!
//! Templates are `strfmt` strings: `{name}` is a placeholder, `{{` and `}}`
//! are literal braces. Blocks without placeholders are plain Rust and are
//! appended as they are.

mod adapter;
mod router;

use proc_macro2::TokenStream;
use quote::quote;
use strfmt::strfmt;
use syn::Ident;
use syn::Path;

use crate::error::Error;
use crate::error::Result;

pub use adapter::render as render_adapter;
pub use router::render as render_router;

/// Everything the templates need to know about one proto file.
#[derive(Clone, Debug)]
pub struct FileInput {
    /// Proto file name, for error messages.
    pub source: String,
    /// Name of the generated module.
    pub module: String,
    /// Packages of request types other than the file's own.
    pub imports: Vec<ImportInput>,
    pub services: Vec<ServiceInput>,
    /// Copy HTTP headers into the tonic request metadata.
    pub request_context: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImportInput {
    pub path: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct ServiceInput {
    /// Proto service name.
    pub name: String,
    /// Module tonic-build generates the server trait in, e.g. `example_server`.
    pub server_module: String,
    /// The server trait, e.g. `Example`.
    pub trait_name: String,
    pub handlers: Vec<HandlerInput>,
}

impl ServiceInput {
    pub fn adapter_type(&self) -> String {
        format!("Http{}Server", self.trait_name)
    }

    pub fn router_type(&self) -> String {
        format!("{}Router", self.trait_name)
    }
}

#[derive(Clone, Debug)]
pub struct HandlerInput {
    /// Proto method name.
    pub name: String,
    /// Handler and tonic method name.
    pub fn_name: String,
    /// Rust type of the request message.
    pub arg: String,
    /// Default route key, `/service/method` in lower case.
    pub route: String,
    /// Doc comment lines of the handler, may be empty.
    pub doc: String,
}

const MODULE_HEADER: &str = r#"
pub mod {module} {{
    #![allow(dead_code, unused_imports)]

    use super::*;
"#;
const MODULE_FOOTER: &str = "}";
const MODULE_REEXPORT: &str = "pub use self::{module}::*;";

const SERVICE_ADAPTER_HEADER: &str = r#"
    /// HTTP handlers of the `{service}` service.
    {vis}struct {adapter}<S, C> {{
        srv: ::std::sync::Arc<S>,
        codec: ::std::sync::Arc<C>,
    }}

    impl<S, C> ::std::clone::Clone for {adapter}<S, C> {{
        fn clone(&self) -> Self {{
            Self {{
                srv: ::std::sync::Arc::clone(&self.srv),
                codec: ::std::sync::Arc::clone(&self.codec),
            }}
        }}
    }}

    impl<S, C> {adapter}<S, C>
    where
        S: {server_module}::{trait_name},
        C: ::protoc_gen_rust_http_codec::Codec,
    {{
        {vis}fn new(srv: S, codec: C) -> Self {{
            Self::from_arc(::std::sync::Arc::new(srv), ::std::sync::Arc::new(codec))
        }}

        {vis}fn from_arc(srv: ::std::sync::Arc<S>, codec: ::std::sync::Arc<C>) -> Self {{
            Self {{ srv, codec }}
        }}
"#;
const SERVICE_ADAPTER_HANDLER: &str = r#"
        {doc}
        {vis}async fn {fn_name}(
            &self,
            req: ::protoc_gen_rust_http_codec::Request,
        ) -> ::protoc_gen_rust_http_codec::Response {{
            let mut resp = ::protoc_gen_rust_http_codec::Response::default();
            let arg = match self.codec.read_request::<{arg}>(&req) {{
                Ok(arg) => arg,
                Err(err) => {{
                    let _ = self.codec.write_error(&mut resp, &err);
                    return resp;
                }}
            }};
            {grpc_request}
            match self.srv.{fn_name}(grpc_req).await {{
                Ok(grpc_resp) => {{
                    if let Err(err) = self.codec.write_response(&mut resp, grpc_resp.get_ref()) {{
                        let _ = self.codec.write_error(&mut resp, &err);
                    }}
                }}
                Err(status) => {{
                    let _ = self.codec.write_error(&mut resp, &status);
                }}
            }}
            resp
        }}
"#;
const SERVICE_ADAPTER_FOOTER: &str = "}";

const GRPC_REQUEST: &str = "let grpc_req = ::tonic::Request::new(arg);";
const GRPC_REQUEST_WITH_CONTEXT: &str = r#"
            let mut grpc_req = ::tonic::Request::new(arg);
            *grpc_req.metadata_mut() =
                ::tonic::metadata::MetadataMap::from_headers(req.headers().clone());
"#;

pub(crate) fn template_error(file: &str, reason: impl ToString) -> Error {
    Error::Template {
        file: file.to_string(),
        reason: reason.to_string(),
    }
}

/// Opens the generated module of `input`, imports included.
fn render_module_header(input: &FileInput, module: &str) -> Result<String> {
    let mut out = strfmt!(MODULE_HEADER, module => module.to_string())
        .map_err(|e| template_error(&input.source, e))?;
    for import in &input.imports {
        out += &render_import(import)
            .map_err(|e| template_error(&input.source, e))?
            .to_string();
        out += "\n";
    }
    Ok(out)
}

fn render_module_footer(input: &FileInput, module: &str) -> Result<String> {
    let reexport = strfmt!(MODULE_REEXPORT, module => module.to_string())
        .map_err(|e| template_error(&input.source, e))?;
    Ok(format!("{}\n{}\n", MODULE_FOOTER, reexport))
}

fn render_import(import: &ImportInput) -> syn::Result<TokenStream> {
    let path: Path = syn::parse_str(&import.path)?;
    let name: Ident = syn::parse_str(&import.name)?;
    Ok(quote!(use #path as #name;))
}

/// The handler struct of `service`; `public` decides the visibility of the
/// struct and its methods.
fn render_service_adapter(input: &FileInput, service: &ServiceInput, public: bool) -> Result<String> {
    let vis = if public { "pub " } else { "" };
    let adapter = service.adapter_type();

    let mut out = strfmt!(
        SERVICE_ADAPTER_HEADER,
        service => service.name.clone(),
        vis => vis.to_string(),
        adapter => adapter.clone(),
        server_module => service.server_module.clone(),
        trait_name => service.trait_name.clone()
    )
    .map_err(|e| template_error(&input.source, e))?;

    let grpc_request = if input.request_context {
        GRPC_REQUEST_WITH_CONTEXT
    } else {
        GRPC_REQUEST
    };
    for handler in &service.handlers {
        out += &strfmt!(
            SERVICE_ADAPTER_HANDLER,
            doc => handler.doc.clone(),
            vis => vis.to_string(),
            fn_name => handler.fn_name.clone(),
            arg => handler.arg.clone(),
            grpc_request => grpc_request.to_string()
        )
        .map_err(|e| template_error(&input.source, e))?;
    }

    out += SERVICE_ADAPTER_FOOTER;
    Ok(out)
}
