//! The contract between the code generated by `protoc-gen-rust-http` and the
//! wire format it is served with.
//!
//! Generated adapters never pick a format themselves: they ask a [`Codec`]
//! for the route of a request, decode the request message through it and
//! write the response message or the error back through it. Any transport
//! (plain REST, JSON-RPC style envelopes, ...) plugs in by implementing the
//! four methods of the trait.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// An HTTP request with its body fully read.
pub type Request = http::Request<Vec<u8>>;

/// An HTTP response with an in-memory body.
pub type Response = http::Response<Vec<u8>>;

/// What a route handler returns.
pub type HandlerFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// A route handler, as stored in the route tables of generated routers.
pub type Handler = Arc<dyn Fn(Request) -> HandlerFuture + Send + Sync>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("no handler for route {0}")]
    NoRoute(String),

    #[error("invalid route {0}: routes must start with '/'")]
    InvalidRoutes(String),

    #[error("failed to read request: {0}")]
    Read(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("failed to write response: {0}")]
    Write(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A wire format for generated HTTP adapters.
///
/// Codecs are shared between concurrent requests, so every method takes
/// `&self`.
pub trait Codec: Send + Sync + 'static {
    /// The route key of `req`, matched against `/service/method` keys.
    fn route(&self, req: &Request) -> Result<String, CodecError>;

    /// Decodes the request message carried by `req`.
    fn read_request<T: DeserializeOwned>(&self, req: &Request) -> Result<T, CodecError>;

    /// Writes `value` as the successful result into `resp`.
    fn write_response<T: Serialize>(&self, resp: &mut Response, value: &T) -> Result<(), CodecError>;

    /// Writes `err` into `resp`. `err` is a [`CodecError`] or whatever error
    /// the service returned, e.g. a `tonic::Status`.
    fn write_error(
        &self,
        resp: &mut Response,
        err: &(dyn std::error::Error + 'static),
    ) -> Result<(), CodecError>;
}
