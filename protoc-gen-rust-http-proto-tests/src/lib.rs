//! `.proto` fixtures compiled by `protoc` and `tonic-build`, together with
//! the HTTP adapters generated for them, for tests of the generator over
//! real descriptors.

use protoc_gen_rust_http_core::PluginRequest;
use protoc_gen_rust_http_core::Result;

/// The `google.protobuf.FileDescriptorSet` of every fixture, imports included.
pub const DESCRIPTOR_SET: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/descriptor_set.bin"));

pub mod example {
    include!(concat!(env!("OUT_DIR"), "/example.rs"));
    include!(concat!(env!("OUT_DIR"), "/http/example/example.pb.http.rs"));
    include!(concat!(env!("OUT_DIR"), "/http/example/example.pb.http.router.rs"));

    /// Handlers generated with `request_context`.
    pub mod with_context {
        use super::*;

        include!(concat!(
            env!("OUT_DIR"),
            "/http_context/example/example.pb.http.rs"
        ));
    }
}

pub mod shared {
    include!(concat!(env!("OUT_DIR"), "/shared.rs"));
}

pub mod legacy {
    include!(concat!(env!("OUT_DIR"), "/legacy.rs"));
}

/// Builds a plugin request generating `targets` out of [`DESCRIPTOR_SET`].
pub fn request(targets: &[&str], parameter: &str) -> Result<PluginRequest> {
    PluginRequest::from_descriptor_set(
        DESCRIPTOR_SET,
        targets.iter().map(|t| t.to_string()).collect(),
        parameter,
    )
}
