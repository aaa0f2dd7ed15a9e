//! Decoding of the plugin input.
//!
//! `prost-types` gives typed descriptors but drops extension fields of
//! `MethodOptions`. The same bytes are decoded a second time through a
//! minimal shadow schema that keeps the raw option bytes of every method,
//! so the `google.api.http` binding can be extracted later.

use std::collections::HashMap;

use prost::encoding::encode_key;
use prost::encoding::encode_varint;
use prost::encoding::WireType;
use prost::Message;
use prost_types::compiler::CodeGeneratorRequest;
use prost_types::FileDescriptorProto;
use prost_types::FileDescriptorSet;
use tracing::debug;

use crate::error::Result;

/// A code generator request whose method options survived decoding.
#[derive(Clone, Debug, Default)]
pub struct PluginRequest {
    /// Files the plugin must produce output for, in command line order.
    pub file_to_generate: Vec<String>,
    /// The raw `--rust-http_opt` parameter string.
    pub parameter: String,
    /// Every file of the request, dependencies first.
    pub proto_file: Vec<SourceFile>,
}

/// One input file with the raw `MethodOptions` bytes of its methods.
#[derive(Clone, Debug, Default)]
pub struct SourceFile {
    pub descriptor: FileDescriptorProto,
    /// Keyed by `(service name, method name)`.
    pub method_options: HashMap<(String, String), Vec<u8>>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct RawCodeGeneratorRequest {
    #[prost(message, repeated, tag = "15")]
    proto_file: Vec<RawFile>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct RawFileDescriptorSet {
    #[prost(message, repeated, tag = "1")]
    file: Vec<RawFile>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct RawFile {
    #[prost(message, repeated, tag = "6")]
    service: Vec<RawService>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct RawService {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(message, repeated, tag = "2")]
    method: Vec<RawMethod>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
struct RawMethod {
    #[prost(string, optional, tag = "1")]
    name: Option<String>,
    #[prost(bytes = "vec", optional, tag = "4")]
    options: Option<Vec<u8>>,
}

const FILE_SERVICE_TAG: u32 = 6;
const SERVICE_METHOD_TAG: u32 = 2;
const METHOD_OPTIONS_TAG: u32 = 4;
const REQUEST_PROTO_FILE_TAG: u32 = 15;

impl PluginRequest {
    /// Decodes an encoded `google.protobuf.compiler.CodeGeneratorRequest`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let request = CodeGeneratorRequest::decode(bytes)?;
        let raw = RawCodeGeneratorRequest::decode(bytes)?;

        Ok(PluginRequest {
            file_to_generate: request.file_to_generate,
            parameter: request.parameter.unwrap_or_default(),
            proto_file: SourceFile::zip(request.proto_file, raw.proto_file),
        })
    }

    /// Builds a request from an encoded `google.protobuf.FileDescriptorSet`,
    /// such as the one `prost-build` writes with `file_descriptor_set_path`.
    pub fn from_descriptor_set(
        bytes: &[u8],
        file_to_generate: Vec<String>,
        parameter: impl Into<String>,
    ) -> Result<Self> {
        let set = FileDescriptorSet::decode(bytes)?;
        let raw = RawFileDescriptorSet::decode(bytes)?;

        Ok(PluginRequest {
            file_to_generate,
            parameter: parameter.into(),
            proto_file: SourceFile::zip(set.file, raw.file),
        })
    }

    /// Encodes the request back into `CodeGeneratorRequest` bytes, raw
    /// method options included.
    pub fn encode_to_vec(&self) -> Vec<u8> {
        let request = CodeGeneratorRequest {
            file_to_generate: self.file_to_generate.clone(),
            parameter: Some(self.parameter.clone()).filter(|p| !p.is_empty()),
            ..Default::default()
        };

        let mut buf = request.encode_to_vec();
        for file in &self.proto_file {
            encode_length_delimited(REQUEST_PROTO_FILE_TAG, &file.encode_to_vec(), &mut buf);
        }
        buf
    }
}

impl SourceFile {
    pub fn new(descriptor: FileDescriptorProto) -> Self {
        SourceFile {
            descriptor,
            method_options: HashMap::new(),
        }
    }

    /// Attaches raw `MethodOptions` bytes to `service.method`.
    pub fn with_method_options(
        mut self,
        service: impl Into<String>,
        method: impl Into<String>,
        options: Vec<u8>,
    ) -> Self {
        self.method_options
            .insert((service.into(), method.into()), options);
        self
    }

    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    fn zip(descriptors: Vec<FileDescriptorProto>, raw: Vec<RawFile>) -> Vec<SourceFile> {
        descriptors
            .into_iter()
            .zip(raw)
            .map(|(descriptor, raw)| {
                let mut file = SourceFile::new(descriptor);
                for service in raw.service {
                    let service_name = service.name.unwrap_or_default();
                    for method in service.method {
                        let Some(options) = method.options else {
                            continue;
                        };
                        let method_name = method.name.unwrap_or_default();
                        debug!(
                            "method options of {}.{}: {} bytes",
                            service_name,
                            method_name,
                            options.len()
                        );
                        file.method_options
                            .insert((service_name.clone(), method_name), options);
                    }
                }
                file
            })
            .collect()
    }

    /// `FileDescriptorProto` bytes where methods with raw options carry those
    /// bytes instead of the typed `MethodOptions`.
    fn encode_to_vec(&self) -> Vec<u8> {
        let mut descriptor = self.descriptor.clone();
        let services = std::mem::take(&mut descriptor.service);

        let mut buf = descriptor.encode_to_vec();
        for mut service in services {
            let methods = std::mem::take(&mut service.method);
            let mut service_buf = service.encode_to_vec();
            for mut method in methods {
                let key = (service.name().to_string(), method.name().to_string());
                let raw = self.method_options.get(&key);
                if raw.is_some() {
                    method.options = None;
                }
                let mut method_buf = method.encode_to_vec();
                if let Some(raw) = raw {
                    encode_length_delimited(METHOD_OPTIONS_TAG, raw, &mut method_buf);
                }
                encode_length_delimited(SERVICE_METHOD_TAG, &method_buf, &mut service_buf);
            }
            encode_length_delimited(FILE_SERVICE_TAG, &service_buf, &mut buf);
        }
        buf
    }
}

fn encode_length_delimited(tag: u32, bytes: &[u8], buf: &mut Vec<u8>) {
    encode_key(tag, WireType::LengthDelimited, buf);
    encode_varint(bytes.len() as u64, buf);
    buf.extend_from_slice(bytes);
}
