use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every failure that aborts a generation run.
///
/// A run is all-or-nothing: the first error is reported as the single error
/// message of the plugin response and no files are emitted.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to decode code generator request: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error("no such file: {0}")]
    NoSuchFile(String),

    #[error("file {0} has not been linked; only files to generate have services")]
    NotLinked(String),

    #[error("inconsistent package names: {0} {1}")]
    InconsistentPackage(String, String),

    #[error("no message found: {0}")]
    MessageNotFound(String),

    #[error("no enum found: {0}")]
    EnumNotFound(String),

    #[error("duplicate {kind} definition: {name}")]
    Duplicate { kind: &'static str, name: String },

    #[error("no field {field} in message {message}")]
    FieldNotFound { message: String, field: String },

    #[error("field {field} of message {message} is not a message")]
    NotAMessage { message: String, field: String },

    #[error("failed to extract google.api.http from {method}: {source}")]
    ExtensionShape {
        method: String,
        #[source]
        source: prost::DecodeError,
    },

    #[error("invalid parameter `{0}`")]
    Parameter(String),

    #[error("failed to bind template for {file}: {reason}")]
    Template { file: String, reason: String },

    #[error("generated code for {file} does not parse: {source}")]
    Render {
        file: String,
        #[source]
        source: syn::Error,
    },
}
