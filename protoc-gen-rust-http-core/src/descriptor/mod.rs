//! The descriptor model: what a plugin request declares, cross-referenced.

mod registry;
mod request;
mod types;

pub use registry::FileEntry;
pub use registry::Registry;
pub use request::PluginRequest;
pub use request::SourceFile;
pub use types::Enum;
pub use types::Field;
pub use types::FieldPath;
pub use types::FieldPathComponent;
pub use types::File;
pub use types::FileInfo;
pub use types::LinkedFile;
pub use types::Message;
pub use types::Method;
pub use types::PackageIdentity;
pub use types::Service;
pub use types::Syntax;

#[cfg(test)]
pub(crate) use registry::tests as fixtures;
