use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;

use prost_types::field_descriptor_proto::Label;
use prost_types::field_descriptor_proto::Type;
use prost_types::FieldDescriptorProto;
use prost_types::FileDescriptorProto;
use prost_types::ServiceDescriptorProto;

use crate::naming;
use crate::options::HttpRule;

/// Syntax mode of a proto file; decides the accessor idiom of field paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Syntax {
    /// `proto2`, or no syntax declaration at all.
    Proto2,
    /// `proto3` and editions.
    Proto3,
}

impl Syntax {
    pub fn of(file: &FileDescriptorProto) -> Self {
        match file.syntax.as_deref() {
            None | Some("") | Some("proto2") => Syntax::Proto2,
            Some(_) => Syntax::Proto3,
        }
    }

    pub fn is_legacy(self) -> bool {
        self == Syntax::Proto2
    }
}

/// The Rust module the code generated for a file lives in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackageIdentity {
    /// `::` separated module path, e.g. `crate::pb::example`.
    pub path: String,
    /// Default name of the module when imported.
    pub name: String,
    /// Alias unique within the current generation run, when `name` is taken.
    pub alias: Option<String>,
}

impl PackageIdentity {
    /// The identifier other files refer to this package by.
    pub fn import_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

impl Display for PackageIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} as {}", self.path, alias),
            None => write!(f, "{}", self.path),
        }
    }
}

/// File level data shared by every message, enum and service of a file.
#[derive(Clone, Debug)]
pub struct FileInfo {
    pub name: String,
    pub package: Option<String>,
    pub syntax: Syntax,
    pub package_identity: PackageIdentity,
}

/// A file after the registration phase: its messages and enums are known,
/// its services are still unresolved descriptors.
#[derive(Clone, Debug)]
pub struct File {
    pub info: Arc<FileInfo>,
    /// Messages defined in this file, nested ones included, depth first.
    pub messages: Vec<Arc<Message>>,
    /// Enums defined in this file, nested ones included.
    pub enums: Vec<Arc<Enum>>,
    pub(crate) service_descriptors: Vec<ServiceDescriptorProto>,
    pub(crate) method_options: HashMap<(String, String), Vec<u8>>,
}

impl File {
    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn package_identity(&self) -> &PackageIdentity {
        &self.info.package_identity
    }
}

/// A file whose services have been linked against the complete registry.
///
/// Only linked files expose services, so resolved method types cannot be
/// reached before every file of the request has been registered.
#[derive(Clone, Debug)]
pub struct LinkedFile {
    pub file: File,
    pub services: Vec<Service>,
}

impl LinkedFile {
    pub fn name(&self) -> &str {
        self.file.name()
    }

    pub fn package_identity(&self) -> &PackageIdentity {
        self.file.package_identity()
    }
}

/// Message or enum name qualified with package and enclosing messages,
/// e.g. `.example.Outer.Inner`.
fn qualified_name(file: &FileInfo, outers: &[String], name: &str) -> String {
    let mut components = vec![""];
    if let Some(package) = file.package.as_deref().filter(|p| !p.is_empty()) {
        components.push(package);
    }
    components.extend(outers.iter().map(String::as_str));
    components.push(name);
    components.join(".")
}

/// Rust path of a prost generated type as seen from `current_package`.
fn rust_type(file: &FileInfo, outers: &[String], name: &str, current_package: &str) -> String {
    let mut components: Vec<String> = outers.iter().map(|o| naming::to_snake(o)).collect();
    components.push(naming::to_upper_camel(name));

    let name = components.join("::");
    if file.package_identity.path == current_package {
        return name;
    }
    format!("{}::{}", file.package_identity.import_name(), name)
}

#[derive(Clone, Debug)]
pub struct Message {
    pub file: Arc<FileInfo>,
    /// Enclosing message names, outermost first.
    pub outers: Vec<String>,
    pub name: String,
    pub fields: Vec<Field>,
    /// Position of the message among its siblings.
    pub index: usize,
}

impl Message {
    /// Fully qualified message name.
    pub fn fqmn(&self) -> String {
        qualified_name(&self.file, &self.outers, &self.name)
    }

    pub fn rust_type(&self, current_package: &str) -> String {
        rust_type(&self.file, &self.outers, &self.name, current_package)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }
}

#[derive(Clone, Debug)]
pub struct Enum {
    pub file: Arc<FileInfo>,
    pub outers: Vec<String>,
    pub name: String,
    pub index: usize,
}

impl Enum {
    /// Fully qualified enum name.
    pub fn fqen(&self) -> String {
        qualified_name(&self.file, &self.outers, &self.name)
    }

    pub fn rust_type(&self, current_package: &str) -> String {
        rust_type(&self.file, &self.outers, &self.name, current_package)
    }
}

#[derive(Clone, Debug)]
pub struct Field {
    pub name: String,
    pub number: i32,
    pub label: Label,
    pub kind: Type,
    /// Referenced message or enum, as written in the descriptor. Resolved on
    /// demand through the registry.
    pub type_name: Option<String>,
    /// Syntax of the file declaring the owning message.
    pub syntax: Syntax,
}

impl Field {
    pub(crate) fn new(descriptor: &FieldDescriptorProto, syntax: Syntax) -> Self {
        Field {
            name: descriptor.name().to_string(),
            number: descriptor.number(),
            label: descriptor.label(),
            kind: descriptor.r#type(),
            type_name: descriptor.type_name.clone(),
            syntax,
        }
    }

    pub fn is_message(&self) -> bool {
        matches!(self.kind, Type::Message | Type::Group)
    }

    pub fn is_enum(&self) -> bool {
        self.kind == Type::Enum
    }

    pub fn is_repeated(&self) -> bool {
        self.label == Label::Repeated
    }

    pub fn rust_name(&self) -> String {
        naming::to_snake(&self.name)
    }

    /// prost generates a getter only for optional scalar and enum fields of
    /// legacy files. Message fields stay plain `Option`s.
    pub fn has_accessor(&self) -> bool {
        self.syntax.is_legacy()
            && self.label == Label::Optional
            && !self.is_message()
            && !self.is_repeated()
    }
}

#[derive(Clone, Debug)]
pub struct Service {
    pub file: Arc<FileInfo>,
    pub name: String,
    /// Methods in declaration order.
    pub methods: Vec<Method>,
}

#[derive(Clone, Debug)]
pub struct Method {
    pub service: String,
    pub name: String,
    pub request_type: Arc<Message>,
    pub response_type: Arc<Message>,
    pub client_streaming: bool,
    pub server_streaming: bool,
    /// The `google.api.http` binding, if the method is exposed over HTTP.
    pub http_rule: Option<HttpRule>,
}

impl Method {
    pub fn is_unary(&self) -> bool {
        !self.client_streaming && !self.server_streaming
    }

    /// `Service.Method`, as used in log and error messages.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.service, self.name)
    }
}

/// A path to a field from a request message, e.g. `person.address.city`.
#[derive(Clone, Debug, Default)]
pub struct FieldPath(pub Vec<FieldPathComponent>);

#[derive(Clone, Debug)]
pub struct FieldPathComponent {
    /// Proto name of the field.
    pub name: String,
    pub target: Field,
}

impl FieldPath {
    pub fn components(&self) -> &[FieldPathComponent] {
        &self.0
    }

    /// Whether the path goes through nested messages of a proto3 file.
    pub fn is_nested_modern(&self) -> bool {
        self.0.len() > 1 && !self.0[0].target.syntax.is_legacy()
    }

    /// Rust expression reading the target field, starting from `msg_expr`.
    pub fn rhs(&self, msg_expr: &str) -> String {
        let Some((last, init)) = self.0.split_last() else {
            return msg_expr.to_string();
        };
        let mut components = vec![msg_expr.to_string()];
        components.extend(init.iter().map(FieldPathComponent::lhs));
        components.push(last.rhs());
        components.join(".")
    }
}

impl Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.0.iter().map(|c| c.name.as_str()).collect();
        write!(f, "{}", names.join("."))
    }
}

impl FieldPathComponent {
    pub fn rhs(&self) -> String {
        naming::to_snake(&self.name)
    }

    /// Reads the field through its prost getter where there is one.
    pub fn lhs(&self) -> String {
        if self.target.has_accessor() {
            return format!("{}()", naming::to_snake(&self.name));
        }
        naming::to_snake(&self.name)
    }
}
