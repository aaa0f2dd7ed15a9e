use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use prost_types::DescriptorProto;
use prost_types::EnumDescriptorProto;
use prost_types::FileDescriptorProto;
use prost_types::MethodDescriptorProto;
use tracing::debug;
use tracing::trace;

use crate::config::Config;
use crate::descriptor::request::PluginRequest;
use crate::descriptor::request::SourceFile;
use crate::descriptor::types::Enum;
use crate::descriptor::types::Field;
use crate::descriptor::types::FieldPath;
use crate::descriptor::types::FieldPathComponent;
use crate::descriptor::types::File;
use crate::descriptor::types::FileInfo;
use crate::descriptor::types::LinkedFile;
use crate::descriptor::types::Message;
use crate::descriptor::types::Method;
use crate::descriptor::types::PackageIdentity;
use crate::descriptor::types::Service;
use crate::descriptor::types::Syntax;
use crate::error::Error;
use crate::error::Result;
use crate::naming;
use crate::options::extract_http_rule;

/// A file is registered during the first load phase and linked during the
/// second, once every message and enum of the request is known.
#[derive(Clone, Debug)]
pub enum FileEntry {
    Registered(File),
    Linked(LinkedFile),
}

impl FileEntry {
    pub fn file(&self) -> &File {
        match self {
            FileEntry::Registered(file) => file,
            FileEntry::Linked(linked) => &linked.file,
        }
    }
}

/// Symbol table built from a [`PluginRequest`].
#[derive(Debug, Default)]
pub struct Registry {
    config: Config,
    /// Fully qualified message name to message.
    messages: HashMap<String, Arc<Message>>,
    /// Fully qualified enum name to enum.
    enums: HashMap<String, Arc<Enum>>,
    /// File name to file.
    files: HashMap<String, FileEntry>,
    /// Reserved package aliases to the module path they stand for.
    package_aliases: HashMap<String, String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: Config) -> Self {
        Registry {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers every file of `request`, then links the services of the
    /// files to generate.
    ///
    /// Any previous content is discarded first.
    pub fn load(&mut self, request: &PluginRequest) -> Result<()> {
        self.messages.clear();
        self.enums.clear();
        self.files.clear();
        self.package_aliases.clear();

        for source in &request.proto_file {
            self.load_file(source)?;
        }

        let mut target_package: Option<String> = None;
        for name in &request.file_to_generate {
            let source = request
                .proto_file
                .iter()
                .find(|source| source.name() == name)
                .ok_or_else(|| Error::NoSuchFile(name.clone()))?;

            let identity = package_identity_name(&source.descriptor);
            match &target_package {
                None => target_package = Some(identity),
                Some(target) if *target != identity => {
                    return Err(Error::InconsistentPackage(target.clone(), identity));
                }
                Some(_) => {}
            }

            self.link_file(name)?;
        }
        Ok(())
    }

    fn load_file(&mut self, source: &SourceFile) -> Result<()> {
        let descriptor = &source.descriptor;
        let path = self.package_path(descriptor);
        let name = default_package_name(descriptor);
        let alias = self.reserve_unique_alias(&name, &path);

        let info = Arc::new(FileInfo {
            name: descriptor.name().to_string(),
            package: descriptor.package.clone(),
            syntax: Syntax::of(descriptor),
            package_identity: PackageIdentity { path, name, alias },
        });
        debug!("register file {} as {}", info.name, info.package_identity);

        let mut file = File {
            info,
            messages: Vec::new(),
            enums: Vec::new(),
            service_descriptors: descriptor.service.clone(),
            method_options: source.method_options.clone(),
        };
        self.register_messages(&mut file, &[], &descriptor.message_type)?;
        self.register_enums(&mut file, &[], &descriptor.enum_type)?;

        self.files
            .insert(descriptor.name().to_string(), FileEntry::Registered(file));
        Ok(())
    }

    fn register_messages(
        &mut self,
        file: &mut File,
        outers: &[String],
        descriptors: &[DescriptorProto],
    ) -> Result<()> {
        for (index, descriptor) in descriptors.iter().enumerate() {
            let message = Arc::new(Message {
                file: Arc::clone(&file.info),
                outers: outers.to_vec(),
                name: descriptor.name().to_string(),
                fields: descriptor
                    .field
                    .iter()
                    .map(|field| Field::new(field, file.info.syntax))
                    .collect(),
                index,
            });

            let fqmn = message.fqmn();
            match self.messages.entry(fqmn.clone()) {
                Entry::Occupied(_) => {
                    return Err(Error::Duplicate {
                        kind: "message",
                        name: fqmn,
                    })
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::clone(&message));
                }
            }
            debug!("register name: {}", fqmn);
            file.messages.push(message);

            let mut nested_outers = outers.to_vec();
            nested_outers.push(descriptor.name().to_string());
            self.register_messages(file, &nested_outers, &descriptor.nested_type)?;
            self.register_enums(file, &nested_outers, &descriptor.enum_type)?;
        }
        Ok(())
    }

    fn register_enums(
        &mut self,
        file: &mut File,
        outers: &[String],
        descriptors: &[EnumDescriptorProto],
    ) -> Result<()> {
        for (index, descriptor) in descriptors.iter().enumerate() {
            let e = Arc::new(Enum {
                file: Arc::clone(&file.info),
                outers: outers.to_vec(),
                name: descriptor.name().to_string(),
                index,
            });

            let fqen = e.fqen();
            match self.enums.entry(fqen.clone()) {
                Entry::Occupied(_) => {
                    return Err(Error::Duplicate {
                        kind: "enum",
                        name: fqen,
                    })
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::clone(&e));
                }
            }
            debug!("register enum name: {}", fqen);
            file.enums.push(e);
        }
        Ok(())
    }

    fn link_file(&mut self, name: &str) -> Result<()> {
        let file = match self.files.remove(name) {
            None => return Err(Error::NoSuchFile(name.to_string())),
            Some(FileEntry::Linked(linked)) => {
                self.files
                    .insert(name.to_string(), FileEntry::Linked(linked));
                return Ok(());
            }
            Some(FileEntry::Registered(file)) => file,
        };

        debug!("loading services from {}", name);
        let services = match self.load_services(&file) {
            Ok(services) => services,
            Err(e) => {
                self.files
                    .insert(name.to_string(), FileEntry::Registered(file));
                return Err(e);
            }
        };
        self.files.insert(
            name.to_string(),
            FileEntry::Linked(LinkedFile { file, services }),
        );
        Ok(())
    }

    fn load_services(&self, file: &File) -> Result<Vec<Service>> {
        let mut services = Vec::new();
        for descriptor in &file.service_descriptors {
            let name = descriptor.name();
            trace!("registering {}", name);

            let methods = descriptor
                .method
                .iter()
                .map(|method| self.new_method(file, name, method))
                .collect::<Result<Vec<_>>>()?;
            if methods.is_empty() {
                continue;
            }
            debug!("registered {} with {} method(s)", name, methods.len());

            services.push(Service {
                file: Arc::clone(&file.info),
                name: name.to_string(),
                methods,
            });
        }
        Ok(services)
    }

    fn new_method(
        &self,
        file: &File,
        service: &str,
        descriptor: &MethodDescriptorProto,
    ) -> Result<Method> {
        let name = descriptor.name();
        trace!("processing {}.{}", service, name);

        let raw_options = file
            .method_options
            .get(&(service.to_string(), name.to_string()));
        let http_rule = extract_http_rule(raw_options.map(Vec::as_slice)).map_err(|source| {
            Error::ExtensionShape {
                method: format!("{}.{}", service, name),
                source,
            }
        })?;
        if http_rule.is_none() {
            debug!("found non-target method: {}.{}", service, name);
        }

        let location = file.info.package.as_deref().unwrap_or_default();
        Ok(Method {
            service: service.to_string(),
            name: name.to_string(),
            request_type: self.lookup_msg(location, descriptor.input_type())?,
            response_type: self.lookup_msg(location, descriptor.output_type())?,
            client_streaming: descriptor.client_streaming(),
            server_streaming: descriptor.server_streaming(),
            http_rule,
        })
    }

    /// Looks up a message by `name`, resolving relative names from the
    /// scope `location` outward.
    pub fn lookup_msg(&self, location: &str, name: &str) -> Result<Arc<Message>> {
        debug!("lookup {} from {}", name, location);
        scope_candidates(location, name)
            .iter()
            .find_map(|candidate| self.messages.get(candidate))
            .cloned()
            .ok_or_else(|| Error::MessageNotFound(name.to_string()))
    }

    /// Looks up an enum by `name`, resolving relative names from the scope
    /// `location` outward.
    pub fn lookup_enum(&self, location: &str, name: &str) -> Result<Arc<Enum>> {
        debug!("lookup enum {} from {}", name, location);
        scope_candidates(location, name)
            .iter()
            .find_map(|candidate| self.enums.get(candidate))
            .cloned()
            .ok_or_else(|| Error::EnumNotFound(name.to_string()))
    }

    /// Any file of the last load, linked or not.
    pub fn lookup_file(&self, name: &str) -> Result<&File> {
        self.files
            .get(name)
            .map(FileEntry::file)
            .ok_or_else(|| Error::NoSuchFile(name.to_string()))
    }

    /// A file to generate, with its services.
    pub fn lookup_target(&self, name: &str) -> Result<&LinkedFile> {
        match self.files.get(name) {
            None => Err(Error::NoSuchFile(name.to_string())),
            Some(FileEntry::Registered(_)) => Err(Error::NotLinked(name.to_string())),
            Some(FileEntry::Linked(linked)) => Ok(linked),
        }
    }

    /// Reserves `alias` for the module `path`.
    ///
    /// Reserving the same alias for the same path again succeeds; an alias
    /// already taken by another path is refused.
    pub fn reserve_package_alias(&mut self, alias: &str, path: &str) -> bool {
        match self.package_aliases.get(alias) {
            Some(taken) => taken == path,
            None => {
                self.package_aliases
                    .insert(alias.to_string(), path.to_string());
                true
            }
        }
    }

    /// Reserves `name`, or `name_0`, `name_1`, ... when it is taken, and
    /// returns the alias if one was needed.
    fn reserve_unique_alias(&mut self, name: &str, path: &str) -> Option<String> {
        if self.reserve_package_alias(name, path) {
            return None;
        }
        let alias = (0..)
            .map(|i| format!("{}_{}", name, i))
            .find(|alias| self.reserve_package_alias(alias, path))?;
        debug!("package name {} is taken, {} is aliased {}", name, path, alias);
        Some(alias)
    }

    /// Module path of the code generated for `file`.
    ///
    /// An `M` override wins, then a `go_package` option holding a full import
    /// path, then the directory of the file under the import prefix.
    fn package_path(&self, file: &FileDescriptorProto) -> String {
        let prefix = self.config.import_prefix.as_str();
        if let Some(package) = self.config.package_map.get(file.name()) {
            return join_module_path(&[prefix, package]);
        }

        let go_package = file
            .options
            .as_ref()
            .map(|options| options.go_package())
            .unwrap_or_default();
        if go_package.contains('/') {
            let import_path = match go_package.rfind(';') {
                Some(sc) if sc > 0 => &go_package[..sc],
                _ => go_package,
            };
            return join_module_path(&[import_path]);
        }

        let dir = Path::new(file.name())
            .parent()
            .and_then(Path::to_str)
            .unwrap_or_default();
        join_module_path(&[prefix, dir])
    }

    /// Resolves a dotted field path, e.g. `person.address.city`, starting
    /// from `message`.
    pub fn resolve_field_path(&self, message: &Message, path: &str) -> Result<FieldPath> {
        if path.is_empty() {
            return Ok(FieldPath::default());
        }

        let mut components: Vec<FieldPathComponent> = Vec::new();
        let mut current: Option<Arc<Message>> = None;
        for name in path.split('.') {
            if let Some(previous) = components.last() {
                let owner = current.as_deref().unwrap_or(message);
                if !previous.target.is_message() {
                    return Err(Error::NotAMessage {
                        message: owner.fqmn(),
                        field: previous.name.clone(),
                    });
                }
                let type_name = previous.target.type_name.as_deref().unwrap_or_default();
                current = Some(self.lookup_msg(&owner.fqmn(), type_name)?);
            }

            let owner = current.as_deref().unwrap_or(message);
            let target = owner.field(name).ok_or_else(|| Error::FieldNotFound {
                message: owner.fqmn(),
                field: name.to_string(),
            })?;
            components.push(FieldPathComponent {
                name: name.to_string(),
                target: target.clone(),
            });
        }
        Ok(FieldPath(components))
    }

    /// Every registered message name, sorted.
    pub fn all_fqmns(&self) -> Vec<String> {
        let mut names: Vec<String> = self.messages.keys().cloned().collect();
        names.sort();
        names
    }

    /// Every registered enum name, sorted.
    pub fn all_fqens(&self) -> Vec<String> {
        let mut names: Vec<String> = self.enums.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Fully qualified names `name` may refer to from `location`, innermost
/// scope first. Absolute names are their only candidate.
fn scope_candidates(location: &str, name: &str) -> Vec<String> {
    if name.starts_with('.') {
        return vec![name.to_string()];
    }

    let mut scope: Vec<&str> = location.split('.').filter(|c| !c.is_empty()).collect();
    let mut candidates = Vec::with_capacity(scope.len() + 1);
    loop {
        let mut components = vec![""];
        components.extend(scope.iter().copied());
        components.push(name);
        candidates.push(components.join("."));
        if scope.pop().is_none() {
            break;
        }
    }
    candidates
}

/// Joins path fragments into a `::` separated module path. Fragments may use
/// `::` or `/` as separators; empty segments are dropped and an empty result
/// is the crate root.
fn join_module_path(fragments: &[&str]) -> String {
    let segments: Vec<String> = fragments
        .iter()
        .flat_map(|fragment| fragment.split("::"))
        .flat_map(|fragment| fragment.split('/'))
        .map(str::trim)
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .map(naming::sanitize_package_name)
        .collect();
    if segments.is_empty() {
        return "crate".to_string();
    }
    segments.join("::")
}

/// Name identifying the package of `file`; every file generated in one run
/// must agree on it.
fn package_identity_name(file: &FileDescriptorProto) -> String {
    if let Some(go_package) = file.options.as_ref().and_then(|o| o.go_package.as_deref()) {
        let last = match go_package.rfind('/') {
            Some(idx) => &go_package[idx + 1..],
            None => go_package,
        };
        return match last.find(';') {
            Some(sc) => naming::sanitize_package_name(&last[sc + 1..]),
            None => naming::sanitize_package_name(last),
        };
    }

    match &file.package {
        Some(package) => package.clone(),
        None => Path::new(file.name())
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Default name of the module generated for `file`; may need an alias.
fn default_package_name(file: &FileDescriptorProto) -> String {
    naming::sanitize_package_name(&package_identity_name(file))
}
