use std::collections::HashMap;

use derive_builder::Builder;
use tracing::debug;
use tracing::warn;

use crate::error::Error;
use crate::error::Result;

/// Plugin configuration, parsed from the `parameter` string of a code
/// generator request (`--rust-http_opt=...` on the protoc command line).
#[derive(Builder, Clone, Debug, Default)]
#[builder(default)]
pub struct Config {
    /// Prefix prepended to every derived package path.
    #[builder(setter(into))]
    pub import_prefix: String,
    /// Forward incoming HTTP headers into the tonic request metadata.
    pub request_context: bool,
    /// Accepted for command line compatibility, not used by the generator.
    pub allow_delete_body: bool,
    /// `M<file>=<package>` overrides, keyed by proto file name.
    #[builder(setter(custom))]
    pub package_map: HashMap<String, String>,
}

impl ConfigBuilder {
    /// Registers a `M<file>=<package>` override.
    pub fn package_mapping(
        &mut self,
        file: impl Into<String>,
        package: impl Into<String>,
    ) -> &mut Self {
        self.package_map
            .get_or_insert_with(HashMap::new)
            .insert(file.into(), package.into());
        self
    }
}

impl Config {
    const PARAM_ALLOW_DELETE_BODY: &'static str = "allow_delete_body";
    const PARAM_IMPORT_PREFIX: &'static str = "import_prefix";
    const PARAM_REQUEST_CONTEXT: &'static str = "request_context";

    /// Parses the comma separated `key=value` / `key` parameter string.
    ///
    /// Keys starting with `M` register a file to package override instead of
    /// setting an option; any other unknown key is an error.
    pub fn from_parameter(parameter: &str) -> Result<Self> {
        let mut builder = ConfigBuilder::default();

        for token in parameter.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some((name, value)) => match name.strip_prefix('M') {
                    Some(file) => {
                        debug!("package override {} => {}", file, value);
                        builder.package_mapping(file, value);
                    }
                    None => Self::apply_option(&mut builder, name, Some(value))?,
                },
                None => Self::apply_option(&mut builder, token, None)?,
            }
        }

        builder
            .build()
            .map_err(|e| Error::Parameter(format!("{}: {}", parameter, e)))
    }

    fn apply_option(builder: &mut ConfigBuilder, name: &str, value: Option<&str>) -> Result<()> {
        match name {
            Self::PARAM_IMPORT_PREFIX => {
                builder.import_prefix(value.unwrap_or_default());
            }
            Self::PARAM_REQUEST_CONTEXT => {
                builder.request_context(parse_bool(name, value)?);
            }
            Self::PARAM_ALLOW_DELETE_BODY => {
                let allow = parse_bool(name, value)?;
                if allow {
                    warn!("{} is accepted but has no effect", name);
                }
                builder.allow_delete_body(allow);
            }
            _other => {
                return Err(Error::Parameter(match value {
                    Some(value) => format!("{}={}", name, value),
                    None => name.to_string(),
                }))
            }
        }
        Ok(())
    }
}

/// A bare boolean key means `true`.
fn parse_bool(name: &str, value: Option<&str>) -> Result<bool> {
    match value {
        None => Ok(true),
        Some("1" | "t" | "T" | "TRUE" | "true" | "True") => Ok(true),
        Some("0" | "f" | "F" | "FALSE" | "false" | "False") => Ok(false),
        Some(value) => Err(Error::Parameter(format!("{}={}", name, value))),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn empty_parameter() {
        let config = Config::from_parameter("").unwrap();
        assert_eq!("", config.import_prefix);
        assert!(!config.request_context);
        assert!(!config.allow_delete_body);
        assert!(config.package_map.is_empty());
    }

    #[test]
    fn all_options() {
        let config = Config::from_parameter(
            "import_prefix=crate::pb,request_context,allow_delete_body=false,Mfoo/bar.proto=baz",
        )
        .unwrap();

        assert_eq!("crate::pb", config.import_prefix);
        assert!(config.request_context);
        assert!(!config.allow_delete_body);
        assert_eq!(
            Some(&"baz".to_string()),
            config.package_map.get("foo/bar.proto")
        );
    }

    #[test]
    fn trailing_comma_and_spaces() {
        let config = Config::from_parameter(" request_context=true , ").unwrap();
        assert!(config.request_context);
    }

    #[test]
    fn package_overrides_accumulate() {
        let config = Config::from_parameter("Ma.proto=x,Mb.proto=y").unwrap();
        assert_eq!(2, config.package_map.len());
        assert_eq!("x", config.package_map["a.proto"]);
        assert_eq!("y", config.package_map["b.proto"]);
    }

    #[test_case("unknown=1" ; "unknown key with value")]
    #[test_case("unknown" ; "bare unknown key")]
    #[test_case("Mfoo.proto" ; "bare package override")]
    #[test_case("request_context=maybe" ; "bad boolean")]
    fn rejected(parameter: &str) {
        assert!(matches!(
            Config::from_parameter(parameter),
            Err(Error::Parameter(_))
        ));
    }

    #[test_case("request_context", true)]
    #[test_case("request_context=1", true)]
    #[test_case("request_context=True", true)]
    #[test_case("request_context=F", false)]
    #[test_case("request_context=0", false)]
    fn booleans(parameter: &str, expected: bool) {
        assert_eq!(
            expected,
            Config::from_parameter(parameter).unwrap().request_context
        );
    }

    #[test]
    fn builder_defaults() {
        let config = ConfigBuilder::default()
            .import_prefix("crate")
            .package_mapping("a.proto", "a")
            .build()
            .unwrap();
        assert_eq!("crate", config.import_prefix);
        assert!(!config.request_context);
        assert_eq!("a", config.package_map["a.proto"]);
    }
}
