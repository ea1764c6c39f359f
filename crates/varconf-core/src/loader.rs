//! Configuration loaders
//!
//! [`Loader`] feeds in-memory data through a schema; [`YamlLoader`]
//! additionally resolves a YAML file source through the explicit-path /
//! environment-variable / default-path fallback chain before decoding.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::interpolation::SubstitutionMapping;
use crate::schema::Schema;
use crate::value::Value;

/// Default environment variable holding the configuration file path
pub const DEFAULT_CONFIG_FILE_ENV_VAR: &str = "CONFIG_FILE";

/// Loads configuration from in-memory data through a schema
///
/// A substitution mapping may be preconfigured for every load, or passed
/// per call (the per-call mapping takes precedence).
pub struct Loader {
    schema: Schema,
    mapping: Option<SubstitutionMapping>,
}

impl Loader {
    /// Create a loader for the given schema, without substitution
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            mapping: None,
        }
    }

    /// Set the substitution mapping used by every load call
    pub fn with_mapping(mut self, mapping: SubstitutionMapping) -> Self {
        self.mapping = Some(mapping);
        self
    }

    /// Load configuration from a value
    pub fn load(&self, data: &Value) -> Result<Value> {
        self.load_with_mapping(data, None)
    }

    /// Load configuration from a value with a per-call mapping override
    pub fn load_with_mapping(
        &self,
        data: &Value,
        mapping: Option<&SubstitutionMapping>,
    ) -> Result<Value> {
        let effective = mapping.or(self.mapping.as_ref());
        self.schema.load(data, effective)
    }
}

/// Loads configuration from a YAML file through a schema
///
/// The effective file is resolved through three fallbacks: the explicit
/// path argument, then the configured environment variable (default
/// `CONFIG_FILE`), then the preconfigured default path.
///
/// # Example
///
/// ```no_run
/// use varconf_core::{Field, FieldType, Schema, YamlLoader};
///
/// let schema = Schema::builder()
///     .field(Field::new("name", FieldType::Str).required())
///     .build();
///
/// let loader = YamlLoader::new(schema).default_config_path("config.yml");
/// let config = loader.load(None)?;
/// # Ok::<(), varconf_core::Error>(())
/// ```
pub struct YamlLoader {
    loader: Loader,
    config_file_env_var: String,
    default_config_path: Option<PathBuf>,
}

impl YamlLoader {
    /// Create a YAML loader for the given schema
    pub fn new(schema: Schema) -> Self {
        Self {
            loader: Loader::new(schema),
            config_file_env_var: DEFAULT_CONFIG_FILE_ENV_VAR.to_string(),
            default_config_path: None,
        }
    }

    /// Set the substitution mapping used by every load call
    pub fn with_mapping(mut self, mapping: SubstitutionMapping) -> Self {
        self.loader = self.loader.with_mapping(mapping);
        self
    }

    /// Set the environment variable read when no explicit path is given
    pub fn config_file_env_var(mut self, var: impl Into<String>) -> Self {
        self.config_file_env_var = var.into();
        self
    }

    /// Set the path used when neither an explicit path nor the
    /// environment variable provides one
    pub fn default_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_config_path = Some(path.into());
        self
    }

    /// Load configuration from a YAML file
    pub fn load(&self, config_file: Option<&Path>) -> Result<Value> {
        self.load_with_mapping(config_file, None)
    }

    /// Load configuration from a YAML file with a per-call mapping
    /// override
    pub fn load_with_mapping(
        &self,
        config_file: Option<&Path>,
        mapping: Option<&SubstitutionMapping>,
    ) -> Result<Value> {
        let path = self.resolve_config_file(config_file)?;
        log::debug!("loading configuration from {}", path.display());

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::parse(format!("Failed to read '{}': {}", path.display(), e))
        })?;
        let data: Value =
            serde_yaml::from_str(&content).map_err(|e| Error::parse(e.to_string()))?;

        self.loader.load_with_mapping(&data, mapping)
    }

    /// Resolve the effective configuration file and check it exists
    fn resolve_config_file(&self, explicit: Option<&Path>) -> Result<PathBuf> {
        let resolved = explicit
            .map(Path::to_path_buf)
            .or_else(|| {
                std::env::var(&self.config_file_env_var)
                    .ok()
                    .filter(|v| !v.is_empty())
                    .map(PathBuf::from)
            })
            .or_else(|| self.default_config_path.clone());

        let path = resolved.ok_or_else(|| Error::missing_reference(&self.config_file_env_var))?;

        if !path.is_file() {
            return Err(Error::reference_not_found(path.display().to_string()));
        }

        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, SourceErrorKind};
    use crate::fields::{Field, FieldType};
    use pretty_assertions::assert_eq;

    fn base_schema() -> Schema {
        Schema::builder()
            .field(Field::new("name", FieldType::Str))
            .field(Field::new("path", FieldType::Str))
            .build()
    }

    fn security_schema() -> Schema {
        Schema::builder()
            .field(Field::new("secret", FieldType::Str))
            .build()
    }

    fn config_schema() -> Schema {
        Schema::builder()
            .field(Field::new("base", FieldType::Nested(base_schema())))
            .field(Field::new("security", FieldType::Nested(security_schema())))
            .build()
    }

    fn test_mapping() -> SubstitutionMapping {
        SubstitutionMapping::from([
            ("PATH".to_string(), "folder/file".to_string()),
            ("SECRET".to_string(), "my-secret".to_string()),
        ])
    }

    const CONFIG_YAML: &str = r#"
base:
  name: App-Name
  path: /home/user/${PATH}
security:
  secret: ${SECRET}
"#;

    fn write_config(dir_name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");
        std::fs::write(&path, CONFIG_YAML).unwrap();
        path
    }

    fn expected_config() -> Value {
        serde_yaml::from_str(
            r#"
base:
  name: App-Name
  path: /home/user/folder/file
security:
  secret: my-secret
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_loader_without_substitution() {
        let loader = Loader::new(config_schema());

        let data: Value = serde_yaml::from_str(
            r#"
base:
  name: App-Name
  path: /home/folder
security:
  secret: my-secret
"#,
        )
        .unwrap();

        assert_eq!(loader.load(&data).unwrap(), data);
    }

    #[test]
    fn test_loader_call_mapping_overrides_preconfigured() {
        let loader = Loader::new(
            Schema::builder()
                .field(Field::new("value", FieldType::Str))
                .build(),
        )
        .with_mapping(SubstitutionMapping::from([(
            "VAR".to_string(),
            "preconfigured".to_string(),
        )]));

        let data: Value = serde_yaml::from_str("value: ${VAR}\n").unwrap();

        let result = loader.load(&data).unwrap();
        assert_eq!(
            result.as_mapping().unwrap()["value"].as_str(),
            Some("preconfigured")
        );

        let call_mapping =
            SubstitutionMapping::from([("VAR".to_string(), "per-call".to_string())]);
        let result = loader.load_with_mapping(&data, Some(&call_mapping)).unwrap();
        assert_eq!(
            result.as_mapping().unwrap()["value"].as_str(),
            Some("per-call")
        );
    }

    #[test]
    fn test_yaml_loader_explicit_path() {
        let path = write_config("varconf_test_loader_explicit");
        let loader = YamlLoader::new(config_schema()).with_mapping(test_mapping());

        assert_eq!(loader.load(Some(path.as_path())).unwrap(), expected_config());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_yaml_loader_from_env_var() {
        let path = write_config("varconf_test_loader_env");
        std::env::set_var("VARCONF_TEST_LOADER_ENV", &path);

        let loader = YamlLoader::new(config_schema())
            .with_mapping(test_mapping())
            .config_file_env_var("VARCONF_TEST_LOADER_ENV");

        assert_eq!(loader.load(None).unwrap(), expected_config());

        std::env::remove_var("VARCONF_TEST_LOADER_ENV");
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_yaml_loader_default_path() {
        let path = write_config("varconf_test_loader_default");

        let loader = YamlLoader::new(config_schema())
            .with_mapping(test_mapping())
            .config_file_env_var("VARCONF_TEST_LOADER_UNSET")
            .default_config_path(&path);

        assert_eq!(loader.load(None).unwrap(), expected_config());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_yaml_loader_missing_reference() {
        let loader = YamlLoader::new(config_schema())
            .config_file_env_var("VARCONF_TEST_LOADER_MISSING");

        let err = loader.load(None).unwrap_err();
        match &err.kind {
            ErrorKind::Source(SourceErrorKind::MissingReference { env_var }) => {
                assert_eq!(env_var, "VARCONF_TEST_LOADER_MISSING");
            }
            other => panic!("Expected missing reference error, got {:?}", other),
        }
        // The message names the environment variable that was checked
        assert!(format!("{}", err).contains("VARCONF_TEST_LOADER_MISSING"));
    }

    #[test]
    fn test_yaml_loader_reference_not_found() {
        let loader = YamlLoader::new(config_schema());

        let err = loader
            .load(Some(Path::new("unknown/config/file")))
            .unwrap_err();
        match &err.kind {
            ErrorKind::Source(SourceErrorKind::ReferenceNotFound { path }) => {
                assert_eq!(path, "unknown/config/file");
            }
            other => panic!("Expected reference not found error, got {:?}", other),
        }
    }

    #[test]
    fn test_yaml_loader_invalid_yaml() {
        let dir = std::env::temp_dir().join("varconf_test_loader_invalid");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.yml");
        std::fs::write(&path, "base: [unclosed\n").unwrap();

        let loader = YamlLoader::new(config_schema());
        let err = loader.load(Some(path.as_path())).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);

        std::fs::remove_dir_all(&dir).ok();
    }
}
