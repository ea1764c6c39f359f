//! varconf-core: Configuration loading with variable substitution
//!
//! This crate loads application start-up configuration from YAML files or
//! in-memory values, substitutes docker-compose style `${VAR}`
//! placeholders inside string values, and validates/coerces the result
//! against a declared schema.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use varconf_core::{Field, FieldType, Loader, Schema, Value};
//!
//! let schema = Schema::builder()
//!     .field(Field::new("name", FieldType::Str).required())
//!     .field(Field::new("port", FieldType::Int).default_value(8080))
//!     .build();
//!
//! let mapping = HashMap::from([("APP_NAME".to_string(), "myapp".to_string())]);
//! let loader = Loader::new(schema).with_mapping(mapping);
//!
//! let data: Value = serde_yaml::from_str("name: ${APP_NAME}\n").unwrap();
//! let config = loader.load(&data).unwrap();
//!
//! assert_eq!(config.as_mapping().unwrap()["name"].as_str(), Some("myapp"));
//! assert_eq!(config.as_mapping().unwrap()["port"].as_i64(), Some(8080));
//! ```

pub mod error;
pub mod fields;
pub mod interpolation;
pub mod schema;
pub mod value;

mod loader;

pub use error::{Error, FieldErrors, Result};
pub use fields::{Field, FieldType};
pub use interpolation::{Interpolator, Policy, SubstitutionMapping, Token};
pub use loader::{Loader, YamlLoader, DEFAULT_CONFIG_FILE_ENV_VAR};
pub use schema::Schema;
pub use value::Value;
