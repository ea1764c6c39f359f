//! Schema composition for configuration loading
//!
//! A schema combines three independent concerns into one fixed pipeline,
//! each a discrete mapping-in/mapping-out stage applied in order:
//!
//! 1. variable interpolation over the raw input (when a substitution
//!    mapping is configured),
//! 2. validation/coercion of declared fields with aggregated per-field
//!    errors,
//! 3. preservation of input fields the schema does not declare,
//! 4. unwrapping of designated nested fields into the parent namespace.

use indexmap::IndexMap;

use crate::error::{Error, FieldErrors, Result};
use crate::fields::Field;
use crate::interpolation::{Interpolator, SubstitutionMapping};
use crate::value::Value;

/// Path key used for errors reported against the root value
const ROOT_PATH: &str = "<root>";

/// An ordered set of declared fields plus the load pipeline
///
/// Schemas are immutable once built and safe to reuse across loads.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use varconf_core::{Field, FieldType, Schema, Value};
///
/// let schema = Schema::builder()
///     .field(Field::new("setting1", FieldType::Str))
///     .field(Field::new("setting2", FieldType::Int).required())
///     .field(Field::new("setting3", FieldType::Float).default_value(13.2))
///     .build();
///
/// let mapping = HashMap::from([("VARIABLE".to_string(), "substitution".to_string())]);
/// let data: Value = serde_yaml::from_str(
///     "setting1: ${VARIABLE}\nsetting2: '${UNSET_VARIABLE:-1}'\n",
/// ).unwrap();
///
/// let config = schema.load(&data, Some(&mapping)).unwrap();
/// let map = config.as_mapping().unwrap();
/// assert_eq!(map["setting1"].as_str(), Some("substitution"));
/// assert_eq!(map["setting2"].as_i64(), Some(1));
/// assert_eq!(map["setting3"].as_f64(), Some(13.2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

/// Builder for [`Schema`]
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Declare a field
    ///
    /// Declaration order is significant: it drives output ordering and
    /// the last-applied-wins resolution of unwrap key collisions.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Finish building the schema
    pub fn build(self) -> Schema {
        Schema {
            fields: self.fields,
        }
    }
}

impl Schema {
    /// Create a schema builder
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    /// The declared fields, in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Run the full pipeline over raw input data
    ///
    /// Interpolation is skipped entirely when `mapping` is None. A
    /// configured-but-empty mapping still interpolates, and will fail
    /// lookups for any direct placeholder; the two cases are observably
    /// different on purpose.
    ///
    /// Returns the final configuration mapping, or the first
    /// interpolation error, or a validation error aggregating every
    /// failing field.
    pub fn load(&self, data: &Value, mapping: Option<&SubstitutionMapping>) -> Result<Value> {
        let interpolated;
        let data = match mapping {
            Some(mapping) => {
                interpolated = Interpolator::new(mapping).interpolate_value(data)?;
                &interpolated
            }
            None => data,
        };

        let mut errors = FieldErrors::new();
        let output = self.validate_tree(data, "", &mut errors);

        if !errors.is_empty() {
            return Err(Error::validation(errors));
        }

        // errors is empty, so validate_tree produced a mapping
        Ok(Value::Mapping(output.unwrap_or_default()))
    }

    /// Validation, extra-field, and unwrap stages for one mapping level
    ///
    /// Nested schemas recurse through here (never through `load`, so
    /// interpolation runs once over the whole tree, at the top). Returns
    /// None after recording an error when `data` is not a mapping.
    pub(crate) fn validate_tree(
        &self,
        data: &Value,
        path: &str,
        errors: &mut FieldErrors,
    ) -> Option<IndexMap<String, Value>> {
        let input = match data.as_mapping() {
            Some(map) => map,
            None => {
                let at = if path.is_empty() { ROOT_PATH } else { path };
                errors
                    .entry(at.to_string())
                    .or_default()
                    .push("Not a valid mapping.".to_string());
                return None;
            }
        };

        let output = self.validate_fields(input, path, errors);
        let output = self.merge_extra_fields(input, output);
        Some(self.unwrap_nested_fields(output))
    }

    /// Coerce declared fields, collecting all errors before failing
    fn validate_fields(
        &self,
        input: &IndexMap<String, Value>,
        path: &str,
        errors: &mut FieldErrors,
    ) -> IndexMap<String, Value> {
        let mut output = IndexMap::new();

        for field in &self.fields {
            let field_path = join_path(path, field.name());

            match input.get(field.lookup_key()) {
                Some(value) => {
                    if let Some(coerced) = field.coerce(value, &field_path, errors) {
                        output.insert(field.name().to_string(), coerced);
                    }
                }
                None => {
                    if let Some(default) = field.default() {
                        output.insert(field.name().to_string(), default.clone());
                    } else if field.is_required() {
                        errors
                            .entry(field_path)
                            .or_default()
                            .push("Missing data for required field.".to_string());
                    }
                }
            }
        }

        output
    }

    /// Copy input entries no declared field consumed, unmodified
    fn merge_extra_fields(
        &self,
        input: &IndexMap<String, Value>,
        mut output: IndexMap<String, Value>,
    ) -> IndexMap<String, Value> {
        for (key, value) in input {
            let consumed = self.fields.iter().any(|f| f.lookup_key() == key.as_str());
            // Declared fields take precedence over same-named raw entries
            if consumed || output.contains_key(key) {
                continue;
            }
            output.insert(key.clone(), value.clone());
        }
        output
    }

    /// Flatten unwrap-nested fields into the parent namespace
    ///
    /// Applied in declared-field order; on key collision the
    /// last-applied entry wins.
    fn unwrap_nested_fields(
        &self,
        mut output: IndexMap<String, Value>,
    ) -> IndexMap<String, Value> {
        for field in &self.fields {
            let Some(prefix) = field.unwrap_prefix() else {
                continue;
            };
            // Absent optional unwrap fields are skipped
            if let Some(Value::Mapping(inner)) = output.shift_remove(field.name()) {
                for (key, value) in inner {
                    output.insert(format!("{}{}", prefix, key), value);
                }
            }
        }
        output
    }
}

fn join_path(path: &str, name: &str) -> String {
    if path.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", path, name)
    }
}
