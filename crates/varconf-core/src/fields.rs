//! Field descriptors for configuration schemas
//!
//! A schema is an ordered list of field descriptors. Each descriptor
//! names a field, declares its expected type, and carries the
//! required/default/alias metadata plus the unwrap-nested flag consumed
//! by the schema pipeline.

use crate::error::FieldErrors;
use crate::schema::Schema;
use crate::value::Value;

/// Expected type of a declared field
#[derive(Debug, Clone)]
pub enum FieldType {
    /// A string value
    Str,
    /// An integer value, coerced from numeric strings
    Int,
    /// A float value, coerced from integers and numeric strings
    Float,
    /// A boolean value; only "true"/"false" strings are coerced
    Bool,
    /// A string value naming an existing filesystem path
    Path,
    /// A nested mapping validated by its own schema
    Nested(Schema),
}

/// A declared field of a configuration schema
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    field_type: FieldType,
    required: bool,
    default: Option<Value>,
    key: Option<String>,
    unwrap_prefix: Option<String>,
}

impl Field {
    /// Declare a field with the given name and expected type
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
            default: None,
            key: None,
            unwrap_prefix: None,
        }
    }

    /// Declare a nested field whose validated entries are merged into the
    /// parent namespace instead of staying under this field's key
    pub fn unwrap_nested(name: impl Into<String>, schema: Schema) -> Self {
        let mut field = Self::new(name, FieldType::Nested(schema));
        field.unwrap_prefix = Some(String::new());
        field
    }

    /// Mark the field as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the value used when the field is missing from input
    pub fn default_value(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Set the external key this field is read from in input data
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the prefix added to every key when unwrapping this field
    ///
    /// Only meaningful on fields declared with [`Field::unwrap_nested`].
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.unwrap_prefix = Some(prefix.into());
        self
    }

    /// The field's name in the output mapping
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key this field is looked up by in input data
    pub fn lookup_key(&self) -> &str {
        self.key.as_deref().unwrap_or(&self.name)
    }

    /// Whether the field must be present in input
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// The default value, if one was declared
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// The unwrap prefix, if this field is declared unwrap-nested
    pub fn unwrap_prefix(&self) -> Option<&str> {
        self.unwrap_prefix.as_deref()
    }

    /// Coerce a value to this field's type
    ///
    /// On failure, records a message under `path` in `errors` and
    /// returns None; validation continues with the remaining fields.
    pub(crate) fn coerce(
        &self,
        value: &Value,
        path: &str,
        errors: &mut FieldErrors,
    ) -> Option<Value> {
        match &self.field_type {
            FieldType::Str => match value {
                Value::String(s) => Some(Value::String(s.clone())),
                _ => fail(errors, path, "Not a valid string."),
            },

            FieldType::Int => match value {
                Value::Integer(i) => Some(Value::Integer(*i)),
                Value::Float(f) if f.fract() == 0.0 => Some(Value::Integer(*f as i64)),
                Value::String(s) => match s.parse::<i64>() {
                    Ok(i) => Some(Value::Integer(i)),
                    Err(_) => fail(errors, path, "Not a valid integer."),
                },
                _ => fail(errors, path, "Not a valid integer."),
            },

            FieldType::Float => match value {
                Value::Float(f) => Some(Value::Float(*f)),
                Value::Integer(i) => Some(Value::Float(*i as f64)),
                Value::String(s) => match s.parse::<f64>() {
                    Ok(f) => Some(Value::Float(f)),
                    Err(_) => fail(errors, path, "Not a valid float."),
                },
                _ => fail(errors, path, "Not a valid float."),
            },

            FieldType::Bool => match value {
                Value::Bool(b) => Some(Value::Bool(*b)),
                Value::String(s) if s.eq_ignore_ascii_case("true") => Some(Value::Bool(true)),
                Value::String(s) if s.eq_ignore_ascii_case("false") => Some(Value::Bool(false)),
                _ => fail(errors, path, "Not a valid boolean."),
            },

            FieldType::Path => match value {
                Value::String(s) => {
                    if std::path::Path::new(s).exists() {
                        Some(Value::String(s.clone()))
                    } else {
                        fail(errors, path, &format!("Path \"{}\" does not exist", s))
                    }
                }
                _ => fail(errors, path, "Not a valid string."),
            },

            FieldType::Nested(schema) => schema.validate_tree(value, path, errors).map(Value::Mapping),
        }
    }
}

fn fail(errors: &mut FieldErrors, path: &str, message: &str) -> Option<Value> {
    errors
        .entry(path.to_string())
        .or_default()
        .push(message.to_string());
    None
}
