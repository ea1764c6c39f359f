//! Error types for varconf
//!
//! Structured errors with context, path information, and actionable help
//! messages. A load either returns a complete configuration mapping or
//! fails with exactly one of these errors; nothing is retried or logged
//! internally.

use std::fmt;

use indexmap::IndexMap;

/// Result type alias for varconf operations
pub type Result<T> = std::result::Result<T, Error>;

/// Per-field validation messages, keyed by dotted field path
/// (e.g., "database.port")
pub type FieldErrors = IndexMap<String, Vec<String>>;

/// Main error type for varconf operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Path in the config where the error occurred (e.g., "database.port")
    pub path: Option<String>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Error decoding YAML input
    Parse,
    /// Error resolving the configuration file source
    Source(SourceErrorKind),
    /// Error substituting variables in a template string
    Interpolation(InterpolationErrorKind),
    /// One or more declared fields failed validation/coercion
    Validation { errors: FieldErrors },
}

/// Specific configuration-source error categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// No configuration file reference could be resolved
    MissingReference { env_var: String },
    /// The resolved file reference does not exist on disk
    ReferenceNotFound { path: String },
}

/// Specific interpolation error categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterpolationErrorKind {
    /// Malformed placeholder; carries the full offending template
    Syntax { template: String },
    /// Variable looked up without a default/error policy was absent
    KeyNotFound { name: String },
    /// Variable required by an error policy was absent or empty;
    /// carries the author-supplied error message
    UnsetVariable { message: String },
}

impl Error {
    /// Create a new parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Parse,
            path: None,
            help: None,
            cause: Some(message.into()),
        }
    }

    /// Create a missing configuration reference error
    pub fn missing_reference(env_var: impl Into<String>) -> Self {
        let var = env_var.into();
        Self {
            kind: ErrorKind::Source(SourceErrorKind::MissingReference { env_var: var.clone() }),
            path: None,
            help: Some(format!(
                "Provide a configuration file path or set the '{}' environment variable",
                var
            )),
            cause: None,
        }
    }

    /// Create a reference not found error
    pub fn reference_not_found(path: impl Into<String>) -> Self {
        let p = path.into();
        Self {
            kind: ErrorKind::Source(SourceErrorKind::ReferenceNotFound { path: p.clone() }),
            path: None,
            help: Some(format!("Check that '{}' exists and is a readable file", p)),
            cause: None,
        }
    }

    /// Create an invalid placeholder syntax error
    pub fn invalid_placeholder(template: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Interpolation(InterpolationErrorKind::Syntax {
                template: template.into(),
            }),
            path: None,
            help: Some(
                "Valid forms are $NAME, ${NAME}, ${NAME:-default}, ${NAME-default}, \
                 ${NAME:?message}, ${NAME?message} and $$ for a literal dollar"
                    .into(),
            ),
            cause: None,
        }
    }

    /// Create a substitution key not found error
    pub fn key_not_found(name: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            kind: ErrorKind::Interpolation(InterpolationErrorKind::KeyNotFound { name: n.clone() }),
            path: None,
            help: Some(format!(
                "Add '{}' to the substitution mapping or provide a default: ${{{}:-default}}",
                n, n
            )),
            cause: None,
        }
    }

    /// Create an unset required variable error
    pub fn unset_variable(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Interpolation(InterpolationErrorKind::UnsetVariable {
                message: message.into(),
            }),
            path: None,
            help: None,
            cause: None,
        }
    }

    /// Create a validation error aggregating all failing fields
    pub fn validation(errors: FieldErrors) -> Self {
        Self {
            kind: ErrorKind::Validation { errors },
            path: None,
            help: Some("Fix the listed values to match the schema requirements".into()),
            cause: None,
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The aggregated field errors, if this is a validation error
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match &self.kind {
            ErrorKind::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Main error message
        match &self.kind {
            ErrorKind::Parse => write!(f, "Parse error")?,
            ErrorKind::Source(s) => match s {
                SourceErrorKind::MissingReference { env_var } => {
                    write!(f, "No configuration file specified ('{}' is unset)", env_var)?
                }
                SourceErrorKind::ReferenceNotFound { path } => {
                    write!(f, "No such configuration file: {}", path)?
                }
            },
            ErrorKind::Interpolation(i) => match i {
                InterpolationErrorKind::Syntax { template } => {
                    write!(f, "Invalid placeholder in template: {}", template)?
                }
                InterpolationErrorKind::KeyNotFound { name } => {
                    write!(f, "No substitution value for variable: {}", name)?
                }
                InterpolationErrorKind::UnsetVariable { message } => {
                    write!(f, "Unset required variable: {}", message)?
                }
            },
            ErrorKind::Validation { errors } => {
                write!(f, "Validation error")?;
                for (path, messages) in errors {
                    for message in messages {
                        write!(f, "\n  {}: {}", path, message)?;
                    }
                }
            }
        }

        // Path context
        if let Some(path) = &self.path {
            write!(f, "\n  Path: {}", path)?;
        }

        // Cause
        if let Some(cause) = &self.cause {
            write!(f, "\n  {}", cause)?;
        }

        // Help
        if let Some(help) = &self.help {
            write!(f, "\n  Help: {}", help)?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_reference_display() {
        let err = Error::missing_reference("CONFIG_FILE");
        let display = format!("{}", err);

        assert!(display.contains("No configuration file specified"));
        assert!(display.contains("CONFIG_FILE"));
        assert!(display.contains("Help:"));
    }

    #[test]
    fn test_reference_not_found_display() {
        let err = Error::reference_not_found("unknown/config/file");
        let display = format!("{}", err);

        assert!(display.contains("No such configuration file: unknown/config/file"));
        assert!(display.contains("Help:"));
    }

    #[test]
    fn test_invalid_placeholder_carries_template() {
        let err = Error::invalid_placeholder("${VARIABLE");

        match &err.kind {
            ErrorKind::Interpolation(InterpolationErrorKind::Syntax { template }) => {
                assert_eq!(template, "${VARIABLE");
            }
            other => panic!("Expected syntax error, got {:?}", other),
        }
        assert!(format!("{}", err).contains("${VARIABLE"));
    }

    #[test]
    fn test_key_not_found_help_suggests_default() {
        let err = Error::key_not_found("MY_VAR");
        let display = format!("{}", err);

        assert!(display.contains("No substitution value for variable: MY_VAR"));
        assert!(display.contains("${MY_VAR:-default}"));
    }

    #[test]
    fn test_unset_variable_carries_message() {
        let err = Error::unset_variable("database url is required");

        match &err.kind {
            ErrorKind::Interpolation(InterpolationErrorKind::UnsetVariable { message }) => {
                assert_eq!(message, "database url is required");
            }
            other => panic!("Expected unset variable error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_lists_all_fields() {
        let mut errors = FieldErrors::new();
        errors.insert("port".into(), vec!["Not a valid integer.".into()]);
        errors.insert(
            "nested.name".into(),
            vec!["Missing data for required field.".into()],
        );
        let err = Error::validation(errors);
        let display = format!("{}", err);

        assert!(display.contains("Validation error"));
        assert!(display.contains("port: Not a valid integer."));
        assert!(display.contains("nested.name: Missing data for required field."));
        assert_eq!(err.field_errors().unwrap().len(), 2);
    }

    #[test]
    fn test_with_path() {
        let err = Error::key_not_found("VAR").with_path("database.host");
        let display = format!("{}", err);

        assert!(display.contains("Path: database.host"));
    }

    #[test]
    fn test_with_help() {
        let err = Error::parse("bad input").with_help("Try fixing the syntax");
        let display = format!("{}", err);

        assert!(display.contains("Help: Try fixing the syntax"));
    }
}
