//! Placeholder parsing and variable substitution
//!
//! Parses docker-compose style substitution expressions inside string
//! values:
//! - `$VAR` / `${VAR}` - direct substitution, the variable must be set
//! - `${VAR:-default}` - default if the variable is unset or empty
//! - `${VAR-default}` - default if the variable is unset
//! - `${VAR:?message}` - error if the variable is unset or empty
//! - `${VAR?message}` - error if the variable is unset
//! - `$$` - escaped (literal) dollar sign
//!
//! Substitution is single-pass: a substituted value is never re-scanned
//! for further placeholders.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::value::Value;

/// Mapping from variable name to substitution value, supplied by the
/// caller for the lifetime of one load operation
pub type SubstitutionMapping = HashMap<String, String>;

/// Default/error policy attached to a braced placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    /// No separator: the variable must be present in the mapping
    Direct,
    /// `:-` separator: fall back to the default when unset or empty
    DefaultIfEmpty(String),
    /// `-` separator: fall back to the default only when unset
    DefaultIfUnset(String),
    /// `:?` separator: fail with the message when unset or empty
    ErrorIfEmpty(String),
    /// `?` separator: fail with the message only when unset
    ErrorIfUnset(String),
}

/// A parsed unit of a template string
///
/// Tokens cover the input exactly once, in order, with no overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A run of literal text containing no dollar sign
    Literal(String),
    /// An escaped `$$`, resolving to a literal dollar
    Dollar,
    /// A `$NAME` or `${NAME...}` placeholder
    Placeholder {
        /// Variable name, matching `[_A-Za-z][_A-Za-z0-9]*`
        name: String,
        /// Substitution policy derived from the separator
        policy: Policy,
    },
}

/// Parser for template strings
///
/// Scans left to right with longest-match greedy names. Any `$`-prefixed
/// sequence that is not a valid placeholder fails the whole template with
/// a syntax error carrying the full input.
pub struct TemplateParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> TemplateParser<'a> {
    /// Create a new parser for the given input
    pub fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Tokenize the entire input string
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();

        while !self.is_eof() {
            if self.current() == Some('$') {
                tokens.push(self.parse_placeholder()?);
            } else {
                tokens.push(Token::Literal(self.collect_literal()));
            }
        }

        Ok(tokens)
    }

    /// Check if we're at end of input
    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Get current character
    fn current(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Advance by one character
    fn advance(&mut self) {
        if let Some(c) = self.current() {
            self.pos += c.len_utf8();
        }
    }

    /// Consume the expected character, returning whether it was present
    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume the expected two-character separator if present
    fn eat_separator(&mut self, separator: &str) -> bool {
        if self.input[self.pos..].starts_with(separator) {
            self.pos += separator.len();
            true
        } else {
            false
        }
    }

    /// Collect literal text until the next dollar sign or end of input
    fn collect_literal(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.current() {
            if c == '$' {
                break;
            }
            self.advance();
        }
        self.input[start..self.pos].to_string()
    }

    /// Parse a placeholder (starting at `$`)
    fn parse_placeholder(&mut self) -> Result<Token> {
        self.advance(); // $

        match self.current() {
            Some('$') => {
                self.advance();
                Ok(Token::Dollar)
            }
            Some('{') => {
                self.advance();
                self.parse_braced()
            }
            Some(c) if is_name_start(c) => Ok(Token::Placeholder {
                name: self.collect_name(),
                policy: Policy::Direct,
            }),
            _ => Err(self.syntax_error()),
        }
    }

    /// Parse a braced placeholder body (after `${`)
    ///
    /// Two-character separators are tried before one-character ones so
    /// that `:-` and `:?` never parse as a bare `-` or `?`.
    fn parse_braced(&mut self) -> Result<Token> {
        let name = self.collect_name();
        if name.is_empty() {
            return Err(self.syntax_error());
        }

        let policy = if self.eat('}') {
            Policy::Direct
        } else if self.eat_separator(":-") {
            Policy::DefaultIfEmpty(self.collect_remainder()?)
        } else if self.eat_separator(":?") {
            Policy::ErrorIfEmpty(self.collect_remainder()?)
        } else if self.eat('-') {
            Policy::DefaultIfUnset(self.collect_remainder()?)
        } else if self.eat('?') {
            Policy::ErrorIfUnset(self.collect_remainder()?)
        } else {
            return Err(self.syntax_error());
        };

        Ok(Token::Placeholder { name, policy })
    }

    /// Collect the text between a separator and the closing brace
    fn collect_remainder(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.current() {
            if c == '}' {
                let remainder = self.input[start..self.pos].to_string();
                self.advance();
                return Ok(remainder);
            }
            self.advance();
        }
        Err(self.syntax_error())
    }

    /// Collect a variable name (longest match)
    fn collect_name(&mut self) -> String {
        let start = self.pos;
        if let Some(c) = self.current() {
            if is_name_start(c) {
                self.advance();
                while let Some(c) = self.current() {
                    if !is_name_continue(c) {
                        break;
                    }
                    self.advance();
                }
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn syntax_error(&self) -> Error {
        Error::invalid_placeholder(self.input)
    }
}

fn is_name_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_name_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Tokenize a template string
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    TemplateParser::new(input).tokenize()
}

/// Resolve a single placeholder against the substitution mapping
fn resolve_placeholder(
    name: &str,
    policy: &Policy,
    mapping: &SubstitutionMapping,
) -> Result<String> {
    let value = mapping.get(name);

    match policy {
        Policy::Direct => value.cloned().ok_or_else(|| Error::key_not_found(name)),

        Policy::DefaultIfEmpty(default) => Ok(match value {
            Some(v) if !v.is_empty() => v.clone(),
            _ => default.clone(),
        }),

        Policy::DefaultIfUnset(default) => Ok(value.cloned().unwrap_or_else(|| default.clone())),

        Policy::ErrorIfEmpty(message) => match value {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            _ => Err(Error::unset_variable(message)),
        },

        Policy::ErrorIfUnset(message) => value
            .cloned()
            .ok_or_else(|| Error::unset_variable(message)),
    }
}

/// Substitutes variables in strings and in arbitrarily nested values
///
/// The interpolator only reads the mapping; inputs are never mutated.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use varconf_core::Interpolator;
///
/// let mapping = HashMap::from([("VARIABLE".to_string(), "value".to_string())]);
/// let interpolator = Interpolator::new(&mapping);
///
/// assert_eq!(
///     interpolator.interpolate("${VARIABLE} in complex string").unwrap(),
///     "value in complex string"
/// );
/// ```
pub struct Interpolator<'a> {
    mapping: &'a SubstitutionMapping,
}

impl<'a> Interpolator<'a> {
    /// Create an interpolator reading from the given mapping
    pub fn new(mapping: &'a SubstitutionMapping) -> Self {
        Self { mapping }
    }

    /// Substitute variables in a single string
    pub fn interpolate(&self, template: &str) -> Result<String> {
        // Strings without a dollar sign are returned as-is
        if !template.contains('$') {
            return Ok(template.to_string());
        }

        let tokens = tokenize(template)?;
        let mut result = String::with_capacity(template.len());

        for token in &tokens {
            match token {
                Token::Literal(text) => result.push_str(text),
                Token::Dollar => result.push('$'),
                Token::Placeholder { name, policy } => {
                    result.push_str(&resolve_placeholder(name, policy, self.mapping)?)
                }
            }
        }

        Ok(result)
    }

    /// Substitute variables in an arbitrarily nested value
    ///
    /// The result mirrors the input structure: strings are interpolated,
    /// mapping keys are preserved as-is (only values are substituted),
    /// sequence order is preserved, and all other scalars pass through
    /// unchanged.
    pub fn interpolate_value(&self, value: &Value) -> Result<Value> {
        self.interpolate_at(value, "")
    }

    fn interpolate_at(&self, value: &Value, path: &str) -> Result<Value> {
        match value {
            Value::String(s) => self.interpolate(s).map(Value::String).map_err(|e| {
                if path.is_empty() {
                    e
                } else {
                    e.with_path(path)
                }
            }),
            Value::Sequence(seq) => {
                let mut result = Vec::with_capacity(seq.len());
                for (i, item) in seq.iter().enumerate() {
                    let item_path = format!("{}[{}]", path, i);
                    result.push(self.interpolate_at(item, &item_path)?);
                }
                Ok(Value::Sequence(result))
            }
            Value::Mapping(map) => {
                let mut result = indexmap::IndexMap::with_capacity(map.len());
                for (key, val) in map {
                    let key_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };
                    result.insert(key.clone(), self.interpolate_at(val, &key_path)?);
                }
                Ok(Value::Mapping(result))
            }
            other => Ok(other.clone()),
        }
    }
}
