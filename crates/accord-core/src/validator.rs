//! The validator adapter.
//!
//! Every schema in a contract is held behind [`SchemaValidator`], so the
//! rest of the workspace never depends on a particular validation library.
//! A validator receives a JSON value and either returns the value to use
//! downstream (possibly coerced, defaulted or stripped) or a list of
//! [`Issue`]s.
//!
//! The built-in [`Schema`](crate::Schema) implements the trait; so can any
//! user type, including validators that need to await something.
//!
//! ```
//! use accord_core::{FnValidator, Issue, Issues, SchemaValidator, ValidationMode};
//! use serde_json::json;
//!
//! let even = FnValidator::new("even number", |value: serde_json::Value, _mode| match value.as_i64() {
//!     Some(n) if n % 2 == 0 => Ok(value),
//!     _ => Err(Issues::single(Issue::new("not_even", "Expected an even number"))),
//! });
//!
//! # tokio_test::block_on(async {
//! assert!(even.validate(json!(4), ValidationMode::Strip).await.is_ok());
//! assert!(even.validate(json!(3), ValidationMode::Strip).await.is_err());
//! # });
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Shared handle to a validator.
pub type SchemaRef = Arc<dyn SchemaValidator>;

/// How a validator treats object keys it does not declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationMode {
    /// Undeclared keys are removed from the output.
    #[default]
    Strip,
    /// Undeclared keys are copied to the output unchanged.
    Passthrough,
}

/// A pluggable validator.
#[async_trait]
pub trait SchemaValidator: Send + Sync + fmt::Debug {
    /// Validates `value`, returning the value handlers should see.
    async fn validate(&self, value: Value, mode: ValidationMode) -> Result<Value, Issues>;

    /// Returns true when the object field `key` expects an array.
    ///
    /// Query decoding uses this to collect repeated keys into a list.
    fn is_array_field(&self, _key: &str) -> bool {
        false
    }

    /// Short human-readable description, used in logs.
    fn describe(&self) -> String {
        "custom validator".to_string()
    }
}

/// Converts validators and shared handles into a [`SchemaRef`].
pub trait IntoSchemaRef {
    /// Performs the conversion.
    fn into_schema_ref(self) -> SchemaRef;
}

impl<T: SchemaValidator + 'static> IntoSchemaRef for T {
    fn into_schema_ref(self) -> SchemaRef {
        Arc::new(self)
    }
}

impl IntoSchemaRef for SchemaRef {
    fn into_schema_ref(self) -> SchemaRef {
        self
    }
}

/// One step of an issue path: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathItem {
    /// Array index.
    Index(usize),
    /// Object key.
    Key(String),
}

impl fmt::Display for PathItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "{index}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for PathItem {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathItem {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathItem {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Issue codes produced by the built-in schema and the request pipeline.
pub mod codes {
    /// Wrong JSON type.
    pub const INVALID_TYPE: &str = "invalid_type";
    /// Required value missing.
    pub const REQUIRED: &str = "required";
    /// Below a minimum (length, items or value).
    pub const TOO_SMALL: &str = "too_small";
    /// Above a maximum (length, items or value).
    pub const TOO_BIG: &str = "too_big";
    /// Literal mismatch.
    pub const INVALID_LITERAL: &str = "invalid_literal";
    /// Value outside an enumeration.
    pub const INVALID_ENUM_VALUE: &str = "invalid_enum_value";
    /// Body could not be parsed as JSON.
    pub const INVALID_JSON: &str = "invalid_json";
    /// Body is not valid UTF-8.
    pub const INVALID_ENCODING: &str = "invalid_encoding";
    /// Custom validator failure.
    pub const CUSTOM: &str = "custom";
}

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Location of the failing value, outermost first.
    pub path: Vec<PathItem>,
    /// Machine-readable code, see [`codes`].
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl Issue {
    /// Creates an issue at the root of the validated value.
    #[must_use]
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: Vec::new(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Sets the issue path.
    #[must_use]
    pub fn at<I, P>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathItem>,
    {
        self.path = path.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the path joined with dots, for logs and messages.
    #[must_use]
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            f.write_str(&self.message)
        } else {
            write!(f, "{}: {}", self.dotted_path(), self.message)
        }
    }
}

/// All issues reported for one validated value.
///
/// Serializes as `{"issues": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{}", summary(.issues))]
pub struct Issues {
    /// The issues, in the order they were found.
    pub issues: Vec<Issue>,
}

fn summary(issues: &[Issue]) -> String {
    if issues.is_empty() {
        return "no issues".to_string();
    }
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Issues {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list holding one issue.
    #[must_use]
    pub fn single(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }

    /// Appends an issue.
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    /// Returns true if there are no issues.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// Returns the number of issues.
    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Iterates over the issues.
    pub fn iter(&self) -> std::slice::Iter<'_, Issue> {
        self.issues.iter()
    }

    /// Converts to `Err(self)` when any issue was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl From<Vec<Issue>> for Issues {
    fn from(issues: Vec<Issue>) -> Self {
        Self { issues }
    }
}

impl<'a> IntoIterator for &'a Issues {
    type Item = &'a Issue;
    type IntoIter = std::slice::Iter<'a, Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.iter()
    }
}

/// A synchronous validator built from a closure.
pub struct FnValidator<F> {
    name: String,
    func: F,
}

impl<F> FnValidator<F>
where
    F: Fn(Value, ValidationMode) -> Result<Value, Issues> + Send + Sync,
{
    /// Wraps `func`; `name` is returned by [`SchemaValidator::describe`].
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnValidator<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnValidator")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> SchemaValidator for FnValidator<F>
where
    F: Fn(Value, ValidationMode) -> Result<Value, Issues> + Send + Sync,
{
    async fn validate(&self, value: Value, mode: ValidationMode) -> Result<Value, Issues> {
        (self.func)(value, mode)
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}
