//! Built-in JSON schema.
//!
//! [`Schema`] covers the shapes contracts usually need: scalars, arrays,
//! objects, literals and string enumerations, each optionally nullable,
//! optional, defaulted or coercing from strings. Validation walks the whole
//! value and reports every issue it finds.
//!
//! # Example
//!
//! ```
//! use accord_core::{Schema, SchemaValidator, ValidationMode};
//! use serde_json::json;
//!
//! let query = Schema::object([
//!     ("take", Schema::integer().minimum(1).coerce()),
//!     ("tags", Schema::array(Schema::string()).optional()),
//! ]);
//!
//! # tokio_test::block_on(async {
//! let value = query
//!     .validate(json!({"take": "10", "debug": "1"}), ValidationMode::Strip)
//!     .await
//!     .unwrap();
//! assert_eq!(value, json!({"take": 10}));
//! # });
//! ```

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

use crate::validator::{codes, Issue, Issues, PathItem, SchemaValidator, ValidationMode};

/// The type-specific part of a [`Schema`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SchemaKind {
    /// A string.
    String {
        /// Minimum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_length: Option<usize>,
        /// Maximum length in characters.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_length: Option<usize>,
    },
    /// A whole number.
    Integer {
        /// Inclusive minimum.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<i64>,
        /// Inclusive maximum.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<i64>,
    },
    /// Any finite number.
    Number {
        /// Inclusive minimum.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        minimum: Option<f64>,
        /// Inclusive maximum.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        maximum: Option<f64>,
    },
    /// `true` or `false`.
    Boolean,
    /// A list whose items match one schema.
    Array {
        /// Item schema.
        items: Box<Schema>,
        /// Minimum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_items: Option<usize>,
        /// Maximum number of items.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_items: Option<usize>,
    },
    /// An object with declared properties, in declaration order.
    Object {
        /// Property schemas.
        properties: IndexMap<String, Schema>,
    },
    /// Exactly one JSON value.
    Literal {
        /// The accepted value.
        value: Value,
    },
    /// One of a fixed set of strings.
    Enum {
        /// The accepted strings.
        values: Vec<String>,
    },
    /// Anything.
    Any,
    /// Only `null`.
    Null,
}

/// A JSON schema with modifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(flatten)]
    kind: SchemaKind,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default: Option<Value>,
    #[serde(default)]
    coerce: bool,
}

impl Schema {
    fn of(kind: SchemaKind) -> Self {
        Self {
            kind,
            optional: false,
            nullable: false,
            default: None,
            coerce: false,
        }
    }

    /// A string schema.
    #[must_use]
    pub fn string() -> Self {
        Self::of(SchemaKind::String {
            min_length: None,
            max_length: None,
        })
    }

    /// An integer schema.
    #[must_use]
    pub fn integer() -> Self {
        Self::of(SchemaKind::Integer {
            minimum: None,
            maximum: None,
        })
    }

    /// A number schema.
    #[must_use]
    pub fn number() -> Self {
        Self::of(SchemaKind::Number {
            minimum: None,
            maximum: None,
        })
    }

    /// A boolean schema.
    #[must_use]
    pub fn boolean() -> Self {
        Self::of(SchemaKind::Boolean)
    }

    /// An array schema.
    #[must_use]
    pub fn array(items: Self) -> Self {
        Self::of(SchemaKind::Array {
            items: Box::new(items),
            min_items: None,
            max_items: None,
        })
    }

    /// An object schema. Properties are required unless marked optional.
    #[must_use]
    pub fn object<I, K>(properties: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::of(SchemaKind::Object {
            properties: properties
                .into_iter()
                .map(|(name, schema)| (name.into(), schema))
                .collect(),
        })
    }

    /// A schema accepting exactly `value`.
    #[must_use]
    pub fn literal(value: impl Into<Value>) -> Self {
        Self::of(SchemaKind::Literal {
            value: value.into(),
        })
    }

    /// A schema accepting one of `values`.
    #[must_use]
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::of(SchemaKind::Enum {
            values: values.into_iter().map(Into::into).collect(),
        })
    }

    /// A schema accepting any value.
    #[must_use]
    pub fn any() -> Self {
        Self::of(SchemaKind::Any)
    }

    /// A schema accepting only `null`.
    #[must_use]
    pub fn null() -> Self {
        Self::of(SchemaKind::Null)
    }

    /// Allows the value to be absent.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Allows `null`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Substitutes `value` when the value is absent.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Converts strings to the expected scalar type before checking, here and
    /// in every nested schema. A single value given where an array is
    /// expected becomes a one-item array.
    #[must_use]
    pub fn coerce(mut self) -> Self {
        self.coerce = true;
        match &mut self.kind {
            SchemaKind::Array { items, .. } => {
                let inner = std::mem::replace(items.as_mut(), Self::any());
                **items = inner.coerce();
            }
            SchemaKind::Object { properties } => {
                for schema in properties.values_mut() {
                    let inner = std::mem::replace(schema, Self::any());
                    *schema = inner.coerce();
                }
            }
            _ => {}
        }
        self
    }

    /// Sets the minimum string length. No effect on other kinds.
    #[must_use]
    pub fn min_length(mut self, min: usize) -> Self {
        if let SchemaKind::String { min_length, .. } = &mut self.kind {
            *min_length = Some(min);
        }
        self
    }

    /// Sets the maximum string length. No effect on other kinds.
    #[must_use]
    pub fn max_length(mut self, max: usize) -> Self {
        if let SchemaKind::String { max_length, .. } = &mut self.kind {
            *max_length = Some(max);
        }
        self
    }

    /// Sets the inclusive minimum of an integer or number schema.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn minimum(mut self, min: i64) -> Self {
        match &mut self.kind {
            SchemaKind::Integer { minimum, .. } => *minimum = Some(min),
            SchemaKind::Number { minimum, .. } => *minimum = Some(min as f64),
            _ => {}
        }
        self
    }

    /// Sets the inclusive maximum of an integer or number schema.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn maximum(mut self, max: i64) -> Self {
        match &mut self.kind {
            SchemaKind::Integer { maximum, .. } => *maximum = Some(max),
            SchemaKind::Number { maximum, .. } => *maximum = Some(max as f64),
            _ => {}
        }
        self
    }

    /// Sets the minimum number of array items.
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        if let SchemaKind::Array { min_items, .. } = &mut self.kind {
            *min_items = Some(min);
        }
        self
    }

    /// Sets the maximum number of array items.
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        if let SchemaKind::Array { max_items, .. } = &mut self.kind {
            *max_items = Some(max);
        }
        self
    }

    /// Returns the type-specific part.
    #[must_use]
    pub fn kind(&self) -> &SchemaKind {
        &self.kind
    }

    /// Returns true if the value may be absent.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional || self.default.is_some()
    }

    /// Returns the schema of an object property.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Self> {
        match &self.kind {
            SchemaKind::Object { properties } => properties.get(name),
            _ => None,
        }
    }

    /// Validates synchronously.
    ///
    /// ```
    /// use accord_core::{Schema, ValidationMode};
    /// use serde_json::json;
    ///
    /// let schema = Schema::string().min_length(1);
    /// assert!(schema.check(json!("hello"), ValidationMode::Strip).is_ok());
    /// assert!(schema.check(json!(""), ValidationMode::Strip).is_err());
    /// assert!(schema.check(json!(null), ValidationMode::Strip).is_err());
    /// ```
    pub fn check(&self, value: Value, mode: ValidationMode) -> Result<Value, Issues> {
        let input = if value.is_null() && self.is_optional() && !self.nullable {
            None
        } else {
            Some(value)
        };

        let mut walker = Walker {
            mode,
            path: Vec::new(),
            issues: Issues::new(),
        };
        let output = walker.visit(self, input).unwrap_or(Value::Null);
        walker.issues.into_result(output)
    }

    fn type_name(&self) -> &'static str {
        match &self.kind {
            SchemaKind::String { .. } | SchemaKind::Enum { .. } => "string",
            SchemaKind::Integer { .. } => "integer",
            SchemaKind::Number { .. } => "number",
            SchemaKind::Boolean => "boolean",
            SchemaKind::Array { .. } => "array",
            SchemaKind::Object { .. } => "object",
            SchemaKind::Literal { .. } | SchemaKind::Any => "value",
            SchemaKind::Null => "null",
        }
    }
}

#[async_trait]
impl SchemaValidator for Schema {
    async fn validate(&self, value: Value, mode: ValidationMode) -> Result<Value, Issues> {
        self.check(value, mode)
    }

    fn is_array_field(&self, key: &str) -> bool {
        self.property(key)
            .is_some_and(|schema| matches!(schema.kind, SchemaKind::Array { .. }))
    }

    fn describe(&self) -> String {
        format!("{} schema", self.type_name())
    }
}

struct Walker {
    mode: ValidationMode,
    path: Vec<PathItem>,
    issues: Issues,
}

impl Walker {
    fn report(&mut self, code: &str, message: impl Into<String>) {
        self.issues.push(Issue {
            path: self.path.clone(),
            code: code.to_string(),
            message: message.into(),
        });
    }

    fn invalid_type(&mut self, schema: &Schema, value: &Value) {
        let message = format!(
            "Expected {}, received {}",
            schema.type_name(),
            value_type_name(value)
        );
        self.report(codes::INVALID_TYPE, message);
    }

    /// Returns the output value, or `None` when the value is absent and
    /// should stay absent.
    fn visit(&mut self, schema: &Schema, value: Option<Value>) -> Option<Value> {
        let Some(value) = value else {
            if let Some(default) = &schema.default {
                return Some(default.clone());
            }
            if !schema.optional {
                self.report(codes::REQUIRED, "Required");
            }
            return None;
        };

        if value.is_null()
            && (schema.nullable || matches!(schema.kind, SchemaKind::Null | SchemaKind::Any))
        {
            return Some(Value::Null);
        }

        match &schema.kind {
            SchemaKind::String {
                min_length,
                max_length,
            } => self.visit_string(schema, value, *min_length, *max_length),
            SchemaKind::Integer { minimum, maximum } => {
                self.visit_integer(schema, value, *minimum, *maximum)
            }
            SchemaKind::Number { minimum, maximum } => {
                self.visit_number(schema, value, *minimum, *maximum)
            }
            SchemaKind::Boolean => self.visit_boolean(schema, value),
            SchemaKind::Array {
                items,
                min_items,
                max_items,
            } => self.visit_array(schema, value, items, *min_items, *max_items),
            SchemaKind::Object { properties } => self.visit_object(schema, value, properties),
            SchemaKind::Literal { value: expected } => {
                let coerced = match value {
                    Value::String(s) if schema.coerce && !expected.is_string() => {
                        serde_json::from_str::<Value>(&s).unwrap_or(Value::String(s))
                    }
                    other => other,
                };
                if &coerced == expected {
                    Some(coerced)
                } else {
                    self.report(
                        codes::INVALID_LITERAL,
                        format!("Invalid literal value, expected {expected}"),
                    );
                    None
                }
            }
            SchemaKind::Enum { values } => match value.as_str() {
                Some(s) if values.iter().any(|v| v == s) => Some(value),
                Some(s) => {
                    let expected = values
                        .iter()
                        .map(|v| format!("'{v}'"))
                        .collect::<Vec<_>>()
                        .join(" | ");
                    self.report(
                        codes::INVALID_ENUM_VALUE,
                        format!("Invalid enum value. Expected {expected}, received '{s}'"),
                    );
                    None
                }
                None => {
                    self.invalid_type(schema, &value);
                    None
                }
            },
            SchemaKind::Any => Some(value),
            SchemaKind::Null => {
                self.invalid_type(schema, &value);
                None
            }
        }
    }

    fn visit_string(
        &mut self,
        schema: &Schema,
        value: Value,
        min_length: Option<usize>,
        max_length: Option<usize>,
    ) -> Option<Value> {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) if schema.coerce => n.to_string(),
            Value::Bool(b) if schema.coerce => b.to_string(),
            other => {
                self.invalid_type(schema, &other);
                return None;
            }
        };

        let length = text.chars().count();
        if let Some(min) = min_length {
            if length < min {
                self.report(
                    codes::TOO_SMALL,
                    format!("String must contain at least {min} character(s)"),
                );
            }
        }
        if let Some(max) = max_length {
            if length > max {
                self.report(
                    codes::TOO_BIG,
                    format!("String must contain at most {max} character(s)"),
                );
            }
        }
        Some(Value::String(text))
    }

    fn visit_integer(
        &mut self,
        schema: &Schema,
        value: Value,
        minimum: Option<i64>,
        maximum: Option<i64>,
    ) -> Option<Value> {
        let parsed = match &value {
            Value::Number(n) => as_whole_number(n),
            Value::String(s) if schema.coerce => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        let Some(n) = parsed else {
            if value.is_number() {
                self.report(codes::INVALID_TYPE, "Expected integer, received float");
            } else {
                self.invalid_type(schema, &value);
            }
            return None;
        };

        if let Some(min) = minimum {
            if n < min {
                self.report(
                    codes::TOO_SMALL,
                    format!("Number must be greater than or equal to {min}"),
                );
            }
        }
        if let Some(max) = maximum {
            if n > max {
                self.report(
                    codes::TOO_BIG,
                    format!("Number must be less than or equal to {max}"),
                );
            }
        }
        Some(Value::from(n))
    }

    fn visit_number(
        &mut self,
        schema: &Schema,
        value: Value,
        minimum: Option<f64>,
        maximum: Option<f64>,
    ) -> Option<Value> {
        let number = match value {
            Value::Number(n) => n,
            Value::String(ref s) if schema.coerce => match parse_number(s) {
                Some(n) => n,
                None => {
                    self.invalid_type(schema, &value);
                    return None;
                }
            },
            other => {
                self.invalid_type(schema, &other);
                return None;
            }
        };

        let n = number.as_f64().unwrap_or(f64::NAN);
        if let Some(min) = minimum {
            if n < min {
                self.report(
                    codes::TOO_SMALL,
                    format!("Number must be greater than or equal to {min}"),
                );
            }
        }
        if let Some(max) = maximum {
            if n > max {
                self.report(
                    codes::TOO_BIG,
                    format!("Number must be less than or equal to {max}"),
                );
            }
        }
        Some(Value::Number(number))
    }

    fn visit_boolean(&mut self, schema: &Schema, value: Value) -> Option<Value> {
        match value {
            Value::Bool(_) => Some(value),
            Value::String(ref s) if schema.coerce => match s.as_str() {
                "true" => Some(Value::Bool(true)),
                "false" => Some(Value::Bool(false)),
                _ => {
                    self.invalid_type(schema, &value);
                    None
                }
            },
            other => {
                self.invalid_type(schema, &other);
                None
            }
        }
    }

    fn visit_array(
        &mut self,
        schema: &Schema,
        value: Value,
        items: &Schema,
        min_items: Option<usize>,
        max_items: Option<usize>,
    ) -> Option<Value> {
        let elements = match value {
            Value::Array(elements) => elements,
            other if schema.coerce => vec![other],
            other => {
                self.invalid_type(schema, &other);
                return None;
            }
        };

        let count = elements.len();
        if let Some(min) = min_items {
            if count < min {
                self.report(
                    codes::TOO_SMALL,
                    format!("Array must contain at least {min} element(s)"),
                );
            }
        }
        if let Some(max) = max_items {
            if count > max {
                self.report(
                    codes::TOO_BIG,
                    format!("Array must contain at most {max} element(s)"),
                );
            }
        }

        let mut output = Vec::with_capacity(count);
        for (index, element) in elements.into_iter().enumerate() {
            self.path.push(PathItem::Index(index));
            let visited = self.visit(items, Some(element));
            self.path.pop();
            output.push(visited.unwrap_or(Value::Null));
        }
        Some(Value::Array(output))
    }

    fn visit_object(
        &mut self,
        schema: &Schema,
        value: Value,
        properties: &IndexMap<String, Schema>,
    ) -> Option<Value> {
        let Value::Object(mut input) = value else {
            self.invalid_type(schema, &value);
            return None;
        };

        let mut output = Map::new();
        for (name, property) in properties {
            let field = input.remove(name);
            self.path.push(PathItem::Key(name.clone()));
            let visited = self.visit(property, field);
            self.path.pop();
            if let Some(visited) = visited {
                output.insert(name.clone(), visited);
            }
        }

        if self.mode == ValidationMode::Passthrough {
            output.extend(input);
        }
        Some(Value::Object(output))
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn as_whole_number(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    let whole = f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64;
    whole.then_some(f as i64)
}

fn parse_number(s: &str) -> Option<Number> {
    let s = s.trim();
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strip(schema: &Schema, value: Value) -> Result<Value, Issues> {
        schema.check(value, ValidationMode::Strip)
    }

    #[test]
    fn test_string_constraints() {
        let schema = Schema::string().min_length(2).max_length(4);
        assert!(strip(&schema, json!("abc")).is_ok());
        let issues = strip(&schema, json!("a")).unwrap_err();
        assert_eq!(issues.issues[0].code, codes::TOO_SMALL);
        let issues = strip(&schema, json!("abcde")).unwrap_err();
        assert_eq!(issues.issues[0].code, codes::TOO_BIG);
    }

    #[test]
    fn test_integer_rejects_strings_without_coercion() {
        let schema = Schema::object([("take", Schema::integer())]);
        let issues = strip(&schema, json!({"take": "10"})).unwrap_err();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues.issues[0].path, vec![PathItem::from("take")]);
        assert_eq!(issues.issues[0].message, "Expected integer, received string");
    }

    #[test]
    fn test_coercion_applies_to_nested_schemas() {
        let schema = Schema::object([
            ("take", Schema::integer()),
            ("ratio", Schema::number()),
            ("flag", Schema::boolean()),
            ("ids", Schema::array(Schema::integer())),
        ])
        .coerce();

        let value = strip(
            &schema,
            json!({"take": "10", "ratio": "0.5", "flag": "true", "ids": "7"}),
        )
        .unwrap();
        assert_eq!(
            value,
            json!({"take": 10, "ratio": 0.5, "flag": true, "ids": [7]})
        );
    }

    #[test]
    fn test_integer_accepts_whole_floats() {
        assert_eq!(strip(&Schema::integer(), json!(3.0)).unwrap(), json!(3));
        let issues = strip(&Schema::integer(), json!(3.5)).unwrap_err();
        assert_eq!(issues.issues[0].message, "Expected integer, received float");
    }

    #[test]
    fn test_collects_every_issue() {
        let schema = Schema::object([
            ("title", Schema::string()),
            ("content", Schema::string()),
            ("tags", Schema::array(Schema::string())),
        ]);
        let issues = strip(&schema, json!({"title": 1, "tags": ["a", 2]})).unwrap_err();
        let paths: Vec<String> = issues.iter().map(Issue::dotted_path).collect();
        assert_eq!(paths, vec!["title", "content", "tags.1"]);
        assert_eq!(issues.issues[1].code, codes::REQUIRED);
    }

    #[test]
    fn test_strip_and_passthrough_modes() {
        let schema = Schema::object([("id", Schema::string())]);
        let input = json!({"id": "a", "extra": true});

        assert_eq!(strip(&schema, input.clone()).unwrap(), json!({"id": "a"}));
        assert_eq!(
            schema.check(input, ValidationMode::Passthrough).unwrap(),
            json!({"id": "a", "extra": true})
        );
    }

    #[test]
    fn test_optional_and_default() {
        let schema = Schema::object([
            ("skip", Schema::integer().default_value(0)),
            ("cursor", Schema::string().optional()),
        ]);
        assert_eq!(strip(&schema, json!({})).unwrap(), json!({"skip": 0}));
    }

    #[test]
    fn test_nullable() {
        assert!(strip(&Schema::string(), Value::Null).is_err());
        assert_eq!(strip(&Schema::string().nullable(), Value::Null).unwrap(), Value::Null);
        assert_eq!(strip(&Schema::string().optional(), Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_literal_and_enum() {
        assert!(strip(&Schema::literal("v1"), json!("v1")).is_ok());
        assert_eq!(
            strip(&Schema::literal("v1"), json!("v2")).unwrap_err().issues[0].code,
            codes::INVALID_LITERAL
        );
        assert_eq!(strip(&Schema::literal(3).coerce(), json!("3")).unwrap(), json!(3));

        let status = Schema::enumeration(["draft", "published"]);
        assert!(strip(&status, json!("draft")).is_ok());
        let issues = strip(&status, json!("archived")).unwrap_err();
        assert_eq!(
            issues.issues[0].message,
            "Invalid enum value. Expected 'draft' | 'published', received 'archived'"
        );
    }

    #[test]
    fn test_array_item_bounds() {
        let schema = Schema::array(Schema::any()).min_items(1).max_items(2);
        assert!(strip(&schema, json!([1])).is_ok());
        assert_eq!(strip(&schema, json!([])).unwrap_err().issues[0].code, codes::TOO_SMALL);
        assert_eq!(strip(&schema, json!([1, 2, 3])).unwrap_err().issues[0].code, codes::TOO_BIG);
    }

    #[test]
    fn test_is_array_field() {
        let schema = Schema::object([
            ("tags", Schema::array(Schema::string())),
            ("q", Schema::string()),
        ]);
        assert!(schema.is_array_field("tags"));
        assert!(!schema.is_array_field("q"));
        assert!(!schema.is_array_field("missing"));
        assert!(!Schema::string().is_array_field("tags"));
    }

    #[test]
    fn test_schema_serde() {
        let schema = Schema::object([("id", Schema::string().min_length(1))]);
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["id"]["type"], "string");
        let back: Schema = serde_json::from_value(json).unwrap();
        assert_eq!(back, schema);
    }

    proptest::proptest! {
        #[test]
        fn prop_coerced_integers_round_trip(n in proptest::num::i64::ANY) {
            let schema = Schema::integer().coerce();
            let value = schema.check(Value::String(n.to_string()), ValidationMode::Strip).unwrap();
            proptest::prop_assert_eq!(value, json!(n));
        }
    }
}
