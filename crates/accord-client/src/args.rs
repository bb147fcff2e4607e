//! Per-call arguments.

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// A header setting in one of the merge layers.
///
/// [`HeaderValue::Remove`] deletes a header an earlier layer set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    /// Send this value.
    Value(String),
    /// Do not send the header at all.
    Remove,
}

impl From<&str> for HeaderValue {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

impl From<String> for HeaderValue {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for HeaderValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Remove, Into::into)
    }
}

/// An ordered list of header settings, applied front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderLayer(Vec<(String, HeaderValue)>);

impl HeaderLayer {
    /// Creates an empty layer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a setting. Names are case-insensitive.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<HeaderValue>) {
        self.0.push((name.into().to_ascii_lowercase(), value.into()));
    }

    /// Iterates over the settings in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Returns true if the layer has no settings.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for HeaderLayer
where
    K: Into<String>,
    V: Into<HeaderValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut layer = Self::new();
        for (name, value) in iter {
            layer.set(name, value);
        }
        layer
    }
}

/// A file part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// File name sent in the part's disposition.
    pub file_name: Option<String>,
    /// Content type of the part.
    pub content_type: Option<String>,
    /// File contents.
    pub data: Bytes,
}

impl FilePart {
    /// Creates a file part.
    pub fn new(file_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            file_name: Some(file_name.into()),
            content_type: None,
            data: data.into(),
        }
    }

    /// Sets the part's content type.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// One field of a form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// A text field.
    Text(String),
    /// A file field.
    File(FilePart),
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<FilePart> for FormValue {
    fn from(file: FilePart) -> Self {
        Self::File(file)
    }
}

/// The body of a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CallBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON value. Form routes encode object members as fields; routes
    /// with another content type send strings as raw text.
    Json(Value),
    /// Form fields in order. File fields require a multipart route.
    Form(Vec<(String, FormValue)>),
}

/// Everything a call supplies besides the route.
///
/// ```
/// use accord_client::RequestArgs;
/// use serde_json::json;
///
/// let args = RequestArgs::new()
///     .param("id", 7)
///     .query(json!({"expand": true}))
///     .header("x-api-key", "secret")
///     .json(json!({"title": "Hello"}));
/// assert_eq!(args.params["id"], "7");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestArgs {
    /// Path parameter values by name.
    pub params: BTreeMap<String, String>,
    /// Query object.
    pub query: Value,
    /// Per-call headers, applied over the client's base headers.
    pub headers: HeaderLayer,
    /// Extra headers, applied over the per-call headers.
    pub extra_headers: HeaderLayer,
    /// Request body.
    pub body: CallBody,
    /// Aborts the call when triggered.
    pub cancel: Option<CancellationToken>,
}

impl RequestArgs {
    /// Creates empty arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a path parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Sets the query object.
    #[must_use]
    pub fn query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    /// Serializes `query` into the query object.
    pub fn query_from<T: Serialize>(mut self, query: &T) -> Result<Self, serde_json::Error> {
        self.query = serde_json::to_value(query)?;
        Ok(self)
    }

    /// Adds a per-call header setting.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Adds an extra header setting.
    #[must_use]
    pub fn extra_header(mut self, name: impl Into<String>, value: impl Into<HeaderValue>) -> Self {
        self.extra_headers.set(name, value);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = CallBody::Json(body);
        self
    }

    /// Serializes `body` as the JSON body.
    pub fn json_from<T: Serialize>(mut self, body: &T) -> Result<Self, serde_json::Error> {
        self.body = CallBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Appends a form field, switching the body to a form.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FormValue>) -> Self {
        let field = (name.into(), value.into());
        match &mut self.body {
            CallBody::Form(fields) => fields.push(field),
            body => *body = CallBody::Form(vec![field]),
        }
        self
    }

    /// Binds a cancellation token.
    #[must_use]
    pub fn cancel_with(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
