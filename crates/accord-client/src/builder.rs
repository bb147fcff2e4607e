//! Turning a route and call arguments into a [`PreparedRequest`].
//!
//! Building is pure: nothing here touches the network, so prepared requests
//! can be inspected in tests or sent by any [`Transport`](crate::Transport).

use std::collections::BTreeMap;

use accord_core::{BodySpec, Route};
use accord_extract::body::BodyKind;
use accord_extract::query::{encode_query, QueryMode};
use accord_platform::{Body, UniversalRequest};
use accord_router::TemplateError;
use bytes::{BufMut, Bytes, BytesMut};
use http::header::{HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use http::Method;
use serde_json::Value;

use crate::args::{CallBody, FormValue, HeaderLayer, HeaderValue, RequestArgs};
use crate::error::{ClientError, ClientResult};

const APPLICATION_JSON: &str = "application/json";

/// Builds the URL of a call.
///
/// `:name` segments are replaced by percent-encoded values from `params`;
/// an absent optional segment ends the path. The query object is encoded
/// conventionally, or one JSON text per key when `json_query` is set.
///
/// ```
/// use std::collections::BTreeMap;
/// use accord_client::build_url;
/// use accord_core::Route;
/// use serde_json::json;
///
/// let route = Route::get("/posts/:id/comments/:page?").build().unwrap();
/// let params = BTreeMap::from([("id".to_string(), "a b".to_string())]);
/// let url = build_url(&route, "http://api.test/", &params, &json!({"take": 5}), false).unwrap();
/// assert_eq!(url, "http://api.test/posts/a%20b/comments?take=5");
/// ```
///
/// # Errors
///
/// Returns [`ClientError::MissingPathParam`] when a required parameter has
/// no value.
pub fn build_url(
    route: &Route,
    base_url: &str,
    params: &BTreeMap<String, String>,
    query: &Value,
    json_query: bool,
) -> ClientResult<String> {
    let path = route
        .template()
        .fill(|name| params.get(name).cloned())
        .map_err(|err| match err {
            TemplateError::MissingParam { name } => ClientError::MissingPathParam { name },
            other => ClientError::Template(other),
        })?;

    let mut url = String::with_capacity(base_url.len() + path.len());
    url.push_str(base_url.trim_end_matches('/'));
    url.push_str(&path);

    let mode = if json_query {
        QueryMode::Json
    } else {
        QueryMode::Standard
    };
    let encoded = encode_query(query, mode);
    if !encoded.is_empty() {
        url.push('?');
        url.push_str(&encoded);
    }
    Ok(url)
}

/// Applies header layers in order; later layers win and
/// [`HeaderValue::Remove`] deletes what earlier layers set.
///
/// # Errors
///
/// Returns [`ClientError::InvalidHeader`] for names or values HTTP cannot
/// carry.
pub fn merge_headers<'a, I>(layers: I) -> ClientResult<HeaderMap>
where
    I: IntoIterator<Item = &'a HeaderLayer>,
{
    let mut headers = HeaderMap::new();
    for layer in layers {
        for (name, value) in layer.iter() {
            let header = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ClientError::InvalidHeader { name: name.to_string() })?;
            match value {
                HeaderValue::Value(value) => {
                    let value = http::HeaderValue::from_str(value)
                        .map_err(|_| ClientError::InvalidHeader { name: name.to_string() })?;
                    headers.insert(header, value);
                }
                HeaderValue::Remove => {
                    headers.remove(header);
                }
            }
        }
    }
    Ok(headers)
}

/// A request body ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PreparedBody {
    /// No body.
    #[default]
    Empty,
    /// Encoded bytes; the content type is in the headers.
    Bytes(Bytes),
    /// Multipart fields; the transport picks the boundary and sets the
    /// content type.
    Multipart(Vec<(String, FormValue)>),
}

/// A fully built outgoing request.
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute or base-relative URL, including the query string.
    pub url: String,
    /// Merged headers.
    pub headers: HeaderMap,
    /// Body.
    pub body: PreparedBody,
}

impl PreparedRequest {
    /// Converts to a [`UniversalRequest`], encoding multipart fields with
    /// `boundary`.
    ///
    /// # Errors
    ///
    /// Fails when the URL cannot be parsed.
    pub fn into_universal(self, boundary: &str) -> ClientResult<UniversalRequest> {
        let Self {
            method,
            url,
            mut headers,
            body,
        } = self;

        let body = match body {
            PreparedBody::Empty => Body::Empty,
            PreparedBody::Bytes(bytes) => Body::Binary(bytes),
            PreparedBody::Multipart(fields) => {
                let content_type = format!("multipart/form-data; boundary={boundary}");
                let value = http::HeaderValue::from_str(&content_type).map_err(|_| {
                    ClientError::InvalidHeader {
                        name: CONTENT_TYPE.to_string(),
                    }
                })?;
                headers.insert(CONTENT_TYPE, value);
                Body::Binary(encode_multipart(&fields, boundary))
            }
        };
        if let Some(len) = body.len() {
            headers.insert(CONTENT_LENGTH, http::HeaderValue::from(len));
        }

        let uri = url.parse::<http::Uri>().map_err(ClientError::transport)?;
        Ok(UniversalRequest::new(method, uri, headers, body))
    }
}

/// Encodes multipart fields as a `multipart/form-data` body.
#[must_use]
pub fn encode_multipart(fields: &[(String, FormValue)], boundary: &str) -> Bytes {
    let mut out = BytesMut::new();
    for (name, value) in fields {
        out.put_slice(format!("--{boundary}\r\n").as_bytes());
        let name = quote(name);
        match value {
            FormValue::Text(text) => {
                out.put_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                );
                out.put_slice(text.as_bytes());
            }
            FormValue::File(file) => {
                let mut disposition = format!("Content-Disposition: form-data; name=\"{name}\"");
                if let Some(file_name) = &file.file_name {
                    disposition.push_str(&format!("; filename=\"{}\"", quote(file_name)));
                }
                out.put_slice(disposition.as_bytes());
                out.put_slice(b"\r\n");
                let content_type = file
                    .content_type
                    .as_deref()
                    .unwrap_or("application/octet-stream");
                out.put_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
                out.put_slice(&file.data);
            }
        }
        out.put_slice(b"\r\n");
    }
    out.put_slice(format!("--{boundary}--\r\n").as_bytes());
    out.freeze()
}

fn quote(value: &str) -> String {
    value
        .replace('"', "%22")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Settings the builder takes from the client.
#[derive(Debug, Clone, Copy)]
pub struct BuildSettings<'a> {
    /// Base URL.
    pub base_url: &'a str,
    /// JSON query mode.
    pub json_query: bool,
    /// Headers sent with every call.
    pub base_headers: &'a HeaderLayer,
}

/// Builds the request for one call.
///
/// Headers merge in this order, later layers winning: the body's default
/// content type, the client's base headers, the call's headers, the call's
/// extra headers, then the route's declared content type.
///
/// # Errors
///
/// Fails on a missing path parameter, an unsendable header, or a body the
/// route's content type cannot carry.
pub fn prepare_request(
    route: &Route,
    args: &RequestArgs,
    settings: BuildSettings<'_>,
) -> ClientResult<PreparedRequest> {
    let url = build_url(
        route,
        settings.base_url,
        &args.params,
        &args.query,
        settings.json_query,
    )?;

    let (body, default_content_type) = prepare_body(route, &args.body)?;

    let mut defaults = HeaderLayer::new();
    if let Some(content_type) = default_content_type {
        defaults.set(CONTENT_TYPE.as_str(), content_type);
    }
    let mut forced = HeaderLayer::new();
    if let Some(content_type) = route.content_type() {
        forced.set(CONTENT_TYPE.as_str(), content_type);
    }

    let mut headers = merge_headers([
        &defaults,
        settings.base_headers,
        &args.headers,
        &args.extra_headers,
        &forced,
    ])?;
    if matches!(body, PreparedBody::Multipart(_)) {
        headers.remove(CONTENT_TYPE);
    }

    Ok(PreparedRequest {
        method: route.method().clone(),
        url,
        headers,
        body,
    })
}

fn prepare_body(route: &Route, body: &CallBody) -> ClientResult<(PreparedBody, Option<&'static str>)> {
    if matches!(route.body(), BodySpec::NoBody) || matches!(body, CallBody::Empty) {
        return Ok((PreparedBody::Empty, None));
    }

    match (BodyKind::from_content_type(route.content_type()), body) {
        (BodyKind::Multipart, CallBody::Form(fields)) => {
            Ok((PreparedBody::Multipart(fields.clone()), None))
        }
        (BodyKind::Multipart, CallBody::Json(value)) => {
            Ok((PreparedBody::Multipart(value_to_fields(value)?), None))
        }
        (BodyKind::Form, CallBody::Form(fields)) => {
            let mut pairs = Vec::with_capacity(fields.len());
            for (name, value) in fields {
                match value {
                    FormValue::Text(text) => pairs.push((name.as_str(), text.as_str())),
                    FormValue::File(_) => {
                        return Err(ClientError::invalid_body(format!(
                            "file field `{name}` requires a multipart route"
                        )))
                    }
                }
            }
            let encoded = serde_urlencoded::to_string(pairs)
                .map_err(|err| ClientError::invalid_body(err.to_string()))?;
            Ok((PreparedBody::Bytes(Bytes::from(encoded)), None))
        }
        (BodyKind::Form, CallBody::Json(value)) => {
            if !value.is_object() {
                return Err(ClientError::invalid_body("form bodies must be objects"));
            }
            let encoded = encode_query(value, QueryMode::Standard);
            Ok((PreparedBody::Bytes(Bytes::from(encoded)), None))
        }
        (BodyKind::Other, CallBody::Json(Value::String(text))) => {
            Ok((PreparedBody::Bytes(Bytes::from(text.clone())), None))
        }
        (_, CallBody::Json(value)) => Ok((
            PreparedBody::Bytes(Bytes::from(serde_json::to_vec(value)?)),
            Some(APPLICATION_JSON),
        )),
        (_, CallBody::Form(_)) => Err(ClientError::invalid_body(
            "form fields require a form or multipart route",
        )),
        (_, CallBody::Empty) => Ok((PreparedBody::Empty, None)),
    }
}

fn value_to_fields(value: &Value) -> ClientResult<Vec<(String, FormValue)>> {
    let Value::Object(map) = value else {
        return Err(ClientError::invalid_body("multipart bodies must be objects"));
    };

    let mut fields = Vec::new();
    for (name, value) in map {
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    fields.push((name.clone(), FormValue::Text(field_text(item))));
                }
            }
            other => fields.push((name.clone(), FormValue::Text(field_text(other)))),
        }
    }
    Ok(fields)
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
