//! API-gateway proxy events.
//!
//! Two payload shapes exist in the wild: the REST `1.0` format with
//! `httpMethod`, `path` and optional multi-value maps, and the HTTP `2.0`
//! format with `rawPath`, `rawQueryString` and a separate `cookies` array.
//! Both carry bodies as strings with an `isBase64Encoded` flag.
//!
//! # Example
//!
//! ```rust
//! use accord_platform::mappers::api_gateway::ApiGatewayEvent;
//!
//! let event: ApiGatewayEvent = serde_json::from_str(r#"{
//!     "version": "2.0",
//!     "rawPath": "/posts/7",
//!     "rawQueryString": "include=author",
//!     "headers": { "host": "api.example.com" },
//!     "requestContext": { "http": { "method": "GET" } },
//!     "isBase64Encoded": false
//! }"#).unwrap();
//!
//! let request = event.into_request().unwrap();
//! assert_eq!(request.uri().to_string(), "https://api.example.com/posts/7?include=author");
//! ```

use std::collections::{BTreeMap, HashMap};

use http::{HeaderMap, Method, Uri};
use serde::{Deserialize, Serialize};

use super::{append_header, flatten_headers};
use crate::encoding::encode_for_transport;
use crate::{
    base64_to_bytes, set_cookie_values, Body, PlatformError, PlatformResult, UniversalRequest,
    UniversalResponse,
};

/// Request context of a `1.0` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V1RequestContext {
    /// Custom or default domain name.
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Deployment stage.
    #[serde(default)]
    pub stage: Option<String>,
    /// Gateway request id.
    #[serde(default)]
    pub request_id: Option<String>,
}

/// A REST (`1.0`) proxy event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV1Event {
    /// HTTP method.
    pub http_method: String,
    /// Request path.
    pub path: String,
    /// Single-value headers.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,
    /// Multi-value headers; preferred over `headers` when present.
    #[serde(default)]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
    /// Single-value query parameters.
    #[serde(default)]
    pub query_string_parameters: Option<BTreeMap<String, String>>,
    /// Multi-value query parameters; preferred when present.
    #[serde(default)]
    pub multi_value_query_string_parameters: Option<BTreeMap<String, Vec<String>>>,
    /// Path parameters extracted by the gateway.
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    /// Body, verbatim or base64.
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64.
    #[serde(default)]
    pub is_base64_encoded: bool,
    /// Request context.
    #[serde(default)]
    pub request_context: Option<V1RequestContext>,
}

/// The `http` block of a `2.0` request context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V2Http {
    /// HTTP method.
    pub method: String,
    /// Request path.
    #[serde(default)]
    pub path: Option<String>,
    /// Protocol, e.g. `HTTP/1.1`.
    #[serde(default)]
    pub protocol: Option<String>,
    /// Caller address.
    #[serde(default)]
    pub source_ip: Option<String>,
}

/// Request context of a `2.0` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct V2RequestContext {
    /// HTTP details.
    pub http: V2Http,
    /// Custom or default domain name.
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Deployment stage.
    #[serde(default)]
    pub stage: Option<String>,
    /// Gateway request id.
    #[serde(default)]
    pub request_id: Option<String>,
}

/// An HTTP (`2.0`) proxy event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2Event {
    /// Payload version, `2.0`.
    #[serde(default)]
    pub version: Option<String>,
    /// Request path, not decoded.
    #[serde(default)]
    pub raw_path: String,
    /// Query string without `?`.
    #[serde(default)]
    pub raw_query_string: String,
    /// Request cookies, split by the gateway.
    #[serde(default)]
    pub cookies: Option<Vec<String>>,
    /// Headers; repeated values are comma-joined by the gateway.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Path parameters extracted by the gateway.
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    /// Body, verbatim or base64.
    #[serde(default)]
    pub body: Option<String>,
    /// Whether `body` is base64.
    #[serde(default)]
    pub is_base64_encoded: bool,
    /// Request context.
    pub request_context: V2RequestContext,
}

/// Either payload format.
///
/// Deserialization tries the `2.0` shape first; a `1.0` event lacks
/// `requestContext.http` and falls through to [`ApiGatewayEvent::V1`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiGatewayEvent {
    /// HTTP API payload.
    V2(ApiGatewayV2Event),
    /// REST API payload.
    V1(ApiGatewayV1Event),
}

impl ApiGatewayEvent {
    /// Returns the payload version of this event.
    #[must_use]
    pub fn version(&self) -> PayloadVersion {
        match self {
            Self::V1(_) => PayloadVersion::V1,
            Self::V2(_) => PayloadVersion::V2,
        }
    }

    /// Converts the event into a universal request.
    pub fn into_request(self) -> PlatformResult<UniversalRequest> {
        match self {
            Self::V1(event) => request_from_v1(event),
            Self::V2(event) => request_from_v2(event),
        }
    }
}

/// Payload format of an event, and therefore of its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadVersion {
    /// REST API (`1.0`).
    V1,
    /// HTTP API (`2.0`).
    V2,
}

/// Response for a `1.0` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV1Response {
    /// Status code.
    pub status_code: u16,
    /// Single-value headers.
    pub headers: HashMap<String, String>,
    /// Multi-value headers, used for `set-cookie`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub multi_value_headers: HashMap<String, Vec<String>>,
    /// Body, verbatim or base64.
    pub body: String,
    /// Whether `body` is base64.
    pub is_base64_encoded: bool,
}

/// Response for a `2.0` event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayV2Response {
    /// Status code.
    pub status_code: u16,
    /// Headers without `set-cookie`.
    pub headers: HashMap<String, String>,
    /// One entry per cookie.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cookies: Vec<String>,
    /// Body, verbatim or base64.
    pub body: String,
    /// Whether `body` is base64.
    pub is_base64_encoded: bool,
}

/// Response in the format matching the originating event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiGatewayResponse {
    /// HTTP API response.
    V2(ApiGatewayV2Response),
    /// REST API response.
    V1(ApiGatewayV1Response),
}

/// Converts a `1.0` event into a universal request.
pub fn request_from_v1(event: ApiGatewayV1Event) -> PlatformResult<UniversalRequest> {
    let method = parse_method(&event.http_method)?;

    let mut headers = HeaderMap::new();
    if let Some(multi) = &event.multi_value_headers {
        for (name, values) in multi {
            for value in values {
                append_header(&mut headers, name, value)?;
            }
        }
    } else if let Some(single) = &event.headers {
        for (name, value) in single {
            append_header(&mut headers, name, value)?;
        }
    }

    let pairs: Vec<(&str, &str)> = match (
        &event.multi_value_query_string_parameters,
        &event.query_string_parameters,
    ) {
        (Some(multi), _) => multi
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
            .collect(),
        (None, Some(single)) => single.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
        (None, None) => Vec::new(),
    };
    let query = serde_urlencoded::to_string(&pairs)
        .map_err(|e| PlatformError::invalid_url(&event.path, e))?;

    let domain = event
        .request_context
        .as_ref()
        .and_then(|ctx| ctx.domain_name.as_deref());
    let uri = rebuild_uri(&headers, domain, &encode_path(&event.path), &query)?;
    let body = decode_body(event.body, event.is_base64_encoded)?;

    Ok(UniversalRequest::new(method, uri, headers, body))
}

/// Converts a `2.0` event into a universal request.
pub fn request_from_v2(event: ApiGatewayV2Event) -> PlatformResult<UniversalRequest> {
    let method = parse_method(&event.request_context.http.method)?;

    let mut headers = HeaderMap::new();
    for (name, value) in &event.headers {
        append_header(&mut headers, name, value)?;
    }
    if let Some(cookies) = event.cookies.as_ref().filter(|c| !c.is_empty()) {
        headers.remove(http::header::COOKIE);
        append_header(&mut headers, "cookie", &cookies.join("; "))?;
    }

    let path = if event.raw_path.is_empty() {
        event
            .request_context
            .http
            .path
            .clone()
            .unwrap_or_else(|| "/".to_string())
    } else {
        event.raw_path.clone()
    };

    let uri = rebuild_uri(
        &headers,
        event.request_context.domain_name.as_deref(),
        &path,
        &event.raw_query_string,
    )?;
    let body = decode_body(event.body, event.is_base64_encoded)?;

    Ok(UniversalRequest::new(method, uri, headers, body))
}

/// Converts a response into the `1.0` format.
///
/// Streaming bodies are buffered. `set-cookie` values go to
/// `multiValueHeaders`, one entry per cookie.
pub async fn response_to_v1(response: UniversalResponse) -> PlatformResult<ApiGatewayV1Response> {
    let (status, headers, body) = response.into_parts();
    let cookies = set_cookie_values(&headers);
    let encoded = encode_body(&headers, body).await?;

    let mut multi_value_headers = HashMap::new();
    if !cookies.is_empty() {
        multi_value_headers.insert("set-cookie".to_string(), cookies);
    }

    Ok(ApiGatewayV1Response {
        status_code: status.as_u16(),
        headers: flatten_headers(&headers),
        multi_value_headers,
        body: encoded.body,
        is_base64_encoded: encoded.is_base64_encoded,
    })
}

/// Converts a response into the `2.0` format.
///
/// Streaming bodies are buffered. `set-cookie` values become the `cookies`
/// array, one entry per cookie.
pub async fn response_to_v2(response: UniversalResponse) -> PlatformResult<ApiGatewayV2Response> {
    let (status, headers, body) = response.into_parts();
    let cookies = set_cookie_values(&headers);
    let encoded = encode_body(&headers, body).await?;

    Ok(ApiGatewayV2Response {
        status_code: status.as_u16(),
        headers: flatten_headers(&headers),
        cookies,
        body: encoded.body,
        is_base64_encoded: encoded.is_base64_encoded,
    })
}

/// Converts a response into the format of `version`.
pub async fn into_gateway_response(
    version: PayloadVersion,
    response: UniversalResponse,
) -> PlatformResult<ApiGatewayResponse> {
    Ok(match version {
        PayloadVersion::V1 => ApiGatewayResponse::V1(response_to_v1(response).await?),
        PayloadVersion::V2 => ApiGatewayResponse::V2(response_to_v2(response).await?),
    })
}

fn parse_method(method: &str) -> PlatformResult<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| PlatformError::InvalidMethod(method.to_string()))
}

/// Percent-encodes each segment of a decoded `1.0` path.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

fn rebuild_uri(
    headers: &HeaderMap,
    domain: Option<&str>,
    path: &str,
    query: &str,
) -> PlatformResult<Uri> {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    let host = headers
        .get(http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .or(domain)
        .unwrap_or("localhost");

    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let url = if query.is_empty() {
        format!("{scheme}://{host}{path}")
    } else {
        format!("{scheme}://{host}{path}?{query}")
    };

    url.parse().map_err(|e| PlatformError::invalid_url(&url, e))
}

fn decode_body(body: Option<String>, is_base64: bool) -> PlatformResult<Body> {
    match body {
        None => Ok(Body::Empty),
        Some(body) if body.is_empty() => Ok(Body::Empty),
        Some(body) if is_base64 => Ok(Body::Binary(base64_to_bytes(&body)?)),
        Some(body) => Ok(Body::Text(body)),
    }
}

async fn encode_body(
    headers: &HeaderMap,
    body: Body,
) -> PlatformResult<crate::encoding::EncodedBody> {
    let content_type = headers
        .get(http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    let bytes = body.collect().await?;
    Ok(encode_for_transport(&bytes, content_type))
}
