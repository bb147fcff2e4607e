//! Translations between native platform messages and universal messages.
//!
//! - [`api_gateway`] - serverless gateway events (REST `1.0` and HTTP `2.0`
//!   payload formats)
//! - [`native`] - native `http::Request`/`http::Response` messages as used by
//!   cloud-function runtimes and hyper-based hosts

pub mod api_gateway;
pub mod native;

use http::header::{HeaderName, HeaderValue, SET_COOKIE};
use http::HeaderMap;
use std::collections::HashMap;

use crate::{PlatformError, PlatformResult};

/// Flattens headers into a string map, joining repeated values with `", "`.
///
/// `Set-Cookie` is skipped; callers that need cookies collect them with
/// [`set_cookie_values`](crate::set_cookie_values).
#[must_use]
pub fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flat: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        if *name == SET_COOKIE {
            continue;
        }
        let Ok(value) = value.to_str() else {
            tracing::debug!(header = %name, "skipping non-ASCII header value");
            continue;
        };
        flat.entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_string());
    }
    flat
}

/// Appends string pairs to a header map.
pub(crate) fn append_header(headers: &mut HeaderMap, name: &str, value: &str) -> PlatformResult<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| PlatformError::invalid_header(name))?;
    let header_value =
        HeaderValue::from_str(value).map_err(|_| PlatformError::invalid_header(name))?;
    headers.append(header_name, header_value);
    Ok(())
}
