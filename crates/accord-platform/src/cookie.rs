//! `Set-Cookie` splitting.
//!
//! Fetch-style header collections join repeated `Set-Cookie` headers with
//! `", "`, but cookie attributes such as `Expires=Wed, 21 Oct 2025 ...` contain
//! commas themselves. Gateways that want one entry per cookie have to undo
//! that join without breaking the dates apart.

use http::header::SET_COOKIE;
use http::HeaderMap;

/// Splits a combined `Set-Cookie` value into one string per cookie.
///
/// Every comma is a candidate boundary. After it, whitespace is skipped and
/// the following token is scanned up to the next `=`, `;` or `,`. Only when
/// that token ends in `=` (a bare cookie name) is the comma a real boundary;
/// otherwise scanning resumes right after the comma and the text stays part
/// of the current cookie.
///
/// ```rust
/// use accord_platform::split_cookies_string;
///
/// assert_eq!(split_cookies_string("a=1, b=2"), vec!["a=1", "b=2"]);
/// assert_eq!(
///     split_cookies_string("a=1; Expires=Wed, 21 Oct 2025 07:28:00 GMT, b=2"),
///     vec!["a=1; Expires=Wed, 21 Oct 2025 07:28:00 GMT", "b=2"],
/// );
/// ```
#[must_use]
pub fn split_cookies_string(input: &str) -> Vec<String> {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut cookies = Vec::new();
    let mut pos = 0;

    // Skips whitespace and reports whether input remains.
    let skip_whitespace = |pos: &mut usize| {
        while *pos < len && bytes[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        *pos < len
    };
    let is_token_byte = |b: u8| b != b'=' && b != b';' && b != b',';

    while pos < len {
        let mut start = pos;
        let mut separator_found = false;

        while skip_whitespace(&mut pos) {
            if bytes[pos] == b',' {
                let last_comma = pos;
                pos += 1;
                skip_whitespace(&mut pos);
                let next_start = pos;

                while pos < len && is_token_byte(bytes[pos]) {
                    pos += 1;
                }

                if pos < len && bytes[pos] == b'=' {
                    separator_found = true;
                    pos = next_start;
                    cookies.push(input[start..last_comma].to_string());
                    start = pos;
                } else {
                    pos = last_comma + 1;
                }
            } else {
                pos += 1;
            }
        }

        if !separator_found || pos >= len {
            cookies.push(input[start..len].to_string());
        }
    }

    cookies
}

/// Collects every cookie from the `Set-Cookie` headers of a message.
///
/// Each header value is itself split with [`split_cookies_string`], so both
/// repeated headers and comma-joined values yield one entry per cookie.
/// Values that are not visible ASCII are skipped.
#[must_use]
pub fn set_cookie_values(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(split_cookies_string)
        .collect()
}
