use warp::http::{header::{HeaderName, HeaderValue}, HeaderMap};

use crate::config::{DEFAULT_MAX_LENGTH, SEARCH_MAX_LENGTH};


pub fn add_cors_headers(headers: &mut HeaderMap) {
    headers.insert(
        HeaderName::from_static("access-control-allow-origin"),
        HeaderValue::from_static("*"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-methods"),
        HeaderValue::from_static("GET, POST, PUT, DELETE, OPTIONS"),
    );
    headers.insert(
        HeaderName::from_static("access-control-allow-headers"),
        HeaderValue::from_static("Content-Type"),
    );
}

pub fn cors_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    add_cors_headers(&mut headers);
    headers
}

/// Escape markup the way a text node serializes, then trim.
pub fn escape_markup(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\u{a0}' => escaped.push_str("&nbsp;"),
            _ => escaped.push(c),
        }
    }
    escaped.trim().to_string()
}

/// Keep ASCII letters and digits, whitespace, and `.,!?-`.
pub fn remove_special_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric() || c.is_whitespace() || matches!(c, '.' | ',' | '!' | '?' | '-')
        })
        .collect()
}

pub fn limit_length(input: &str, max_length: usize) -> String {
    input.chars().take(max_length).collect()
}

/// Escape, strip, truncate, in that order.
///
/// Stripping runs after escaping, so entities lose their `&` and `;`:
/// `"<b>"` comes out as `"ltbgt"`.
pub fn sanitize_safe(input: &str, max_length: usize) -> String {
    let sanitized = escape_markup(input);
    let sanitized = remove_special_chars(&sanitized);
    limit_length(&sanitized, max_length)
}

pub fn sanitize_default(input: &str) -> String {
    sanitize_safe(input, DEFAULT_MAX_LENGTH)
}

/// Sanitizer applied to catalog and favorites search boxes.
pub fn sanitize_search(input: &str) -> String {
    sanitize_safe(input, SEARCH_MAX_LENGTH)
}
