// ABOUTME: HttpOnly cookie helpers for session tokens and short-lived flow state
// ABOUTME: Parses Cookie headers and builds Secure, path-scoped Set-Cookie values
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

use axum::http::HeaderMap;

/// Extract a cookie value by name from the request's `Cookie` header
#[must_use]
pub fn get_cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let cookie_header = headers.get("cookie")?.to_str().ok()?;
    for pair in cookie_header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        if parts.next() == Some(name) {
            return parts.next().map(str::to_owned);
        }
    }
    None
}

/// Build a short-lived flow cookie: `Secure`, `HttpOnly`, `SameSite=Lax`,
/// scoped to `path`
#[must_use]
pub fn flow_cookie(name: &str, value: &str, path: &str, max_age_secs: u64) -> String {
    format!("{name}={value}; Max-Age={max_age_secs}; Path={path}; Secure; HttpOnly; SameSite=Lax")
}

/// Build the clearing counterpart of a flow cookie
#[must_use]
pub fn clear_cookie(name: &str, path: &str) -> String {
    format!("{name}=; Max-Age=0; Path={path}; Secure; HttpOnly; SameSite=Lax")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_cookie_among_many() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "cookie",
            HeaderValue::from_static("a=1; auth_token=abc-123; b=2"),
        );
        assert_eq!(
            get_cookie_value(&headers, "auth_token"),
            Some("abc-123".to_owned())
        );
        assert_eq!(get_cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn flow_cookie_is_scoped_and_protected() {
        let cookie = flow_cookie("oauth_verifier", "v", "/callback/google", 300);
        assert!(cookie.contains("Path=/callback/google"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Max-Age=300"));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        assert!(clear_cookie("oauth_verifier", "/callback/google").contains("Max-Age=0"));
    }
}
