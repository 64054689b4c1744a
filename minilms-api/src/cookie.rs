/// Session-cookie plumbing
///
/// The session id travels in a single cookie; this module parses it out of
/// the `Cookie` request header and builds the matching `Set-Cookie` values.
/// The cookie is HttpOnly (no script access) and SameSite=Lax, which blocks
/// the cookie on cross-site POSTs and complements the CSRF token check.

use axum::http::{header, HeaderMap, HeaderValue};

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "minilms_session";

/// Extracts the session id from the request's `Cookie` header, if present
///
/// Multiple `Cookie` headers and multi-pair headers are both handled; the
/// first pair with the session name wins.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name == SESSION_COOKIE && !value.is_empty() {
                Some(value.to_string())
            } else {
                None
            }
        })
        .next()
}

/// Builds the `Set-Cookie` value that installs a session id
pub fn set_session_cookie(session_id: &str) -> HeaderValue {
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        SESSION_COOKIE, session_id
    );
    HeaderValue::from_str(&cookie)
        .unwrap_or_else(|_| HeaderValue::from_static("minilms_session=; Path=/"))
}

/// Builds the `Set-Cookie` value that clears the session cookie (logout)
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("minilms_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_parses_single_cookie() {
        let headers = headers_with_cookie("minilms_session=abc123");
        assert_eq!(session_id(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_parses_among_other_cookies() {
        let headers = headers_with_cookie("theme=dark; minilms_session=abc123; lang=en");
        assert_eq!(session_id(&headers), Some("abc123".to_string()));
    }

    #[test]
    fn test_missing_cookie() {
        let headers = headers_with_cookie("theme=dark");
        assert_eq!(session_id(&headers), None);
        assert_eq!(session_id(&HeaderMap::new()), None);
    }

    #[test]
    fn test_empty_value_is_missing() {
        let headers = headers_with_cookie("minilms_session=");
        assert_eq!(session_id(&headers), None);
    }

    #[test]
    fn test_set_cookie_attributes() {
        let value = set_session_cookie("abc123");
        let s = value.to_str().unwrap();
        assert!(s.starts_with("minilms_session=abc123"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("SameSite=Lax"));
        assert!(s.contains("Path=/"));
    }

    #[test]
    fn test_clear_cookie_expires() {
        let value = clear_session_cookie();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }
}
