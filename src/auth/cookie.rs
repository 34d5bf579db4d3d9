//! HttpOnly session cookie carrying the JWT.

use axum::http::{header, HeaderMap};
use ::cookie::{time::Duration, Cookie, SameSite};

use crate::config::SecurityConfig;

pub fn session_cookie(token: &str, security: &SecurityConfig) -> Cookie<'static> {
    Cookie::build((security.cookie_name.clone(), token.to_string()))
        .path("/")
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(security.jwt_expiry_hours as i64))
        .build()
}

/// Expired cookie that makes the browser drop the session.
pub fn logout_cookie(security: &SecurityConfig) -> Cookie<'static> {
    Cookie::build((security.cookie_name.clone(), String::new()))
        .path("/")
        .http_only(true)
        .secure(security.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

/// Token from the session cookie, or from `Authorization: Bearer` for
/// non-browser clients.
pub fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == cookie_name)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::http::HeaderValue;

    fn security() -> SecurityConfig {
        AppConfig::from_env().security
    }

    #[test]
    fn session_cookie_is_http_only() {
        let rendered = session_cookie("abc", &security()).to_string();
        assert!(rendered.starts_with("token=abc"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("SameSite=Lax"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn reads_token_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=jwt-value; lang=fr"));
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("jwt-value"));
    }

    #[test]
    fn falls_back_to_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer jwt-value"));
        assert_eq!(extract_token(&headers, "token").as_deref(), Some("jwt-value"));
    }

    #[test]
    fn empty_cookie_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("token="));
        assert_eq!(extract_token(&headers, "token"), None);
    }
}
