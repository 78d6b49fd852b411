//! Session cookie and bearer token handling.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use gatehouse_session::Credential;

use crate::config::CookieConfig;

/// Returns the value of cookie `name` from the `Cookie` header(s).
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn parse_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_string())
}

/// The credentials a request presents, in the order they are tried: the
/// session cookie first, then a bearer key.
pub fn credentials_from_headers(headers: &HeaderMap, cookie_name: &str) -> Vec<Credential> {
    let session = parse_cookie(headers, cookie_name)
        .filter(|token| !token.is_empty())
        .map(Credential::SessionToken);
    let api_key = parse_bearer(headers).map(Credential::ApiKey);
    session.into_iter().chain(api_key).collect()
}

/// `Set-Cookie` value that installs a session token for `max_age_secs`.
pub fn session_cookie(config: &CookieConfig, token: &str, max_age_secs: u64) -> Option<HeaderValue> {
    build(config, token, max_age_secs)
}

/// `Set-Cookie` value that makes the browser drop the session cookie.
pub fn clear_cookie(config: &CookieConfig) -> Option<HeaderValue> {
    build(config, "", 0)
}

fn build(config: &CookieConfig, value: &str, max_age_secs: u64) -> Option<HeaderValue> {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        config.name, value, max_age_secs
    );
    if let Some(domain) = &config.domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if config.secure {
        cookie.push_str("; Secure");
    }
    // Only fails on control characters, which neither tokens nor a sane
    // config contain.
    HeaderValue::from_str(&cookie).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_parse_cookie_finds_named_cookie() {
        let h = headers(&[("cookie", "theme=dark; session=abc$@~; lang=en")]);
        assert_eq!(parse_cookie(&h, "session").as_deref(), Some("abc$@~"));
        assert_eq!(parse_cookie(&h, "missing"), None);
    }

    #[test]
    fn test_parse_cookie_across_multiple_headers() {
        let h = headers(&[("cookie", "a=1"), ("cookie", "session=xyz")]);
        assert_eq!(parse_cookie(&h, "session").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_parse_bearer_case_insensitive_scheme() {
        let h = headers(&[("authorization", "bearer tok123")]);
        assert_eq!(parse_bearer(&h).as_deref(), Some("tok123"));

        let basic = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(parse_bearer(&basic), None);
    }

    #[test]
    fn test_credentials_from_headers_cookie_first() {
        let h = headers(&[
            ("cookie", "session=s1"),
            ("authorization", "Bearer k1"),
        ]);
        assert_eq!(
            credentials_from_headers(&h, "session"),
            vec![
                Credential::SessionToken("s1".into()),
                Credential::ApiKey("k1".into()),
            ]
        );

        let key_only = headers(&[("cookie", "session="), ("authorization", "Bearer k1")]);
        assert_eq!(
            credentials_from_headers(&key_only, "session"),
            vec![Credential::ApiKey("k1".into())]
        );
        assert!(credentials_from_headers(&HeaderMap::new(), "session").is_empty());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let config = CookieConfig {
            name: "sid".into(),
            domain: Some("example.com".into()),
            secure: true,
        };
        let value = session_cookie(&config, "tok", 3600).unwrap();
        assert_eq!(
            value.to_str().unwrap(),
            "sid=tok; HttpOnly; Path=/; Max-Age=3600; Domain=example.com; Secure"
        );

        let plain = CookieConfig {
            secure: false,
            ..CookieConfig::default()
        };
        assert_eq!(
            clear_cookie(&plain).unwrap().to_str().unwrap(),
            "session=; HttpOnly; Path=/; Max-Age=0"
        );
    }
}
