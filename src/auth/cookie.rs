use std::time::Duration;

use axum::http::{header, HeaderMap, HeaderValue};

pub const REFRESH_COOKIE_NAME: &str = "refreshToken";

/// Returns the value of cookie `name`, looking through every `Cookie` header.
pub fn get_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub fn refresh_cookie(token: &str, max_age: Duration, secure: bool) -> anyhow::Result<HeaderValue> {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; Max-Age={}",
        REFRESH_COOKIE_NAME,
        token,
        max_age.as_secs()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    Ok(HeaderValue::from_str(&cookie)?)
}

pub fn clear_refresh_cookie() -> HeaderValue {
    HeaderValue::from_static("refreshToken=; HttpOnly; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; refreshToken=abc.def.ghi; lang=en"),
        );
        assert_eq!(
            get_cookie(&headers, REFRESH_COOKIE_NAME).as_deref(),
            Some("abc.def.ghi")
        );
        assert_eq!(get_cookie(&headers, "missing"), None);
    }

    #[test]
    fn reads_cookie_from_second_header() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("refreshToken=t"));
        assert_eq!(get_cookie(&headers, REFRESH_COOKIE_NAME).as_deref(), Some("t"));
    }

    #[test]
    fn empty_value_counts_as_missing() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("refreshToken="));
        assert_eq!(get_cookie(&headers, REFRESH_COOKIE_NAME), None);
    }

    #[test]
    fn refresh_cookie_attributes() {
        let v = refresh_cookie("tok", Duration::from_secs(30 * 24 * 60 * 60), false).unwrap();
        let s = v.to_str().unwrap();
        assert!(s.starts_with("refreshToken=tok;"));
        assert!(s.contains("HttpOnly"));
        assert!(s.contains("Max-Age=2592000"));
        assert!(!s.contains("Secure"));

        let secure = refresh_cookie("tok", Duration::from_secs(60), true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }
}
