//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. The core builds `HttpRequest`
//! values and interprets `HttpResponse` values without touching the network;
//! the host executes the round-trip with whatever transport it owns.
//!
//! All fields use owned types (`String`, `Vec`) so values can cross the FFI
//! boundary without lifetime concerns.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use url::Url;

use crate::redirect::RedirectType;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

/// An HTTP request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Sets a header, replacing any existing header of the same name
    /// (compared case-insensitively).
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Turns the request into a POST carrying `body` as JSON.
    pub fn with_json_body<B>(mut self, body: &B) -> Result<Self, serde_json::Error>
    where
        B: Serialize + ?Sized,
    {
        let bytes = serde_json::to_vec(body)?;
        self.method = HttpMethod::Post;
        self.body = Some(bytes);
        Ok(self.with_header("Content-Type", "application/json"))
    }

    /// Turns the request into a POST carrying `body` verbatim.
    pub fn with_form_body(mut self, body: &str) -> Self {
        self.method = HttpMethod::Post;
        self.body = Some(body.as_bytes().to_vec());
        self
    }

    pub fn with_basic_auth(self, username: &str, password: &str) -> Self {
        let credentials = STANDARD.encode(format!("{username}:{password}"));
        self.with_header("Authorization", format!("Basic {credentials}"))
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
///
/// Constructed by the host after executing an `HttpRequest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Value of the first header named `name` (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Raw `Content-Type` header value, parameters included.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// URL of the `rel` entry in a `Link`-style header, e.g.
    /// `<https://api.example/items?page=2>; rel="next"`. Header name and rel
    /// are compared case-insensitively; entries whose target is not an
    /// absolute URL are ignored.
    pub fn link(&self, header_name: &str, rel: &str) -> Option<Url> {
        parse_link_header(self.header(header_name)?, rel)
    }

    pub fn redirect_type(&self) -> RedirectType {
        RedirectType::from_status(self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn parse_link_header(value: &str, rel: &str) -> Option<Url> {
    value.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts
            .next()?
            .trim()
            .strip_prefix('<')?
            .strip_suffix('>')?;
        let has_rel = parts.any(|param| {
            param.split_once('=').is_some_and(|(key, names)| {
                key.trim().eq_ignore_ascii_case("rel")
                    && names
                        .trim()
                        .trim_matches('"')
                        .split_whitespace()
                        .any(|name| name.eq_ignore_ascii_case(rel))
            })
        });
        if has_rel {
            Url::parse(target).ok()
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINK: &str = concat!(
        "<https://api.feedbin.com/v2/saved_searches/5122.json?page=2>; rel=\"next\", ",
        "<💩>; rel=\"notaurl\", ",
        "<https://api.feedbin.com/v2/saved_searches/5122.json?page=196>; rel=\"last\"",
    );

    fn response_with_link() -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: vec![("Link".to_string(), LINK.to_string())],
            body: Vec::new(),
        }
    }

    #[test]
    fn link_lookup() {
        let response = response_with_link();
        assert_eq!(response.link("foo", "bar"), None);
        assert_eq!(response.link("Link", "bar"), None);
        assert_eq!(
            response.link("Link", "next").unwrap().as_str(),
            "https://api.feedbin.com/v2/saved_searches/5122.json?page=2"
        );
        assert_eq!(
            response.link("Link", "last").unwrap().as_str(),
            "https://api.feedbin.com/v2/saved_searches/5122.json?page=196"
        );
        assert_eq!(response.link("Link", "notaurl"), None);
    }

    #[test]
    fn link_lookup_ignores_case() {
        let response = response_with_link();
        assert_eq!(
            response.link("LINK", "NEXT").unwrap().as_str(),
            "https://api.feedbin.com/v2/saved_searches/5122.json?page=2"
        );
        assert_eq!(
            response.link("LINK", "LAST").unwrap().as_str(),
            "https://api.feedbin.com/v2/saved_searches/5122.json?page=196"
        );
        assert_eq!(response.link("z", "LAST"), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let response = HttpResponse {
            status: 200,
            headers: vec![(
                "content-type".to_string(),
                "application/json; charset=utf-8".to_string(),
            )],
            body: Vec::new(),
        };
        assert_eq!(response.content_type(), Some("application/json; charset=utf-8"));
        assert_eq!(response.header("CONTENT-TYPE"), response.content_type());
        assert_eq!(response.header("Location"), None);
    }

    #[test]
    fn redirect_type_follows_status() {
        let mut response = response_with_link();
        response.status = 308;
        assert_eq!(response.redirect_type(), RedirectType::Permanent);
        response.status = 307;
        assert_eq!(response.redirect_type(), RedirectType::Temporary);
    }

    #[test]
    fn json_body_makes_a_post() {
        let request = HttpRequest::get("https://api.example.test/filters")
            .with_json_body(&serde_json::json!({"criteria": "from:ada"}))
            .unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("content-type"), Some("application/json"));
        let body: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["criteria"], "from:ada");
    }

    #[test]
    fn form_body_is_sent_verbatim() {
        let request = HttpRequest::get("https://api.example.test/token")
            .with_form_body("grant_type=refresh_token");
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body.as_deref(), Some(&b"grant_type=refresh_token"[..]));
        assert_eq!(request.header("Content-Type"), None);
    }

    #[test]
    fn basic_auth_header() {
        let request = HttpRequest::get("https://api.example.test/login")
            .with_basic_auth("Aladdin", "open sesame");
        assert_eq!(
            request.header("authorization"),
            Some("Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==")
        );
    }

    #[test]
    fn with_header_replaces_existing_value() {
        let request = HttpRequest::get("https://api.example.test/")
            .with_header("Accept", "text/html")
            .with_header("accept", "application/json");
        assert_eq!(request.headers, vec![("accept".to_string(), "application/json".to_string())]);
    }
}
