//! Incoming HTTP request type.

use std::collections::HashMap;
use std::str::FromStr;

use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::body::DecodedBody;
use crate::error::Error;
use crate::method::Method;

/// An incoming HTTP request.
///
/// The server frontend builds one per request with the body already read in
/// full; tests and demos build them in-process via the shortcut constructors:
///
/// ```rust
/// use twine::Request;
///
/// let req = Request::get("/hello?name=roni").build();
/// assert_eq!(req.query("name"), Some("roni"));
/// ```
pub struct Request {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Bytes,
    params: HashMap<String, String>,
}

impl Request {
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The raw body bytes. Decoding never consumes them.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns a cookie value from the `cookie` header.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.header("cookie")?
            .split(';')
            .map(str::trim)
            .filter_map(|pair| pair.split_once('='))
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v)
    }

    /// Returns a query parameter, percent-decoded.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns a query parameter, or `default` when absent.
    pub fn query_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.query(name).unwrap_or(default)
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/:id`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Decodes the body as declared by the `content-type` header into the
    /// format-agnostic field map. See [`DecodedBody`].
    pub async fn decode(&self) -> Result<DecodedBody, Error> {
        DecodedBody::decode(self.header("content-type"), &self.body).await
    }

    /// Decodes the body and deserializes it into `T`.
    ///
    /// All four body formats funnel through the same structured shape, so
    /// `#[serde(alias = "...")]` on a field accepts differently named source
    /// keys across formats.
    pub async fn parse<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.decode().await?.parse()
    }

    pub(crate) fn set_params(&mut self, params: HashMap<String, String>) {
        self.params = params;
    }
}

// ── Construction ──────────────────────────────────────────────────────────────

impl Request {
    /// Starts a `GET` request to `target` (path plus optional query string).
    pub fn get(target: &str) -> RequestBuilder {
        RequestBuilder::new(Method::Get, target)
    }

    /// Starts a `POST` request to `target`.
    pub fn post(target: &str) -> RequestBuilder {
        RequestBuilder::new(Method::Post, target)
    }

    /// Starts a request with an explicit method.
    pub fn builder(method: Method, target: &str) -> RequestBuilder {
        RequestBuilder::new(method, target)
    }
}

/// Builds a [`Request`] without a live connection.
pub struct RequestBuilder {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Bytes,
}

impl RequestBuilder {
    fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(Some(query))),
            None => (target, Vec::new()),
        };
        Self {
            method,
            path: path.to_owned(),
            query,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Request {
        Request {
            method: self.method,
            path: self.path,
            query: self.query,
            headers: self.headers,
            body: self.body,
            params: HashMap::new(),
        }
    }
}

/// Builds a [`Request`] from hyper's parts once the body is fully read.
///
/// Returns `None` for a method outside the RFC 9110 set — the caller answers
/// with `405 Method Not Allowed` before routing.
pub(crate) fn from_hyper(
    parts: &http::request::Parts,
    body: Bytes,
) -> Option<Request> {
    let method = Method::from_str(parts.method.as_str()).ok()?;
    let headers = parts
        .headers
        .iter()
        .map(|(k, v)| (k.as_str().to_owned(), String::from_utf8_lossy(v.as_bytes()).into_owned()))
        .collect();

    Some(Request {
        method,
        path: parts.uri.path().to_owned(),
        query: parse_query(parts.uri.query()),
        headers,
        body,
        params: HashMap::new(),
    })
}

fn parse_query(query: Option<&str>) -> Vec<(String, String)> {
    // An undecodable query string is treated as absent rather than failing
    // the request before routing.
    query
        .and_then(|q| serde_urlencoded::from_str::<Vec<(String, String)>>(q).ok())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_percent_decoded() {
        let req = Request::get("/hello?name=Roni+Purwanto&x=a%20b").build();
        assert_eq!(req.query("name"), Some("Roni Purwanto"));
        assert_eq!(req.query("x"), Some("a b"));
    }

    #[test]
    fn query_default_applies_when_absent() {
        let req = Request::get("/hello").build();
        assert_eq!(req.query_or("name", "Guest"), "Guest");

        let req = Request::get("/hello?name=roni").build();
        assert_eq!(req.query_or("name", "Guest"), "roni");
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::get("/").header("X-Token", "abc").build();
        assert_eq!(req.header("x-token"), Some("abc"));
    }

    #[test]
    fn cookies_come_from_the_cookie_header() {
        let req = Request::get("/")
            .header("cookie", "lastname=Purwanto; theme=dark")
            .build();
        assert_eq!(req.cookie("lastname"), Some("Purwanto"));
        assert_eq!(req.cookie("theme"), Some("dark"));
        assert_eq!(req.cookie("missing"), None);
    }
}
