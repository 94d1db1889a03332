//! Protocol-level HTTP types and the connection abstraction
//!
//! This module provides:
//! - `Request` / `Response` values exchanged with a [`Conn`]
//! - The [`Conn`] trait, the seam between request construction and the network
//! - Path and form-parameter encoding shared by the connection and the signer
//! - [`HttpConn`], the hyper-backed production connection

pub mod conn;

pub use conn::HttpConn;
pub use hyper::header::HeaderMap;
pub use hyper::{Method, StatusCode};

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::io::{Read, Seek};
use std::time::Duration;
use thiserror::Error;

/// Hex lookup table for percent encoding
static HEX_UPPER: &[u8; 16] = b"0123456789ABCDEF";

/// Content type attached to parameterized requests without a body
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// A readable, seekable byte stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Request body: seekable so it can be hashed and then re-read for transmission.
pub type Body = Box<dyn ReadSeek + Send>;

/// Transport errors
#[derive(Error, Debug)]
pub enum ConnError {
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Endpoint has no host: {0}")]
    MissingHost(String),

    #[error("Invalid URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Request build error: {0}")]
    Build(#[from] hyper::http::Error),

    #[error("Request to {host} failed: {message}")]
    Request { host: String, message: String },

    #[error("Body error: {0}")]
    Body(#[from] hyper::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("TLS error: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Query parameters, kept in insertion order with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    pairs: Vec<(String, String)>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter, replacing the value of an existing one in place.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(pair) => pair.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Parameters::new();
        for (k, v) in iter {
            params.set(k, v);
        }
        params
    }
}

/// A protocol-level request, built fresh for every operation.
///
/// The path is kept unencoded (`/bucket/some key`); connections and signers
/// encode it with [`encode_path`] so both agree on the wire form.
pub struct Request {
    pub method: Method,
    pub path: String,
    pub headers: BTreeMap<String, String>,
    pub parameters: Parameters,
    pub body: Option<Body>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: BTreeMap::new(),
            parameters: Parameters::new(),
            body: None,
        }
    }

    /// Look up a header by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("parameters", &self.parameters)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// A response received from the server, whatever its status.
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Box<dyn Read + Send>,
}

impl Response {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Read + Send + 'static) -> Self {
        Self {
            status,
            headers,
            body: Box::new(body),
        }
    }

    /// Read the remaining body to the end.
    pub fn read_body(&mut self) -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.body.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// A connection to one server over HTTP or HTTPS.
///
/// Returns a response if and only if one was received: a 500 from the server
/// is an `Ok(Response)`, not a `ConnError`.
pub trait Conn: Send + Sync {
    fn send_request(&self, request: Request) -> Result<Response, ConnError>;
}

/// Percent-encode a request path, preserving `/`.
/// Returns Cow::Borrowed when no encoding is needed.
pub fn encode_path(path: &str) -> Cow<'_, str> {
    let needs_encoding = path
        .bytes()
        .any(|b| !matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/'));

    if !needs_encoding {
        return Cow::Borrowed(path);
    }

    let mut result = String::with_capacity(path.len() + 32);
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                result.push(byte as char);
            }
            _ => {
                result.push('%');
                result.push(HEX_UPPER[(byte >> 4) as usize] as char);
                result.push(HEX_UPPER[(byte & 0xf) as usize] as char);
            }
        }
    }
    Cow::Owned(result)
}

/// Form-encode parameters as `name=value` pairs joined by `&`, in insertion order.
///
/// Spaces become `%20` (never `+`), reserved characters are escaped and
/// non-ASCII text is escaped byte by byte from its UTF-8 encoding.
pub fn encode_parameters(params: &Parameters) -> String {
    let mut out = String::with_capacity(params.len() * 32);
    for (i, (name, value)) in params.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(&urlencoding::encode(name));
        out.push('=');
        out.push_str(&urlencoding::encode(value));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_parameters_single() {
        let params: Parameters = [("taco", "burrito")].into_iter().collect();
        assert_eq!(encode_parameters(&params), "taco=burrito");
    }

    #[test]
    fn test_encode_parameters_keeps_insertion_order() {
        let params: Parameters = [
            ("taco", "burrito"),
            ("enchilada", "queso"),
            ("nachos", "carnitas"),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            encode_parameters(&params),
            "taco=burrito&enchilada=queso&nachos=carnitas"
        );
    }

    #[test]
    fn test_encode_parameters_escaping() {
        let params: Parameters = [("타코", "burrito"), ("b&az=", "qu ?x")].into_iter().collect();
        assert_eq!(
            encode_parameters(&params),
            "%ED%83%80%EC%BD%94=burrito&b%26az%3D=qu%20%3Fx"
        );
    }

    #[test]
    fn test_encode_parameters_empty() {
        assert_eq!(encode_parameters(&Parameters::new()), "");
    }

    #[test]
    fn test_parameters_set_replaces() {
        let mut params = Parameters::new();
        params.set("marker", "a");
        params.set("prefix", "p");
        params.set("marker", "b");
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("marker"), Some("b"));
        assert_eq!(encode_parameters(&params), "marker=b&prefix=p");
    }

    #[test]
    fn test_encode_path() {
        assert!(matches!(encode_path("/bucket/a/b.txt"), Cow::Borrowed(_)));
        assert_eq!(encode_path("/bucket/some key"), "/bucket/some%20key");
        assert_eq!(encode_path("/bucket/타코"), "/bucket/%ED%83%80%EC%BD%94");
        assert_eq!(encode_path("/bucket/a?b#c"), "/bucket/a%3Fb%23c");
    }

    #[test]
    fn test_request_header_lookup_ignores_case() {
        let mut req = Request::new(Method::GET, "/b/k");
        req.headers.insert("Content-MD5".to_string(), "abc".to_string());
        assert_eq!(req.header("content-md5"), Some("abc"));
        assert_eq!(req.header("date"), None);
    }
}
