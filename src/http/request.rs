use crate::http::headers::Headers;

/// The only protocol version accepted on the request line.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// First line of an HTTP request.
///
/// Constructed by the parser after the method and version have been
/// validated; it is never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// Request method, upper-case ASCII letters only (e.g. "GET")
    pub method: String,
    /// The request target as sent (e.g. "/search?q=rust")
    pub target: String,
    /// Always "HTTP/1.1"
    pub version: String,
}

/// Represents a parsed HTTP request from a client.
///
/// The body is exactly `Content-Length` bytes long, or empty when that header
/// is absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub line: RequestLine,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl RequestLine {
    /// Parses `METHOD target HTTP/1.1` (without the trailing CRLF).
    ///
    /// Returns `None` if the line does not split into exactly three
    /// single-space separated tokens.
    pub(crate) fn split(line: &str) -> Option<(&str, &str, &str)> {
        let mut parts = line.split(' ');
        let method = parts.next()?;
        let target = parts.next()?;
        let version = parts.next()?;

        if parts.next().is_some() || target.is_empty() {
            return None;
        }

        Some((method, target, version))
    }
}

/// Returns true if `method` is a non-empty run of upper-case ASCII letters.
///
/// # Example
///
/// ```
/// # use rawhttp::http::request::is_valid_method;
/// assert!(is_valid_method("GET"));
/// assert!(!is_valid_method("get"));
/// ```
pub fn is_valid_method(method: &str) -> bool {
    !method.is_empty() && method.bytes().all(|b| b.is_ascii_uppercase())
}

/// Parses a `Content-Length` value. Only plain ASCII digits are accepted.
pub fn parse_content_length(value: &str) -> Option<usize> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}

impl Request {
    pub fn method(&self) -> &str {
        &self.line.method
    }

    pub fn target(&self) -> &str {
        &self.line.target
    }

    /// Retrieves a header value by name (case-insensitive).
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key)
    }

    /// Parses the Content-Length header.
    ///
    /// Returns `None` if the header is missing or not a non-negative integer.
    pub fn content_length(&self) -> Option<usize> {
        self.header("Content-Length").and_then(parse_content_length)
    }
}
