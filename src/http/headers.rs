//! HTTP header collection.
//!
//! Names are case-insensitive and stored lower-cased. Setting a name that is
//! already present folds the new value into the existing one (`"1, 2"`), which
//! is how repeated header lines are combined on the wire.

use thiserror::Error;

const CRLF: &[u8] = b"\r\n";

/// Punctuation allowed in a header name besides ASCII letters and digits.
const TOKEN_PUNCTUATION: &[u8] = b"!#$%&'*+-.^_`|~";

/// Errors raised while parsing a single header line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("malformed header line: missing ':'")]
    MissingColon,
    #[error("invalid header name {0:?}: whitespace before ':'")]
    WhitespaceBeforeColon(String),
    #[error("header name is empty")]
    EmptyName,
    #[error("invalid header token found: {0:?}")]
    InvalidToken(String),
    #[error("header line is not valid UTF-8")]
    InvalidEncoding,
}

/// Ordered collection of header fields keyed by lower-cased name.
///
/// Iteration yields entries in insertion order, so serializing the same
/// collection twice always produces the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses at most one header line from the front of `buf`.
    ///
    /// Returns `(consumed, done)`:
    ///
    /// - `(0, false)` when `buf` holds no complete line yet; the caller must
    ///   supply more bytes and retry with the same prefix.
    /// - `(2, true)` when the line is empty, marking the end of the header
    ///   section. The terminating CRLF is consumed.
    /// - `(line_len + 2, false)` after a header was parsed and merged.
    pub fn parse_line(&mut self, buf: &[u8]) -> Result<(usize, bool), HeaderError> {
        let Some(idx) = find_crlf(buf) else {
            return Ok((0, false));
        };

        if idx == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = std::str::from_utf8(&buf[..idx]).map_err(|_| HeaderError::InvalidEncoding)?;
        let (raw_name, value) = line.split_once(':').ok_or(HeaderError::MissingColon)?;

        // "Host : x" is obsolete line folding
        if raw_name.ends_with(|c: char| c.is_ascii_whitespace()) {
            return Err(HeaderError::WhitespaceBeforeColon(raw_name.to_string()));
        }

        let name = raw_name.trim().to_ascii_lowercase();
        if name.is_empty() {
            return Err(HeaderError::EmptyName);
        }
        if !is_valid_token(&name) {
            return Err(HeaderError::InvalidToken(name));
        }

        self.set(&name, value.trim());
        Ok((idx + CRLF.len(), false))
    }

    /// Inserts `value` under `name`, appending with `", "` if the name exists.
    pub fn set(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => self.entries.push((name, value.to_string())),
        }
    }

    /// Inserts `value` under `name`, discarding any previous value.
    pub fn replace(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.entries.push((name, value.to_string())),
        }
    }

    /// Removes `name`, returning its value if it was present.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let idx = self
            .entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(idx).1)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Appends every entry as `name: value\r\n`.
    pub(crate) fn write_to(&self, buf: &mut Vec<u8>) {
        for (name, value) in self.iter() {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(value.as_bytes());
            buf.extend_from_slice(CRLF);
        }
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.set(k.as_ref(), v.as_ref());
        }
        headers
    }
}

pub(crate) fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Returns true if `name` is a non-empty RFC 9110 token.
pub fn is_valid_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || TOKEN_PUNCTUATION.contains(&b))
}
