use std::fmt;

use bytes::{Buf, BytesMut};
use thiserror::Error;

use crate::http::headers::{find_crlf, HeaderError, Headers};
use crate::http::request::{
    is_valid_method, parse_content_length, Request, RequestLine, HTTP_VERSION,
};

/// Upper bound on the request line plus header section.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed request line: {0:?}")]
    MalformedRequestLine(String),
    #[error("invalid method: {0:?}")]
    InvalidMethod(String),
    #[error("unsupported http version: {0:?}")]
    UnsupportedVersion(String),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("request head exceeds {} bytes", MAX_HEAD_BYTES)]
    HeadTooLarge,
    #[error("stream ended while reading {stage}")]
    Truncated { stage: Stage },
}

/// Section of the request a truncated stream stopped in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    RequestLine,
    Headers,
    Body,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::RequestLine => "request line",
            Stage::Headers => "headers",
            Stage::Body => "body",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseState {
    ParsingRequestLine,
    ParsingHeaders,
    ParsingBody { expected: usize },
    Done,
    Error(ParseError),
}

/// Outcome of a successful [`RequestParser::feed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    NeedMore,
    Done,
}

/// Incremental HTTP/1.1 request parser.
///
/// Bytes are handed over in whatever pieces the transport delivers them.
/// The internal buffer only ever holds the unparsed tail, so no byte is
/// scanned twice once its line has been consumed.
#[derive(Debug)]
pub struct RequestParser {
    state: ParseState,
    buffer: BytesMut,
    line: Option<RequestLine>,
    headers: Headers,
    body: Vec<u8>,
    head_consumed: usize,
    received: usize,
}

impl Default for RequestParser {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestParser {
    pub fn new() -> Self {
        Self {
            state: ParseState::ParsingRequestLine,
            buffer: BytesMut::with_capacity(1024),
            line: None,
            headers: Headers::new(),
            body: Vec::new(),
            head_consumed: 0,
            received: 0,
        }
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    /// Total number of bytes fed so far.
    pub fn bytes_received(&self) -> usize {
        self.received
    }

    /// Appends `bytes` and advances the state machine as far as possible.
    ///
    /// Any error is fatal: the parser moves to [`ParseState::Error`] and every
    /// later call returns the same error.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Progress, ParseError> {
        match &self.state {
            ParseState::Done => return Ok(Progress::Done),
            ParseState::Error(e) => return Err(e.clone()),
            _ => {}
        }

        self.received += bytes.len();
        self.buffer.extend_from_slice(bytes);

        while self.state != ParseState::Done {
            match self.step() {
                Ok(0) => break,
                Ok(n) => {
                    self.buffer.advance(n);
                    if self.head_consumed > MAX_HEAD_BYTES {
                        self.state = ParseState::Error(ParseError::HeadTooLarge);
                        return Err(ParseError::HeadTooLarge);
                    }
                }
                Err(e) => {
                    self.state = ParseState::Error(e.clone());
                    return Err(e);
                }
            }
        }

        if self.state == ParseState::Done {
            return Ok(Progress::Done);
        }

        let in_head = matches!(
            self.state,
            ParseState::ParsingRequestLine | ParseState::ParsingHeaders
        );
        if in_head && self.head_consumed + self.buffer.len() > MAX_HEAD_BYTES {
            self.state = ParseState::Error(ParseError::HeadTooLarge);
            return Err(ParseError::HeadTooLarge);
        }

        Ok(Progress::NeedMore)
    }

    /// Consumes the parser once the stream has ended or parsing is done.
    ///
    /// Ending anywhere short of [`ParseState::Done`] is a truncation error.
    pub fn finish(self) -> Result<Request, ParseError> {
        match self.state {
            ParseState::Done => {
                let line = self.line.ok_or(ParseError::Truncated {
                    stage: Stage::RequestLine,
                })?;
                Ok(Request {
                    line,
                    headers: self.headers,
                    body: self.body,
                })
            }
            ParseState::Error(e) => Err(e),
            ParseState::ParsingRequestLine => Err(ParseError::Truncated {
                stage: Stage::RequestLine,
            }),
            ParseState::ParsingHeaders => Err(ParseError::Truncated {
                stage: Stage::Headers,
            }),
            ParseState::ParsingBody { .. } => Err(ParseError::Truncated { stage: Stage::Body }),
        }
    }

    /// Runs one transition and returns the number of bytes it consumed.
    /// Zero means more input is needed.
    fn step(&mut self) -> Result<usize, ParseError> {
        match self.state {
            ParseState::ParsingRequestLine => {
                let Some(idx) = find_crlf(&self.buffer) else {
                    return Ok(0);
                };
                let line = parse_request_line(&self.buffer[..idx])?;
                tracing::trace!(method = %line.method, target = %line.target, "request line parsed");

                self.line = Some(line);
                self.state = ParseState::ParsingHeaders;
                self.head_consumed += idx + 2;
                Ok(idx + 2)
            }

            ParseState::ParsingHeaders => {
                let (n, done) = self.headers.parse_line(&self.buffer)?;
                self.head_consumed += n;

                if done {
                    let length = self.headers.get("content-length");
                    self.state = match length.and_then(parse_content_length) {
                        Some(expected) if expected > 0 => {
                            self.body.reserve(expected.min(MAX_HEAD_BYTES));
                            ParseState::ParsingBody { expected }
                        }
                        _ => ParseState::Done,
                    };
                }
                Ok(n)
            }

            ParseState::ParsingBody { expected } => {
                let wanted = expected - self.body.len();
                let n = wanted.min(self.buffer.len());
                self.body.extend_from_slice(&self.buffer[..n]);

                if self.body.len() == expected {
                    self.state = ParseState::Done;
                }
                Ok(n)
            }

            ParseState::Done | ParseState::Error(_) => Ok(0),
        }
    }
}

fn parse_request_line(raw: &[u8]) -> Result<RequestLine, ParseError> {
    let lossy = || String::from_utf8_lossy(raw).into_owned();

    let line = std::str::from_utf8(raw).map_err(|_| ParseError::MalformedRequestLine(lossy()))?;
    let (method, target, version) =
        RequestLine::split(line).ok_or_else(|| ParseError::MalformedRequestLine(lossy()))?;

    if !is_valid_method(method) {
        return Err(ParseError::InvalidMethod(method.to_string()));
    }
    if version != HTTP_VERSION {
        return Err(ParseError::UnsupportedVersion(version.to_string()));
    }

    Ok(RequestLine {
        method: method.to_string(),
        target: target.to_string(),
        version: version.to_string(),
    })
}

/// Parses a complete request held in a single buffer.
pub fn parse_request(buf: &[u8]) -> Result<Request, ParseError> {
    let mut parser = RequestParser::new();
    parser.feed(buf)?;
    parser.finish()
}
