use std::fmt;

use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::headers::Headers;
use crate::http::request::HTTP_VERSION;
use crate::http::response::StatusCode;

const CRLF: &[u8] = b"\r\n";
const LAST_CHUNK: &[u8] = b"0\r\n";

/// Which section the writer will accept next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    ExpectStatusLine,
    ExpectHeaders,
    ExpectBody,
}

impl fmt::Display for WriterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WriterState::ExpectStatusLine => "expecting status line",
            WriterState::ExpectHeaders => "expecting headers",
            WriterState::ExpectBody => "expecting body",
        })
    }
}

#[derive(Debug, Error)]
pub enum WriterError {
    #[error("cannot write {operation} while {state}")]
    OutOfOrder {
        operation: &'static str,
        state: WriterState,
    },
    #[error("cannot write {operation} after the chunked body was closed")]
    Finished { operation: &'static str },
    #[error("write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes a response section by section, in order.
///
/// Status line, then headers, then any number of body writes. A body may be
/// written raw or framed as chunks; a chunked body is closed by exactly one
/// of [`write_chunked_body_done`](Self::write_chunked_body_done) or
/// [`write_trailers`](Self::write_trailers).
#[derive(Debug)]
pub struct ResponseWriter<W> {
    inner: W,
    state: WriterState,
    // Set once a chunked body has been terminated.
    finished: bool,
}

impl<W> ResponseWriter<W>
where
    W: AsyncWrite + Unpin,
{
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            state: WriterState::ExpectStatusLine,
            finished: false,
        }
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    /// Writes `HTTP/1.1 <code> <reason>\r\n`.
    pub async fn write_status_line(&mut self, status: StatusCode) -> Result<(), WriterError> {
        self.ensure_state(WriterState::ExpectStatusLine, "status line")?;

        let line = format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            status.as_u16(),
            status.reason_phrase()
        );
        self.inner.write_all(line.as_bytes()).await?;

        self.state = WriterState::ExpectHeaders;
        Ok(())
    }

    /// Writes every header as `name: value\r\n`, then the blank line.
    pub async fn write_headers(&mut self, headers: &Headers) -> Result<(), WriterError> {
        self.ensure_state(WriterState::ExpectHeaders, "headers")?;

        let mut buf = Vec::with_capacity(256);
        headers.write_to(&mut buf);
        buf.extend_from_slice(CRLF);
        self.inner.write_all(&buf).await?;

        self.state = WriterState::ExpectBody;
        Ok(())
    }

    /// Writes `body` verbatim. May be called repeatedly.
    pub async fn write_body(&mut self, body: &[u8]) -> Result<(), WriterError> {
        self.ensure_state(WriterState::ExpectBody, "body")?;
        self.inner.write_all(body).await?;
        Ok(())
    }

    /// Writes one chunk: hex length, CRLF, `chunk`, CRLF.
    ///
    /// An empty `chunk` writes nothing, since a zero-length frame would end
    /// the body.
    pub async fn write_chunked_body(&mut self, chunk: &[u8]) -> Result<(), WriterError> {
        self.ensure_state(WriterState::ExpectBody, "chunked body")?;
        if chunk.is_empty() {
            return Ok(());
        }

        let mut buf = Vec::with_capacity(chunk.len() + 12);
        buf.extend_from_slice(format!("{:x}", chunk.len()).as_bytes());
        buf.extend_from_slice(CRLF);
        buf.extend_from_slice(chunk);
        buf.extend_from_slice(CRLF);
        self.inner.write_all(&buf).await?;
        Ok(())
    }

    /// True once the chunked body has been closed. Every later write fails.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Closes a chunked body with `0\r\n\r\n` and no trailers.
    pub async fn write_chunked_body_done(&mut self) -> Result<(), WriterError> {
        self.ensure_state(WriterState::ExpectBody, "chunked body terminator")?;

        self.finished = true;
        self.inner.write_all(LAST_CHUNK).await?;
        self.inner.write_all(CRLF).await?;
        Ok(())
    }

    /// Closes a chunked body with `0\r\n`, the trailer fields, and a blank
    /// line.
    pub async fn write_trailers(&mut self, trailers: &Headers) -> Result<(), WriterError> {
        self.ensure_state(WriterState::ExpectBody, "trailers")?;

        let mut buf = Vec::with_capacity(128);
        buf.extend_from_slice(LAST_CHUNK);
        trailers.write_to(&mut buf);
        buf.extend_from_slice(CRLF);
        self.finished = true;
        self.inner.write_all(&buf).await?;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), WriterError> {
        self.inner.flush().await?;
        Ok(())
    }

    fn ensure_state(&self, state: WriterState, operation: &'static str) -> Result<(), WriterError> {
        if self.finished {
            return Err(WriterError::Finished { operation });
        }
        if self.state != state {
            return Err(WriterError::OutOfOrder {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}
