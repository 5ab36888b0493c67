//! Relay to a plain-HTTP upstream.
//!
//! The upstream body is re-framed into fixed-size chunks as it arrives and
//! closed with trailers carrying its SHA-256 digest and length, which are
//! only known once the last byte has been forwarded.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::BytesMut;
use sha2::{Digest, Sha256};
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::config::RelayConfig;
use crate::http::headers::{find_crlf, Headers};
use crate::http::parser::MAX_HEAD_BYTES;
use crate::http::request::parse_content_length;
use crate::http::response::{default_headers, HandlerError, StatusCode};
use crate::http::writer::ResponseWriter;

/// Default buffer size for streaming
const BUFFER_SIZE: usize = 8192;


pub const TRAILER_NAMES: &str = "X-Content-SHA256, X-Content-Length";

/// Status line and headers of an upstream response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamHead {
    pub status: StatusCode,
    pub headers: Headers,
}

impl UpstreamHead {
    pub fn content_length(&self) -> Option<usize> {
        self.headers
            .get("content-length")
            .and_then(parse_content_length)
    }
}

pub struct RelayClient {
    host: String,
    port: u16,
    base_path: String,
    connect_timeout: Duration,
    request_timeout: Duration,
    chunk_size: usize,
}

impl RelayClient {
    pub fn new(cfg: &RelayConfig) -> Result<Self> {
        let url = Url::parse(&cfg.upstream).context("Invalid upstream URL")?;
        if url.scheme() != "http" {
            bail!("unsupported upstream scheme {:?}", url.scheme());
        }

        let host = url.host_str().context("Upstream URL missing host")?.to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        Ok(Self {
            host,
            port,
            base_path: url.path().trim_end_matches('/').to_string(),
            connect_timeout: cfg.connect_timeout(),
            request_timeout: cfg.request_timeout(),
            chunk_size: cfg.chunk_size.max(1),
        })
    }

    /// Builds the upstream request for `path` (relative to the upstream base).
    pub fn build_request(&self, path: &str) -> Vec<u8> {
        let host = if self.port == 80 {
            self.host.clone()
        } else {
            format!("{}:{}", self.host, self.port)
        };

        // HTTP/1.0 keeps the upstream from chunking its reply
        format!(
            "GET {}/{} HTTP/1.0\r\nHost: {}\r\nConnection: close\r\n\r\n",
            self.base_path,
            path.trim_start_matches('/'),
            host
        )
        .into_bytes()
    }

    /// Fetches `path` from the upstream and streams it to `w` as a chunked
    /// body followed by digest trailers.
    ///
    /// Failing to reach the upstream or read its head is reported before any
    /// output is written.
    pub async fn forward<W>(&self, w: &mut ResponseWriter<W>, path: &str) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin,
    {
        tracing::info!(upstream = %self.host, path, "Relaying request");

        let (mut stream, head, leftover) = self.open(path).await.map_err(|e| {
            tracing::warn!(upstream = %self.host, error = %e, "upstream request failed");
            HandlerError::internal(format!("upstream request failed: {e:#}"))
        })?;

        let mut headers = default_headers(0);
        headers.remove("Content-Length");
        headers.set("Transfer-Encoding", "chunked");
        headers.replace("Trailer", TRAILER_NAMES);
        if let Some(content_type) = head.headers.get("content-type") {
            headers.replace("Content-Type", content_type);
        }

        w.write_status_line(head.status).await?;
        w.write_headers(&headers).await?;

        let mut hasher = Sha256::new();
        let mut total = 0usize;
        let mut remaining = head.content_length();
        let mut incoming = leftover;
        let mut pending = BytesMut::with_capacity(self.chunk_size * 2);

        loop {
            if let Some(rem) = remaining.as_mut() {
                incoming.truncate((*rem).min(incoming.len()));
                *rem -= incoming.len();
            }

            hasher.update(&incoming);
            total += incoming.len();
            pending.extend_from_slice(&incoming);
            incoming.clear();

            while pending.len() >= self.chunk_size {
                let chunk = pending.split_to(self.chunk_size);
                w.write_chunked_body(&chunk).await?;
            }

            if remaining == Some(0) {
                break;
            }

            incoming.reserve(BUFFER_SIZE);
            let n = match timeout(self.request_timeout, stream.read_buf(&mut incoming)).await {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => {
                    return Err(HandlerError::internal(format!("upstream read failed: {e}")));
                }
                Err(_) => return Err(HandlerError::internal("upstream read timed out")),
            };

            if n == 0 {
                if remaining.is_some() {
                    return Err(HandlerError::internal(
                        "upstream closed before complete body received",
                    ));
                }
                break;
            }
        }

        w.write_chunked_body(&pending).await?;

        let mut trailers = Headers::new();
        trailers.set("X-Content-SHA256", &format!("{:x}", hasher.finalize()));
        trailers.set("X-Content-Length", &total.to_string());
        w.write_trailers(&trailers).await?;

        tracing::debug!(upstream = %self.host, path, bytes = total, "relay complete");
        Ok(())
    }

    /// Connects, sends the request, and reads the response head.
    ///
    /// Returns the stream together with any body bytes read past the head.
    async fn open(&self, path: &str) -> Result<(TcpStream, UpstreamHead, BytesMut)> {
        let addr = format!("{}:{}", self.host, self.port);
        let mut stream = timeout(self.connect_timeout, TcpStream::connect(&addr))
            .await
            .context("Connection timeout")?
            .context("Failed to connect to upstream")?;

        tracing::trace!(upstream = %addr, "Connected to upstream");

        let (head, leftover) = timeout(self.request_timeout, self.exchange(&mut stream, path))
            .await
            .context("Request timeout")??;

        Ok((stream, head, leftover))
    }

    async fn exchange(&self, stream: &mut TcpStream, path: &str) -> Result<(UpstreamHead, BytesMut)> {
        stream.write_all(&self.build_request(path)).await?;
        stream.flush().await?;

        let mut buffer = BytesMut::with_capacity(BUFFER_SIZE);
        loop {
            let n = stream.read_buf(&mut buffer).await?;
            if n == 0 {
                bail!("Connection closed before complete response received");
            }

            if let Some(end) = buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = buffer.split_to(end + 4);
                return Ok((parse_head(&head)?, buffer));
            }

            // Prevent unbounded header growth
            if buffer.len() > MAX_HEAD_BYTES {
                bail!("Response headers too large");
            }
        }
    }
}

/// Parses an upstream response head, including its terminating blank line.
pub fn parse_head(bytes: &[u8]) -> Result<UpstreamHead> {
    let line_end = find_crlf(bytes).context("Empty response")?;
    let status_line =
        std::str::from_utf8(&bytes[..line_end]).context("Invalid UTF-8 in status line")?;

    let mut parts = status_line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        bail!("Invalid status line: {}", status_line);
    }
    let code: u16 = parts
        .next()
        .context("Invalid status line")?
        .parse()
        .context("Invalid status code")?;

    let mut headers = Headers::new();
    let mut rest = &bytes[line_end + 2..];
    loop {
        let (n, done) = headers.parse_line(rest)?;
        if done || n == 0 {
            break;
        }
        rest = &rest[n..];
    }

    Ok(UpstreamHead {
        status: StatusCode::new(code),
        headers,
    })
}
