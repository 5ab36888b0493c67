use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::parser::{ParseError, Progress, RequestParser};
use crate::http::request::Request;
use crate::http::response::HandlerError;
use crate::http::writer::{ResponseWriter, WriterState};
use crate::server::handler::Handler;

/// Bytes requested from the transport per read.
const READ_CHUNK: usize = 1024;

/// A single request/response exchange over one transport stream.
///
/// The stream is owned for the whole exchange and closed when [`run`]
/// returns, whichever path it takes.
///
/// [`run`]: Connection::run
pub struct Connection<S> {
    stream: S,
    state: ConnectionState,
}

pub enum ConnectionState {
    Accepted,
    Parsing,
    Handling(Request),
    Responding(HandlerError),
    Closed,
}

enum ReadOutcome {
    Request(Request),
    Malformed(ParseError),
    PeerClosed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: ConnectionState::Accepted,
        }
    }

    pub async fn run<H: Handler>(&mut self, handler: &H) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Accepted => {
                    self.state = ConnectionState::Parsing;
                }

                ConnectionState::Parsing => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Request(req) => {
                            tracing::debug!(
                                method = %req.method(),
                                target = %req.target(),
                                body_len = req.body.len(),
                                "request parsed"
                            );
                            ConnectionState::Handling(req)
                        }
                        ReadOutcome::Malformed(err) => {
                            tracing::debug!(error = %err, "rejecting malformed request");
                            ConnectionState::Responding(HandlerError::bad_request(err.to_string()))
                        }
                        ReadOutcome::PeerClosed => ConnectionState::Closed,
                    };
                }

                ConnectionState::Handling(req) => {
                    let mut writer = ResponseWriter::new(&mut self.stream);
                    let result = handler.handle(&mut writer, &req).await;

                    self.state = match result {
                        Ok(()) => {
                            writer.flush().await?;
                            ConnectionState::Closed
                        }
                        // nothing written yet, the error gets the whole response
                        Err(err) if writer.state() == WriterState::ExpectStatusLine => {
                            ConnectionState::Responding(err)
                        }
                        Err(err) => {
                            tracing::warn!(
                                error = %err,
                                target = %req.target(),
                                "handler failed after response started"
                            );
                            ConnectionState::Closed
                        }
                    };
                }

                ConnectionState::Responding(err) => {
                    tracing::warn!(status = err.status.as_u16(), message = %err.message, "sending error response");
                    err.write(&mut self.stream).await?;
                    self.state = ConnectionState::Closed;
                }

                ConnectionState::Closed => {
                    if let Err(e) = self.stream.shutdown().await {
                        tracing::trace!(error = %e, "shutdown after response failed");
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    async fn read_request(&mut self) -> std::io::Result<ReadOutcome> {
        let mut parser = RequestParser::new();
        let mut temp = [0u8; READ_CHUNK];

        loop {
            let n = self.stream.read(&mut temp).await?;

            if n == 0 {
                // Peer went away without sending anything
                if parser.bytes_received() == 0 {
                    return Ok(ReadOutcome::PeerClosed);
                }
                return Ok(match parser.finish() {
                    Ok(req) => ReadOutcome::Request(req),
                    Err(e) => ReadOutcome::Malformed(e),
                });
            }

            match parser.feed(&temp[..n]) {
                Ok(Progress::NeedMore) => {}
                Ok(Progress::Done) => {
                    return Ok(match parser.finish() {
                        Ok(req) => ReadOutcome::Request(req),
                        Err(e) => ReadOutcome::Malformed(e),
                    });
                }
                Err(e) => return Ok(ReadOutcome::Malformed(e)),
            }
        }
    }
}
