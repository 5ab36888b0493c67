//! Application handler contracts.
//!
//! A [`Handler`] drives the [`ResponseWriter`] itself. A [`BufferedHandler`]
//! only produces a body; wrapping it in [`Buffered`] adds the `200 OK`
//! envelope around whatever it wrote.

use std::future::Future;

use tokio::io::AsyncWrite;

use crate::http::request::Request;
use crate::http::response::{default_headers, HandlerError, StatusCode};
use crate::http::writer::ResponseWriter;

/// Handles one parsed request by writing a response.
///
/// Returning an error before anything has been written makes the connection
/// answer with that error's status and message instead.
pub trait Handler: Send + Sync + 'static {
    fn handle<W>(
        &self,
        w: &mut ResponseWriter<W>,
        req: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send
    where
        W: AsyncWrite + Unpin + Send;
}

/// Handles one parsed request by appending a body to `body`.
pub trait BufferedHandler: Send + Sync + 'static {
    fn handle(
        &self,
        body: &mut Vec<u8>,
        req: &Request,
    ) -> impl Future<Output = Result<(), HandlerError>> + Send;
}

/// Adapts a [`BufferedHandler`] into a [`Handler`].
#[derive(Debug, Clone)]
pub struct Buffered<H>(pub H);

impl<H: BufferedHandler> Handler for Buffered<H> {
    async fn handle<W>(&self, w: &mut ResponseWriter<W>, req: &Request) -> Result<(), HandlerError>
    where
        W: AsyncWrite + Unpin + Send,
    {
        let mut body = Vec::new();
        self.0.handle(&mut body, req).await?;

        w.write_status_line(StatusCode::OK).await?;
        w.write_headers(&default_headers(body.len())).await?;
        w.write_body(&body).await?;
        Ok(())
    }
}
