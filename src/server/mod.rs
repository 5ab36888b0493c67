//! Listening socket and handler contracts.
//!
//! # Example
//!
//! ```no_run
//! use rawhttp::http::request::Request;
//! use rawhttp::http::response::HandlerError;
//! use rawhttp::server::{self, Buffered, BufferedHandler};
//!
//! struct Hello;
//!
//! impl BufferedHandler for Hello {
//!     async fn handle(&self, body: &mut Vec<u8>, _req: &Request) -> Result<(), HandlerError> {
//!         body.extend_from_slice(b"hello");
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = server::serve(42069, Buffered(Hello)).await?;
//!     tokio::signal::ctrl_c().await?;
//!     server.close().await
//! }
//! ```

pub mod handler;
pub mod listener;

pub use handler::{Buffered, BufferedHandler, Handler};
pub use listener::{bind, serve, Server};
