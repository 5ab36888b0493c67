//! rawhttp - HTTP/1.1 over raw TCP
//!
//! Incremental request parsing, an ordered response writer with chunked
//! framing and trailers, and a connection-per-task server.

pub mod app;
pub mod config;
pub mod http;
pub mod server;
