//! HTTP/1.1 protocol engine.
//!
//! - **`headers`**: header collection and line-at-a-time header parsing
//! - **`request`**: request line and request representation
//! - **`parser`**: incremental request parser fed from the transport
//! - **`response`**: status codes, default headers, handler errors
//! - **`writer`**: ordered response writer with chunked framing and trailers
//! - **`connection`**: drives one request/response exchange over a stream
//!
//! # Connection State Machine
//!
//! Each accepted connection carries exactly one exchange:
//!
//! ```text
//!        ┌─────────────┐
//!        │  Accepted   │
//!        └──────┬──────┘
//!               ▼
//!        ┌─────────────┐  malformed / truncated
//!        │   Parsing   │ ─────────────────────┐
//!        └──────┬──────┘                      │
//!               │ Request parsed              │
//!               ▼                             ▼
//!        ┌─────────────┐  handler error  ┌────────────┐
//!        │  Handling   │ ──────────────► │ Responding │
//!        └──────┬──────┘                 └─────┬──────┘
//!               │ Response written             │ Error envelope written
//!               ▼                              │
//!        ┌─────────────┐                       │
//!        │   Closed    │ ◄─────────────────────┘
//!        └─────────────┘
//! ```
//!
//! Connections are accepted and spawned by [`crate::server`]; see
//! [`crate::server::serve`] for the entry point.

pub mod connection;
pub mod headers;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
