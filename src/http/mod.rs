//! HTTP protocol implementation.
//!
//! This module turns the raw byte stream of one connection into a sequence
//! of request/response exchanges, with keep-alive support and streamed
//! bodies.
//!
//! # Architecture
//!
//! The HTTP layer is organized into several submodules:
//!
//! - **`tokenizer`**: incremental scanner for the HTTP/1.x grammar; reports
//!   tokens through a callback trait and tolerates input split at any byte
//! - **`url`**: structural decomposition of request targets
//! - **`driver`**: accumulates tokenizer callbacks into per-message state
//!   and emits exchange lifecycle events
//! - **`request`** / **`response`**: the value objects of one exchange
//! - **`writer`**: serializes and writes HTTP responses to the client
//! - **`connection`**: the per-connection manager tying it all together
//!
//! # Exchange lifecycle
//!
//! Every exchange on a connection moves through the same event sequence:
//!
//! ```text
//!        ┌───────────────┐
//!        │ message begin │ ← first byte of a request line
//!        └───────┬───────┘
//!                │ target + header fragments accumulate
//!                ▼
//!        ┌───────────────┐
//!        │ headers done  │ ← (Request, Response) published to the handler
//!        └───────┬───────┘
//!                │ body chunks stream through, never buffered whole
//!                ▼
//!        ┌───────────────┐
//!        │ message done  │ ← response written to the socket
//!        └───────┬───────┘
//!                ├─ keep-alive → message begin (same connection)
//!                └─ close → connection torn down
//! ```
//!
//! Bytes may arrive in pieces of any size; the event sequence a handler
//! observes is the same no matter how the transport slices the stream.

pub mod connection;
pub mod driver;
pub mod request;
pub mod response;
pub mod tokenizer;
pub mod url;
pub mod writer;
