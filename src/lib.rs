//! Portico - a small HTTP/1.x front door.
//!
//! Core library for incremental HTTP parsing and connection lifecycle.

pub mod config;
pub mod http;
pub mod server;
