//! TCP server front: the accept loop and a demo handler.

pub mod listener;

use std::sync::Arc;

use bytes::Bytes;

use crate::http::connection::Handler;
use crate::http::request::{BodyCollector, Request};
use crate::http::response::Response;

/// Minimal request handler: echoes the request body back, or greets when
/// there is none.
pub struct HelloHandler {
    body: BodyCollector,
}

impl HelloHandler {
    pub fn new() -> Self {
        Self {
            body: BodyCollector::new(64 * 1024),
        }
    }
}

impl Default for HelloHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for HelloHandler {
    fn on_request(&mut self, _request: &Arc<Request>, _response: &mut Response) {
        self.body.clear();
    }

    fn on_body_chunk(&mut self, _request: &Arc<Request>, chunk: &Bytes) {
        self.body.push(chunk);
    }

    fn on_complete(&mut self, _request: &Arc<Request>, response: &mut Response) {
        if self.body.is_empty() {
            response.ok("Hello from portico\n");
        } else {
            response.set_header("Content-Type", "application/octet-stream");
            response.ok(self.body.take());
        }
    }
}
