//! Parse-event driver.
//!
//! Registered as the callback target of the tokenizer, one instance per
//! connection. Accumulates the pieces the tokenizer reports (target bytes,
//! header name/value fragments) into per-message state and emits exchange
//! lifecycle [`Event`]s at the message boundaries.

use std::collections::HashMap;
use std::mem;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;

use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::http::tokenizer::{Callbacks, Head};
use crate::http::url::Url;

/// Lifecycle notification handed to the application boundary.
#[derive(Debug)]
pub enum Event {
    /// A request's header section is complete and the exchange now exists.
    /// Always fires before any of that request's body bytes, so handlers can
    /// inspect headers before deciding what to do with the body.
    NewRequest {
        request: Arc<Request>,
        response: Response,
    },
    /// One chunk of the current request's body, in arrival order. The driver
    /// never buffers the body whole; storage policy belongs to the handler.
    Data(Bytes),
    /// The current request's message is complete.
    End,
}

/// Mutable parse state for one connection.
pub struct Driver {
    peer: SocketAddr,
    target: Vec<u8>,
    field: String,
    value: String,
    headers: HashMap<String, String>,
    current: Option<Arc<Request>>,
    events: Vec<Event>,
}

impl Driver {
    pub fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            target: Vec::new(),
            field: String::new(),
            value: String::new(),
            headers: HashMap::new(),
            current: None,
            events: Vec::new(),
        }
    }

    /// Drains the events queued by tokenizer callbacks since the last call.
    pub fn take_events(&mut self) -> Vec<Event> {
        mem::take(&mut self.events)
    }

    /// The most recently published request on this connection, if any.
    pub fn latest_request(&self) -> Option<&Arc<Request>> {
        self.current.as_ref()
    }

    /// Inserts the pending name/value pair into the header map.
    ///
    /// Names and values are canonicalized to lower case here, so every
    /// downstream comparison is a plain equality check. Duplicate names keep
    /// the value seen last.
    fn commit_pending_header(&mut self) {
        self.headers
            .insert(self.field.to_ascii_lowercase(), self.value.to_ascii_lowercase());
        self.field.clear();
        self.value.clear();
    }
}

impl Callbacks for Driver {
    fn on_message_begin(&mut self) -> bool {
        self.target.clear();
        self.field.clear();
        self.value.clear();
        self.headers.clear();
        true
    }

    fn on_url(&mut self, raw: &[u8]) -> bool {
        // the target may arrive across several reads
        self.target.extend_from_slice(raw);
        true
    }

    fn on_header_field(&mut self, raw: &[u8]) -> bool {
        // A fresh field-name byte is the only signal that the previous
        // name/value pair is finished; commit it then. A name split across
        // reads shows up as consecutive field callbacks and must append.
        if !self.field.is_empty() && !self.value.is_empty() {
            self.commit_pending_header();
        }
        self.field.push_str(&String::from_utf8_lossy(raw));
        true
    }

    fn on_header_value(&mut self, raw: &[u8]) -> bool {
        self.value.push_str(&String::from_utf8_lossy(raw));
        true
    }

    fn on_headers_complete(&mut self, head: Head) -> bool {
        if !self.field.is_empty() {
            self.commit_pending_header();
        }

        let target = String::from_utf8_lossy(&self.target).into_owned();
        let url = Url::parse(&target, head.method == Method::CONNECT);
        let request = Arc::new(Request::new(
            head.method,
            head.version,
            url,
            mem::take(&mut self.headers),
            self.peer,
        ));

        // Decided once, immutable afterwards: anything below HTTP/1.1 and
        // any explicit close forfeits connection reuse.
        let close = head.version.major < 1
            || head.version.minor < 1
            || request.header("connection") == Some("close");
        let response = Response::new(!close, close);

        self.current = Some(request.clone());
        self.events.push(Event::NewRequest { request, response });
        true
    }

    fn on_body(&mut self, raw: &[u8]) -> bool {
        self.events.push(Event::Data(Bytes::copy_from_slice(raw)));
        true
    }

    fn on_message_complete(&mut self) -> bool {
        if let Some(request) = &self.current {
            request.mark_successful();
        }
        self.events.push(Event::End);
        true
    }
}
