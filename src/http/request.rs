use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::http::url::Url;

/// HTTP request methods.
///
/// Represents the HTTP method/verb of a request. All standard verbs are
/// recognized, including CONNECT (whose request target uses authority form).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// PATCH - Partial modification of a resource
    PATCH,
    /// CONNECT - Establish a tunnel to the target
    CONNECT,
    /// TRACE - Echo the received request
    TRACE,
}

impl Method {
    /// Parses an HTTP method from raw bytes.
    ///
    /// Method names are case-sensitive per the HTTP grammar, so `get` is
    /// rejected while `GET` is accepted.
    pub fn from_bytes(b: &[u8]) -> Option<Self> {
        match b {
            b"GET" => Some(Method::GET),
            b"POST" => Some(Method::POST),
            b"PUT" => Some(Method::PUT),
            b"DELETE" => Some(Method::DELETE),
            b"HEAD" => Some(Method::HEAD),
            b"OPTIONS" => Some(Method::OPTIONS),
            b"PATCH" => Some(Method::PATCH),
            b"CONNECT" => Some(Method::CONNECT),
            b"TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    /// Parses an HTTP method from a string.
    ///
    /// # Example
    ///
    /// ```
    /// # use portico::http::request::Method;
    /// assert_eq!(Method::from_str("GET"), Some(Method::GET));
    /// assert_eq!(Method::from_str("get"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        Self::from_bytes(s.as_bytes())
    }

    /// Returns the canonical spelling of the method.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::HEAD => "HEAD",
            Method::OPTIONS => "OPTIONS",
            Method::PATCH => "PATCH",
            Method::CONNECT => "CONNECT",
            Method::TRACE => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP protocol version as a major.minor pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

impl Version {
    pub const HTTP_10: Version = Version { major: 1, minor: 0 };
    pub const HTTP_11: Version = Version { major: 1, minor: 1 };
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// A parsed HTTP request from a client.
///
/// Built by the parse-event driver while the request head streams in and
/// published once the header section is complete. From that point on the
/// method, version, URL and header map never change; only the success flag
/// flips when the final body byte has been consumed.
///
/// The body is not stored here. It is delivered chunk by chunk through the
/// connection's event stream; [`BodyCollector`] can accumulate it when a
/// handler wants the whole thing.
#[derive(Debug)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// HTTP protocol version from the request line
    pub version: Version,
    /// Structurally decomposed request target
    pub url: Url,
    /// Header map; names and values are lower-cased, duplicate names keep
    /// the last value seen
    pub headers: HashMap<String, String>,
    /// Address and port of the peer that sent the request
    pub peer: SocketAddr,
    success: AtomicBool,
}

impl Request {
    pub fn new(
        method: Method,
        version: Version,
        url: Url,
        headers: HashMap<String, String>,
        peer: SocketAddr,
    ) -> Self {
        Self {
            method,
            version,
            url,
            headers,
            peer,
            success: AtomicBool::new(false),
        }
    }

    /// Retrieves a header value by name.
    ///
    /// Lookup keys must be lower-case; the parser lower-cases every header
    /// name at accumulation time, so there is exactly one spelling per key.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Retrieves the Content-Length header value and parses it as a usize.
    ///
    /// Returns 0 if the header is missing or not a valid number.
    pub fn content_length(&self) -> usize {
        self.header("content-length")
            .and_then(|v| v.parse().ok())
            .unwrap_or(0)
    }

    /// Whether the full message (head and body) was received intact.
    ///
    /// False while the body is still streaming and forever false for a
    /// request whose connection died mid-message.
    pub fn is_successful(&self) -> bool {
        self.success.load(Ordering::Acquire)
    }

    pub(crate) fn mark_successful(&self) {
        self.success.store(true, Ordering::Release);
    }
}

/// Accumulates streamed body chunks up to a fixed capacity.
///
/// Convenience for handlers that want the whole body in memory rather than
/// processing it chunk by chunk.
#[derive(Debug)]
pub struct BodyCollector {
    capacity: usize,
    data: Vec<u8>,
}

impl BodyCollector {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            data: Vec::new(),
        }
    }

    /// Appends a chunk. Returns false (and drops the chunk) once the
    /// collector is at capacity.
    pub fn push(&mut self, chunk: &[u8]) -> bool {
        if self.data.len() + chunk.len() > self.capacity {
            return false;
        }
        self.data.extend_from_slice(chunk);
        true
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }
}
