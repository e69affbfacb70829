use std::collections::HashMap;

/// HTTP status codes supported by the server.
///
/// Common HTTP status codes used in responses:
/// - `Ok` (200): Request successful
/// - `Created` (201): Resource created successfully
/// - `NoContent` (204): Successful request with no content
/// - `BadRequest` (400): Malformed request
/// - `NotFound` (404): Resource not found
/// - `MethodNotAllowed` (405): HTTP method not supported
/// - `InternalServerError` (500): Server error
/// - `BadGateway` (502), `ServiceUnavailable` (503), `GatewayTimeout` (504)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 201 Created
    Created,
    /// 204 No Content
    NoContent,
    /// 400 Bad Request
    BadRequest,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 500 Internal Server Error
    InternalServerError,
    /// 502 Bad Gateway
    BadGateway,
    /// 503 Service Unavailable
    ServiceUnavailable,
    /// 504 Gateway Timeout
    GatewayTimeout,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use portico::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::NoContent => 204,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::InternalServerError => 500,
            StatusCode::BadGateway => 502,
            StatusCode::ServiceUnavailable => 503,
            StatusCode::GatewayTimeout => 504,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use portico::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::NoContent => "No Content",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::BadGateway => "Bad Gateway",
            StatusCode::ServiceUnavailable => "Service Unavailable",
            StatusCode::GatewayTimeout => "Gateway Timeout",
        }
    }
}

/// The response half of an exchange, paired 1:1 with its request.
///
/// Created when the request's header section completes. The connection-reuse
/// flags are decided once at that moment and never change afterwards; status,
/// headers and body stay open for the handler to fill in until the response
/// is written out.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Response body as bytes
    pub body: Vec<u8>,
    keep_alive: bool,
    last: bool,
}

impl Response {
    /// Creates a response with the given connection-reuse decision.
    ///
    /// `keep_alive` means the connection may carry further exchanges after
    /// this response; `last` means this response is the final one and the
    /// connection closes once it is flushed.
    pub fn new(keep_alive: bool, last: bool) -> Self {
        Self {
            status: StatusCode::Ok,
            headers: HashMap::new(),
            body: Vec::new(),
            keep_alive,
            last,
        }
    }

    /// Whether the connection may be reused after this response.
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }

    /// Whether this is the final response on its connection.
    pub fn is_last(&self) -> bool {
        self.last
    }

    /// Adds or replaces a header.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Retrieves a header value by name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }

    /// Sets the response status.
    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    /// Sets the response body.
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.body = body.into();
        self
    }

    /// Fills in a 200 OK with the given body.
    pub fn ok(&mut self, body: impl Into<Vec<u8>>) -> &mut Self {
        self.set_status(StatusCode::Ok).set_body(body)
    }

    /// Fills in a 404 Not Found.
    pub fn not_found(&mut self) -> &mut Self {
        self.set_status(StatusCode::NotFound)
            .set_body(b"404 Not Found".to_vec())
    }

    /// Fills in a 500 Internal Server Error.
    pub fn internal_error(&mut self) -> &mut Self {
        self.set_status(StatusCode::InternalServerError)
            .set_body(b"500 Internal Server Error".to_vec())
    }
}
