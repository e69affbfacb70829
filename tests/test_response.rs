use portico::http::response::{Response, StatusCode};
use portico::http::writer::serialize_response;

#[test]
fn test_status_code_numbers() {
    assert_eq!(StatusCode::Ok.as_u16(), 200);
    assert_eq!(StatusCode::Created.as_u16(), 201);
    assert_eq!(StatusCode::NoContent.as_u16(), 204);
    assert_eq!(StatusCode::BadRequest.as_u16(), 400);
    assert_eq!(StatusCode::NotFound.as_u16(), 404);
    assert_eq!(StatusCode::MethodNotAllowed.as_u16(), 405);
    assert_eq!(StatusCode::InternalServerError.as_u16(), 500);
    assert_eq!(StatusCode::BadGateway.as_u16(), 502);
    assert_eq!(StatusCode::ServiceUnavailable.as_u16(), 503);
    assert_eq!(StatusCode::GatewayTimeout.as_u16(), 504);
}

#[test]
fn test_status_code_reason_phrases() {
    assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    assert_eq!(StatusCode::GatewayTimeout.reason_phrase(), "Gateway Timeout");
}

#[test]
fn test_reuse_flags_fixed_at_creation() {
    let resp = Response::new(true, false);
    assert!(resp.keep_alive());
    assert!(!resp.is_last());

    let resp = Response::new(false, true);
    assert!(!resp.keep_alive());
    assert!(resp.is_last());
}

#[test]
fn test_content_helpers() {
    let mut resp = Response::new(true, false);
    resp.ok("hello");
    assert_eq!(resp.status, StatusCode::Ok);
    assert_eq!(resp.body, b"hello");

    let mut resp = Response::new(true, false);
    resp.not_found();
    assert_eq!(resp.status, StatusCode::NotFound);

    let mut resp = Response::new(true, false);
    resp.internal_error();
    assert_eq!(resp.status, StatusCode::InternalServerError);
}

#[test]
fn test_header_set_and_get() {
    let mut resp = Response::new(true, false);
    resp.set_header("Content-Type", "text/plain");

    assert_eq!(resp.header("Content-Type"), Some("text/plain"));
    assert_eq!(resp.header("X-Missing"), None);
}

#[test]
fn test_serialize_status_line_and_body() {
    let mut resp = Response::new(true, false);
    resp.ok("hi there");

    let wire = serialize_response(&resp);
    let text = String::from_utf8_lossy(&wire);

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Length: 8\r\n"));
    assert!(text.ends_with("\r\n\r\nhi there"));
}

#[test]
fn test_serialize_connection_header_from_flags() {
    let mut resp = Response::new(true, false);
    resp.ok("x");
    let text = String::from_utf8_lossy(&serialize_response(&resp)).into_owned();
    assert!(text.contains("Connection: keep-alive\r\n"));

    let mut resp = Response::new(false, true);
    resp.ok("x");
    let text = String::from_utf8_lossy(&serialize_response(&resp)).into_owned();
    assert!(text.contains("Connection: close\r\n"));
}

#[test]
fn test_serialize_respects_explicit_headers() {
    let mut resp = Response::new(true, false);
    resp.set_header("content-length", "0");
    resp.set_header("Connection", "upgrade");

    let wire = serialize_response(&resp);
    let text = String::from_utf8_lossy(&wire);

    assert_eq!(text.matches("ontent-").count(), 1);
    assert_eq!(text.matches("onnection: ").count(), 1);
    assert!(text.contains("Connection: upgrade\r\n"));
}
