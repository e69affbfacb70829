use std::collections::HashMap;
use std::net::SocketAddr;

use portico::http::request::{BodyCollector, Method, Request, Version};
use portico::http::url::Url;

fn peer() -> SocketAddr {
    "10.0.0.7:55001".parse().unwrap()
}

fn make_request(headers: HashMap<String, String>) -> Request {
    Request::new(
        Method::GET,
        Version::HTTP_11,
        Url::parse("/", false),
        headers,
        peer(),
    )
}

#[test]
fn test_method_parsing() {
    assert_eq!(Method::from_str("GET"), Some(Method::GET));
    assert_eq!(Method::from_str("CONNECT"), Some(Method::CONNECT));
    assert_eq!(Method::from_str("get"), None);
    assert_eq!(Method::from_bytes(b"PATCH"), Some(Method::PATCH));
    assert_eq!(Method::from_bytes(b"FOO"), None);
}

#[test]
fn test_method_display_round_trip() {
    for m in [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
        Method::PATCH,
        Method::CONNECT,
        Method::TRACE,
    ] {
        assert_eq!(Method::from_str(m.as_str()), Some(m));
        assert_eq!(m.to_string(), m.as_str());
    }
}

#[test]
fn test_version_display() {
    assert_eq!(Version::HTTP_11.to_string(), "1.1");
    assert_eq!(Version::HTTP_10.to_string(), "1.0");
    assert_eq!(Version { major: 2, minor: 0 }.to_string(), "2.0");
}

#[test]
fn test_request_header_retrieval() {
    let mut headers = HashMap::new();
    headers.insert("host".to_string(), "example.com".to_string());
    headers.insert("content-type".to_string(), "application/json".to_string());

    let req = make_request(headers);

    assert_eq!(req.header("host"), Some("example.com"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(req.header("missing"), None);
}

#[test]
fn test_request_content_length_parsing() {
    let mut headers = HashMap::new();
    headers.insert("content-length".to_string(), "42".to_string());

    let req = make_request(headers);
    assert_eq!(req.content_length(), 42);
}

#[test]
fn test_request_content_length_missing() {
    let req = make_request(HashMap::new());
    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_content_length_invalid() {
    let mut headers = HashMap::new();
    headers.insert("content-length".to_string(), "not-a-number".to_string());

    let req = make_request(headers);
    assert_eq!(req.content_length(), 0);
}

#[test]
fn test_request_starts_unsuccessful() {
    let req = make_request(HashMap::new());
    assert!(!req.is_successful());
    assert_eq!(req.peer, peer());
}

#[test]
fn test_body_collector_accumulates() {
    let mut collector = BodyCollector::new(16);

    assert!(collector.is_empty());
    assert!(collector.push(b"hello "));
    assert!(collector.push(b"world"));
    assert_eq!(collector.data(), b"hello world");

    let taken = collector.take();
    assert_eq!(taken, b"hello world");
    assert!(collector.is_empty());
}

#[test]
fn test_body_collector_respects_capacity() {
    let mut collector = BodyCollector::new(4);

    assert!(collector.push(b"1234"));
    assert!(!collector.push(b"5"));
    // the over-capacity chunk is dropped, earlier data kept
    assert_eq!(collector.data(), b"1234");
}
