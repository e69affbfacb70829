use std::time::Duration;

use portico::http::connection::Connection;
use portico::server::HelloHandler;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

async fn socket_pair(idle_timeout: Duration) -> (TcpStream, Connection) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let client = TcpStream::connect(addr).await.unwrap();
    let (server, peer) = listener.accept().await.unwrap();
    let conn = Connection::new(server, peer, idle_timeout, 4096);
    (client, conn)
}

#[tokio::test]
async fn test_feed_bytes_publishes_latest_request() {
    let (_client, mut conn) = socket_pair(Duration::from_secs(5)).await;

    assert!(conn.latest_request().is_none());
    assert!(conn.latest_response().is_none());

    conn.feed_bytes(b"GET /x HTTP/1.1\r\nHost: h\r\n\r\n").unwrap();
    let events = conn.take_events();
    assert_eq!(events.len(), 2); // exchange published, message complete

    let request = conn.latest_request().unwrap();
    assert_eq!(request.url.path.as_deref(), Some("/x"));
    assert_eq!(request.header("host"), Some("h"));
}

#[tokio::test]
async fn test_single_exchange_with_close() {
    let (mut client, mut conn) = socket_pair(Duration::from_secs(5)).await;

    let server = tokio::spawn(async move {
        let mut handler = HelloHandler::new();
        conn.run(&mut handler).await
    });

    client
        .write_all(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw);

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Connection: close\r\n"));
    assert!(text.ends_with("Hello from portico\n"));

    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_pipelined_requests_answered_in_order() {
    let (mut client, mut conn) = socket_pair(Duration::from_secs(5)).await;

    let server = tokio::spawn(async move {
        let mut handler = HelloHandler::new();
        conn.run(&mut handler).await
    });

    client
        .write_all(
            b"GET /a HTTP/1.1\r\nHost: h\r\n\r\n\
              GET /b HTTP/1.1\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw);

    assert_eq!(text.matches("HTTP/1.1 200 OK\r\n").count(), 2);
    assert!(text.contains("Connection: keep-alive\r\n"));
    assert!(text.contains("Connection: close\r\n"));

    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_request_body_echoed_back() {
    let (mut client, mut conn) = socket_pair(Duration::from_secs(5)).await;

    let server = tokio::spawn(async move {
        let mut handler = HelloHandler::new();
        conn.run(&mut handler).await
    });

    client
        .write_all(
            b"POST /echo HTTP/1.1\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
        )
        .await
        .unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw);

    assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(text.contains("Content-Type: application/octet-stream\r\n"));
    assert!(text.ends_with("\r\n\r\nhello"));

    server.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_malformed_input_closes_without_response() {
    let (mut client, mut conn) = socket_pair(Duration::from_secs(5)).await;

    let server = tokio::spawn(async move {
        let mut handler = HelloHandler::new();
        conn.run(&mut handler).await
    });

    client.write_all(b"GARBAGE\r\n\r\n").await.unwrap();

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    assert!(raw.is_empty());

    assert!(server.await.unwrap().is_err());
}

#[tokio::test]
async fn test_idle_timeout_closes_connection() {
    let (mut client, mut conn) = socket_pair(Duration::from_millis(100)).await;

    let server = tokio::spawn(async move {
        let mut handler = HelloHandler::new();
        conn.run(&mut handler).await
    });

    // client sends nothing at all
    let result = tokio::time::timeout(Duration::from_secs(2), server)
        .await
        .expect("idle timeout did not fire")
        .unwrap();
    assert!(result.is_ok());

    let mut raw = Vec::new();
    client.read_to_end(&mut raw).await.unwrap();
    assert!(raw.is_empty());
}
