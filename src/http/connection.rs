use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::info;

use crate::http::driver::{Driver, Event};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::tokenizer::{ParseError, Tokenizer};
use crate::http::writer::ResponseWriter;

/// Application boundary for the exchanges on one connection.
///
/// The whole contract between the parsing core and the surrounding server is
/// these three notifications, in this order per exchange: headers arrived,
/// zero or more body chunks, message complete. The response is written to
/// the socket right after `on_complete` returns.
pub trait Handler: Send {
    /// A new exchange: the request head is in, no body bytes yet.
    fn on_request(&mut self, _request: &Arc<Request>, _response: &mut Response) {}

    /// One chunk of the current request's body.
    fn on_body_chunk(&mut self, _request: &Arc<Request>, _chunk: &Bytes) {}

    /// The current request's message is complete.
    fn on_complete(&mut self, request: &Arc<Request>, response: &mut Response);
}

struct Exchange {
    request: Arc<Request>,
    response: Response,
}

/// State for one accepted transport connection.
///
/// Owns the socket, the tokenizer and the parse-event driver; nothing here
/// is shared between connections, and one connection is only ever driven by
/// the task that owns it.
pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
    tokenizer: Tokenizer,
    driver: Driver,
    idle_timeout: Duration,
    read_buffer_size: usize,
    current: Option<Exchange>,
}

impl Connection {
    pub fn new(
        stream: TcpStream,
        peer: SocketAddr,
        idle_timeout: Duration,
        read_buffer_size: usize,
    ) -> Self {
        Self {
            stream,
            peer,
            tokenizer: Tokenizer::new(),
            driver: Driver::new(peer),
            idle_timeout,
            read_buffer_size,
            current: None,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Drives a chunk of arriving bytes through the tokenizer.
    ///
    /// Safe to call with arbitrarily small pieces; all callbacks fire
    /// synchronously before this returns, and the resulting lifecycle events
    /// wait in the queue until [`take_events`](Self::take_events).
    pub fn feed_bytes(&mut self, chunk: &[u8]) -> Result<(), ParseError> {
        self.tokenizer.advance(&mut self.driver, chunk).map(|_| ())
    }

    /// Drains the lifecycle events queued by [`feed_bytes`](Self::feed_bytes).
    pub fn take_events(&mut self) -> Vec<Event> {
        self.driver.take_events()
    }

    /// The most recently published request, if any exchange reached
    /// headers-complete on this connection.
    pub fn latest_request(&self) -> Option<&Arc<Request>> {
        self.driver.latest_request()
    }

    /// The response of the exchange the run loop currently holds, if any.
    /// When events are consumed manually via [`take_events`](Self::take_events)
    /// the response travels inside the event instead.
    pub fn latest_response(&self) -> Option<&Response> {
        self.current.as_ref().map(|ex| &ex.response)
    }

    /// Read/parse/respond loop until the connection is done.
    ///
    /// Returns normally on peer close, idle timeout, or after writing a
    /// response flagged as the last one; a parse error or I/O failure tears
    /// the connection down with an error.
    pub async fn run<H: Handler>(&mut self, handler: &mut H) -> anyhow::Result<()> {
        let mut buf = vec![0u8; self.read_buffer_size];
        loop {
            let n = match timeout(self.idle_timeout, self.stream.read(&mut buf)).await {
                Ok(res) => res.context("socket read failed")?,
                Err(_) => {
                    // liveness safeguard: a peer that never completes a
                    // message does not hold the connection open forever
                    info!(peer = %self.peer, "idle timeout, closing connection");
                    return Ok(());
                }
            };

            if n == 0 {
                // Client closed connection
                return Ok(());
            }

            let parsed = self.feed_bytes(&buf[..n]);

            // Messages that completed before a parse error still get their
            // events delivered; the broken message itself never surfaces.
            if self.dispatch(handler).await? {
                return Ok(());
            }

            if let Err(err) = parsed {
                return Err(anyhow::anyhow!("HTTP parse error: {}", err));
            }
        }
    }

    /// Feeds queued events to the handler; returns true once a final
    /// response has been written and the connection should close.
    async fn dispatch<H: Handler>(&mut self, handler: &mut H) -> anyhow::Result<bool> {
        for event in self.driver.take_events() {
            match event {
                Event::NewRequest { request, response } => {
                    let mut exchange = Exchange { request, response };
                    handler.on_request(&exchange.request, &mut exchange.response);
                    self.current = Some(exchange);
                }

                Event::Data(chunk) => {
                    if let Some(exchange) = self.current.as_ref() {
                        handler.on_body_chunk(&exchange.request, &chunk);
                    }
                }

                Event::End => {
                    if let Some(exchange) = self.current.as_mut() {
                        handler.on_complete(&exchange.request, &mut exchange.response);
                        let mut writer = ResponseWriter::new(&exchange.response);
                        writer.write_to_stream(&mut self.stream).await?;
                        if exchange.response.is_last() {
                            return Ok(true);
                        }
                    }
                }
            }
        }
        Ok(false)
    }
}
