use tokio::net::TcpListener;
use tracing::info;

use crate::config::Config;
use crate::http::connection::{Connection, Handler};

/// Accept loop: one spawned task per connection, each owning its parser
/// exclusively.
pub async fn run<H, F>(cfg: &Config, make_handler: F) -> anyhow::Result<()>
where
    H: Handler + 'static,
    F: Fn() -> H,
{
    let listener = TcpListener::bind(&cfg.server.listen_addr).await?;
    info!("Listening on {}", cfg.server.listen_addr);

    let idle_timeout = cfg.server.idle_timeout();
    let read_buffer_size = cfg.server.read_buffer_size;

    loop {
        let (socket, peer) = listener.accept().await?;
        info!("Accepted connection from {}", peer);

        let mut handler = make_handler();
        tokio::spawn(async move {
            let mut conn = Connection::new(socket, peer, idle_timeout, read_buffer_size);
            if let Err(e) = conn.run(&mut handler).await {
                tracing::error!("Connection error from {}: {}", peer, e);
            }
        });
    }
}
