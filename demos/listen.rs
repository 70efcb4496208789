//! Listens to one channel of a channel-based WebSocket server and logs every message.
//!
//! The connection is re-established one second after every loss until Ctrl-C.
//!
//! Run with:
//! ```sh
//! RUST_LOG=info cargo run --example listen -- ws://localhost:8080 room_1
//! ```

use std::env;

use ssocket::channel::{ChannelName, channel_endpoint};
use ssocket::ws::config::Config;
use ssocket::ws::{ConnectionManager, Payload, TungsteniteConnector};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut args = env::args().skip(1);
    let base = args
        .next()
        .unwrap_or_else(|| "ws://localhost:8080".to_owned());
    let channel = ChannelName::new(&args.next().unwrap_or_default());
    let endpoint = channel_endpoint(&base, &channel)?;

    let manager = ConnectionManager::new(endpoint, Config::default(), TungsteniteConnector::new())?;

    manager.connect(move |payload: Payload| match payload.as_text() {
        Some(text) => info!(%channel, %text, "message"),
        None => info!(%channel, bytes = payload.as_bytes().len(), "binary message"),
    });

    tokio::signal::ctrl_c().await?;
    manager.stop();

    Ok(())
}
