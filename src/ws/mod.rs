//! Core WebSocket infrastructure.
//!
//! This module provides a reconnecting connection that is generic over the transport
//! it drives.
//!
//! # Architecture
//!
//! - [`ConnectionManager`]: connection state machine with automatic reconnection
//! - [`Connector`]: opens transports and reports their open, message, error and close signals
//! - [`MessageHandler`]: consumer of inbound messages, implemented for plain closures
//! - `TungsteniteConnector`: the WebSocket [`Connector`] (feature `ws`)
//!
//! # Example
//!
//! ```ignore
//! let manager = ConnectionManager::new(endpoint, Config::default(), TungsteniteConnector::new())?;
//! manager.connect(|payload: Payload| tracing::info!(?payload, "received"));
//! ```

pub mod config;
pub mod connection;
pub mod error;
#[cfg(feature = "ws")]
pub mod socket;
pub mod traits;

pub use connection::{ConnectionManager, ConnectionState};
#[expect(
    clippy::module_name_repetitions,
    reason = "WsError includes module name for clarity when used outside this module"
)]
pub use error::WsError;
#[cfg(feature = "ws")]
pub use socket::{Payload, TungsteniteConnector};
pub use traits::*;
