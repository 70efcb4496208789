//! WebSocket transport backed by `tokio-tungstenite`.

use async_stream::stream;
use bytes::Bytes;
use futures::StreamExt as _;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tracing::trace;

use super::error::{CloseReason, WsError};
use super::traits::{Connector, TransportEvent, TransportEvents};

/// An inbound WebSocket data message.
///
/// Control frames (ping, pong) are answered by the socket and never surfaced.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Binary(_) => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(data) => data,
        }
    }
}

/// Opens plain (`ws://`) or TLS (`wss://`) WebSocket connections.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Connector for TungsteniteConnector {
    type Message = Payload;

    fn open(&self, endpoint: &str) -> TransportEvents<Payload> {
        let endpoint = endpoint.to_owned();

        Box::pin(stream! {
            let mut socket = match connect_async(endpoint.as_str()).await {
                Ok((socket, _)) => socket,
                Err(e) => {
                    yield TransportEvent::Error(WsError::connection(e));
                    yield TransportEvent::Close(CloseReason::abnormal());
                    return;
                }
            };

            yield TransportEvent::Open;

            while let Some(frame) = socket.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        yield TransportEvent::Message(Payload::Text(text.as_str().to_owned()));
                    }
                    Ok(Message::Binary(data)) => {
                        yield TransportEvent::Message(Payload::Binary(data));
                    }
                    Ok(Message::Close(frame)) => {
                        let reason = frame.map_or_else(|| CloseReason::new(None, ""), CloseReason::from);
                        yield TransportEvent::Close(reason);
                        return;
                    }
                    Ok(other) => {
                        trace!(?other, "Ignoring WebSocket control frame");
                    }
                    Err(e) => {
                        yield TransportEvent::Error(WsError::connection(e));
                        yield TransportEvent::Close(CloseReason::abnormal());
                        return;
                    }
                }
            }

            yield TransportEvent::Close(CloseReason::abnormal());
        })
    }
}

impl From<CloseFrame> for CloseReason {
    fn from(frame: CloseFrame) -> Self {
        CloseReason::new(Some(u16::from(frame.code)), frame.reason.as_str())
    }
}

#[cfg(test)]
mod tests {
    use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;

    use super::*;

    #[test]
    fn close_frame_keeps_code_and_reason() {
        let frame = CloseFrame {
            code: CloseCode::Away,
            reason: "server restart".into(),
        };

        let reason = CloseReason::from(frame);
        assert_eq!(reason.code, Some(1001));
        assert_eq!(reason.reason, "server restart");
    }

    #[test]
    fn payload_accessors() {
        let text = Payload::Text("hello".to_owned());
        let binary = Payload::Binary(Bytes::from_static(b"\x01\x02"));

        assert_eq!(text.as_text(), Some("hello"));
        assert_eq!(text.as_bytes(), b"hello");
        assert_eq!(binary.as_text(), None);
        assert_eq!(binary.as_bytes(), &[1, 2]);
    }
}
