//! Core traits for generic WebSocket infrastructure.

use futures::stream::BoxStream;

use super::error::{CloseReason, WsError};

/// A signal delivered by a transport.
///
/// A well-behaved transport yields at most one [`TransportEvent::Open`] first, then
/// any number of messages and errors, and finishes with exactly one
/// [`TransportEvent::Close`]. Transports are expected to close after an error.
#[non_exhaustive]
#[derive(Debug)]
pub enum TransportEvent<M> {
    /// The connection is established
    Open,
    /// An inbound message
    Message(M),
    /// The transport failed; a [`TransportEvent::Close`] is expected to follow
    Error(WsError),
    /// The connection is gone, gracefully or not
    Close(CloseReason),
}

/// The stream of signals produced by one transport.
pub type TransportEvents<M> = BoxStream<'static, TransportEvent<M>>;

/// Opens transports to an endpoint.
///
/// Each call to [`Connector::open`] constructs one new transport. Opening must not
/// block: the returned stream performs the actual connection when it is first polled
/// and reports the outcome as an [`TransportEvent::Open`] or an
/// [`TransportEvent::Error`] followed by a [`TransportEvent::Close`].
///
/// # Example
///
/// ```ignore
/// struct Once;
///
/// impl Connector for Once {
///     type Message = String;
///
///     fn open(&self, _endpoint: &str) -> TransportEvents<String> {
///         Box::pin(futures::stream::iter([
///             TransportEvent::Open,
///             TransportEvent::Message("hello".to_owned()),
///             TransportEvent::Close(CloseReason::abnormal()),
///         ]))
///     }
/// }
/// ```
pub trait Connector: Send + Sync + 'static {
    /// Payload type of inbound messages
    type Message: Send + 'static;

    fn open(&self, endpoint: &str) -> TransportEvents<Self::Message>;
}

/// Consumer of inbound messages.
///
/// Invoked synchronously on the task that drives the transport, once per message and
/// in arrival order. A slow handler slows delivery; nothing is buffered on its behalf.
pub trait MessageHandler<M>: Send + Sync + 'static {
    fn on_message(&self, payload: M);
}

impl<M, F> MessageHandler<M> for F
where
    F: Fn(M) + Send + Sync + 'static,
{
    fn on_message(&self, payload: M) {
        self(payload);
    }
}
