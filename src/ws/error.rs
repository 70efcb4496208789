#![expect(
    clippy::module_name_repetitions,
    reason = "Error types include the module name to indicate their scope"
)]

use std::error::Error as StdError;
use std::fmt;

/// Transport error variants.
///
/// These never reach the caller of [`super::ConnectionManager::connect`]: they are
/// delivered as [`super::TransportEvent::Error`], logged, and absorbed into the
/// reconnect loop.
#[non_exhaustive]
#[derive(Debug)]
pub enum WsError {
    /// Error connecting to or communicating with the WebSocket server
    Connection(Box<dyn StdError + Send + Sync + 'static>),
    /// The transport reported a failure without an underlying error value
    Transport(String),
}

impl WsError {
    pub fn connection<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self::Connection(Box::new(error))
    }

    pub fn transport<S: Into<String>>(detail: S) -> Self {
        Self::Transport(detail.into())
    }
}

impl fmt::Display for WsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connection(e) => write!(f, "WebSocket connection error: {e}"),
            Self::Transport(detail) => write!(f, "WebSocket transport error: {detail}"),
        }
    }
}

impl StdError for WsError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Connection(e) => Some(e.as_ref()),
            Self::Transport(_) => None,
        }
    }
}

/// Why a transport closed.
///
/// Mirrors the close code and reason of a WebSocket close frame. Closures that
/// carry no frame (dropped sockets, failed handshakes) are [`CloseReason::abnormal`].
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseReason {
    /// Close code, when the peer sent one
    pub code: Option<u16>,
    /// Free-form reason text, possibly empty
    pub reason: String,
}

/// Close code reported when a connection closes without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

impl CloseReason {
    #[must_use]
    pub fn new<S: Into<String>>(code: Option<u16>, reason: S) -> Self {
        Self {
            code,
            reason: reason.into(),
        }
    }

    /// The connection dropped without a close frame.
    #[must_use]
    pub fn abnormal() -> Self {
        Self::new(Some(ABNORMAL_CLOSURE), "connection closed abnormally")
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.reason.is_empty()) {
            (Some(code), true) => write!(f, "code {code}"),
            (Some(code), false) => write!(f, "code {code}: {}", self.reason),
            (None, true) => write!(f, "no close code"),
            (None, false) => f.write_str(&self.reason),
        }
    }
}
