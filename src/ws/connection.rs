#![expect(
    clippy::module_name_repetitions,
    reason = "Connection types expose their domain in the name for clarity"
)]

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use backoff::backoff::{Backoff as _, Constant};
use futures::StreamExt as _;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::config::{Config, HandlerPolicy};
use super::error::CloseReason;
use super::traits::{Connector, MessageHandler, TransportEvent, TransportEvents};
use crate::Result;
use crate::error::Error;

/// Connection state tracking.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport is open or being opened
    #[default]
    Idle,
    /// A transport was opened and has not signalled open or close yet
    Connecting,
    /// The transport signalled open
    Connected,
}

impl ConnectionState {
    /// Check if the connection is currently active.
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

type SharedHandler<M> = Arc<dyn MessageHandler<M>>;

/// Manages the lifecycle of a single WebSocket connection and reconnects it when lost.
///
/// - [`ConnectionManager::connect`] opens a transport unless one is already open or opening
/// - Inbound messages go to the handler passed to `connect`
/// - When the transport closes, a new one is opened after [`ReconnectConfig::delay`], forever
/// - [`ConnectionManager::stop`] ends the cycle
///
/// Transport failures are logged and never returned to the caller. Clones share one
/// connection. Dropping the last clone behaves like [`ConnectionManager::stop`].
///
/// # Example
///
/// ```ignore
/// let manager = ConnectionManager::new(
///     "ws://localhost:8080/channel/news/".to_owned(),
///     Config::default(),
///     TungsteniteConnector::default(),
/// )?;
///
/// manager.connect(|payload: Payload| {
///     if let Some(text) = payload.as_text() {
///         println!("{text}");
///     }
/// });
/// ```
///
/// [`ReconnectConfig::delay`]: super::config::ReconnectConfig::delay
pub struct ConnectionManager<C: Connector> {
    inner: Arc<Inner<C>>,
    /// Cancels the shutdown token once the last clone is dropped
    guard: Arc<DropGuard>,
}

struct Inner<C: Connector> {
    endpoint: String,
    config: Config,
    connector: C,
    /// Current state; the guard in `connect` is a check-and-set on this value
    state_tx: watch::Sender<ConnectionState>,
    slots: Mutex<Slots<C::Message>>,
    shutdown: CancellationToken,
}

struct Slots<M> {
    handler: Option<SharedHandler<M>>,
    /// Task driving the current transport
    transport: Option<JoinHandle<()>>,
    /// Pending reconnect timer
    retry: Option<JoinHandle<()>>,
    backoff: Constant,
}

impl<M> Slots<M> {
    fn new(backoff: Constant) -> Self {
        Self {
            handler: None,
            transport: None,
            retry: None,
            backoff,
        }
    }
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            guard: Arc::clone(&self.guard),
        }
    }
}

impl<C: Connector> fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("endpoint", &self.inner.endpoint)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a new connection manager for `endpoint`.
    ///
    /// No connection is made until [`ConnectionManager::connect`] is called. The endpoint
    /// must be a `ws://` or `wss://` URL.
    pub fn new(endpoint: String, config: Config, connector: C) -> Result<Self> {
        let url = Url::parse(&endpoint)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(Error::validation(format!(
                "endpoint {endpoint} must use the ws or wss scheme, not {}",
                url.scheme()
            )));
        }

        let shutdown = CancellationToken::new();
        let guard = shutdown.clone().drop_guard();
        let backoff: Constant = (&config.reconnect).into();

        Ok(Self {
            inner: Arc::new(Inner {
                endpoint,
                config,
                connector,
                state_tx: watch::Sender::new(ConnectionState::Idle),
                slots: Mutex::new(Slots::new(backoff)),
                shutdown,
            }),
            guard: Arc::new(guard),
        })
    }

    /// Open a transport and dispatch every inbound message to `handler`.
    ///
    /// Does nothing if a transport is already connecting or connected, or if the manager
    /// was stopped. Returns immediately; the outcome shows up in [`Self::state`] and the logs.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a Tokio runtime.
    pub fn connect<H: MessageHandler<C::Message>>(&self, handler: H) {
        let handler: SharedHandler<C::Message> = Arc::new(handler);
        self.inner.connect(Some(handler));
    }

    /// Open a transport without a message handler.
    ///
    /// Any previously stored handler is cleared, so inbound messages are dropped until
    /// [`Self::connect`] supplies a new one. This is what an automatic reconnect does under
    /// [`HandlerPolicy::Drop`].
    pub fn connect_detached(&self) {
        self.inner.connect(None);
    }

    /// Tear down the current transport and cancel any pending reconnect.
    ///
    /// Stopping is final: later calls to [`Self::connect`] are ignored.
    pub fn stop(&self) {
        let mut slots = self.inner.slots();
        self.inner.shutdown.cancel();

        if let Some(transport) = slots.transport.take() {
            transport.abort();
        }
        if let Some(retry) = slots.retry.take() {
            retry.abort();
        }
        slots.handler = None;
        drop(slots);

        self.inner.state_tx.send_replace(ConnectionState::Idle);
        info!(endpoint = %self.inner.endpoint, "Connection manager stopped");
    }

    /// Get the current connection state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        *self.inner.state_tx.borrow()
    }

    /// Check if the connection is currently active.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Subscribe to connection state changes.
    #[must_use]
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// The endpoint every transport is opened to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }
}

impl<C: Connector> Inner<C> {
    fn slots(&self) -> MutexGuard<'_, Slots<C::Message>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connect(self: &Arc<Self>, handler: Option<SharedHandler<C::Message>>) {
        let mut slots = self.slots();

        if self.shutdown.is_cancelled() {
            warn!(endpoint = %self.endpoint, "Connection manager is stopped, ignoring connect");
            return;
        }

        let claimed = self.state_tx.send_if_modified(|state| {
            if *state == ConnectionState::Idle {
                *state = ConnectionState::Connecting;
                true
            } else {
                false
            }
        });
        if !claimed {
            trace!(
                endpoint = %self.endpoint,
                state = ?*self.state_tx.borrow(),
                "Connection already in progress, ignoring connect"
            );
            return;
        }

        slots.handler = handler;
        if let Some(retry) = slots.retry.take() {
            retry.abort();
        }

        let events = self.connector.open(&self.endpoint);
        let inner = Arc::clone(self);
        // The previous transport has already closed; its handle is simply dropped.
        slots.transport = Some(tokio::spawn(async move {
            inner.drive(events).await;
        }));
    }

    /// React to the signals of one transport until it closes.
    async fn drive(self: Arc<Self>, mut events: TransportEvents<C::Message>) {
        loop {
            let event = tokio::select! {
                biased;

                () = self.shutdown.cancelled() => return,
                event = events.next() => event,
            };

            // `stop` may have run while the transport was producing this event.
            if self.shutdown.is_cancelled() {
                return;
            }

            match event {
                Some(TransportEvent::Open) => self.on_open(),
                Some(TransportEvent::Message(payload)) => self.on_message(payload),
                Some(TransportEvent::Error(e)) => {
                    error!(endpoint = %self.endpoint, error = %e, "Transport error");
                }
                Some(TransportEvent::Close(reason)) => {
                    self.on_close(&reason);
                    return;
                }
                None => {
                    self.on_close(&CloseReason::abnormal());
                    return;
                }
            }
        }
    }

    fn on_open(&self) {
        let opened = self.state_tx.send_if_modified(|state| {
            if *state == ConnectionState::Connecting && !self.shutdown.is_cancelled() {
                *state = ConnectionState::Connected;
                true
            } else {
                false
            }
        });
        if !opened {
            trace!(endpoint = %self.endpoint, "Ignoring open signal of a stopped transport");
            return;
        }

        self.slots().backoff.reset();
        info!(endpoint = %self.endpoint, "Connected to server");
    }

    fn on_message(&self, payload: C::Message) {
        let handler = self.slots().handler.clone();
        match handler {
            Some(handler) => handler.on_message(payload),
            None => debug!(
                endpoint = %self.endpoint,
                "No message handler attached, dropping message"
            ),
        }
    }

    fn on_close(self: &Arc<Self>, reason: &CloseReason) {
        self.state_tx.send_replace(ConnectionState::Idle);
        error!(endpoint = %self.endpoint, "Connection lost");
        error!(endpoint = %self.endpoint, %reason, "Connection closed");

        self.schedule_reconnect();
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let mut slots = self.slots();
        if self.shutdown.is_cancelled() {
            return;
        }

        // A constant policy never runs out.
        let delay = slots
            .backoff
            .next_backoff()
            .unwrap_or(self.config.reconnect.delay);

        debug!(endpoint = %self.endpoint, ?delay, "Scheduling reconnect");
        let inner = Arc::clone(self);
        slots.retry = Some(tokio::spawn(async move {
            tokio::select! {
                biased;

                () = inner.shutdown.cancelled() => {}
                () = sleep(delay) => inner.reconnect(),
            }
        }));
    }

    fn reconnect(self: &Arc<Self>) {
        let handler = match self.config.reconnect.handler {
            HandlerPolicy::Preserve => self.slots().handler.clone(),
            HandlerPolicy::Drop => None,
        };

        debug!(endpoint = %self.endpoint, "Reconnecting");
        self.connect(handler);
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    struct Never;

    impl Connector for Never {
        type Message = ();

        fn open(&self, _endpoint: &str) -> TransportEvents<()> {
            Box::pin(stream::pending())
        }
    }

    #[test]
    fn rejects_non_websocket_scheme() {
        let err = ConnectionManager::new(
            "http://localhost:8080".to_owned(),
            Config::default(),
            Never,
        )
        .unwrap_err();

        assert_eq!(err.kind(), crate::error::Kind::Validation);
    }

    #[test]
    fn rejects_malformed_endpoint() {
        let err = ConnectionManager::new("localhost".to_owned(), Config::default(), Never)
            .unwrap_err();

        assert_eq!(err.kind(), crate::error::Kind::Internal);
    }

    #[test]
    fn starts_idle_without_connecting() {
        let manager =
            ConnectionManager::new("wss://example.com/ws".to_owned(), Config::default(), Never)
                .unwrap();

        assert_eq!(manager.state(), ConnectionState::Idle);
        assert!(!manager.is_connected());
        assert_eq!(manager.endpoint(), "wss://example.com/ws");
    }
}
