#![allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    reason = "Do not need additional syntax for setting up tests"
)]
#![allow(
    dead_code,
    unreachable_pub,
    reason = "Each test binary uses a different subset of these helpers"
)]

use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::channel::mpsc;
use ssocket::ws::error::CloseReason;
use ssocket::ws::{Connector, TransportEvent, TransportEvents, WsError};
use tracing::subscriber::DefaultGuard;

pub const ENDPOINT: &str = "ws://fake.test/channel/news/";

/// In-memory transport opened by [`FakeConnector`], driven by the test.
#[derive(Clone)]
pub struct FakeTransport {
    pub endpoint: String,
    events: mpsc::UnboundedSender<TransportEvent<String>>,
}

impl FakeTransport {
    fn emit(&self, event: TransportEvent<String>) {
        self.events.unbounded_send(event).unwrap();
    }

    pub fn open(&self) {
        self.emit(TransportEvent::Open);
    }

    pub fn message(&self, payload: &str) {
        self.emit(TransportEvent::Message(payload.to_owned()));
    }

    /// Deliver a message unless the receiving side is gone.
    pub fn try_message(&self, payload: &str) -> bool {
        self.events
            .unbounded_send(TransportEvent::Message(payload.to_owned()))
            .is_ok()
    }

    pub fn error(&self, detail: &str) {
        self.emit(TransportEvent::Error(WsError::transport(detail)));
    }

    pub fn close(&self) {
        self.emit(TransportEvent::Close(CloseReason::new(Some(1001), "going away")));
    }

    /// End the event stream without a close signal.
    pub fn hang_up(&self) {
        self.events.close_channel();
    }
}

/// Every transport a [`FakeConnector`] has opened, in order.
#[derive(Clone, Default)]
pub struct Transports(Arc<Mutex<Vec<FakeTransport>>>);

impl Transports {
    pub fn count(&self) -> usize {
        self.0.lock().unwrap().len()
    }

    pub fn get(&self, index: usize) -> FakeTransport {
        self.0.lock().unwrap()[index].clone()
    }

    pub fn last(&self) -> FakeTransport {
        self.0.lock().unwrap().last().cloned().unwrap()
    }
}

pub struct FakeConnector {
    transports: Transports,
}

impl FakeConnector {
    pub fn new() -> (Self, Transports) {
        let transports = Transports::default();
        (
            Self {
                transports: transports.clone(),
            },
            transports,
        )
    }
}

impl Connector for FakeConnector {
    type Message = String;

    fn open(&self, endpoint: &str) -> TransportEvents<String> {
        let (events, rx) = mpsc::unbounded();
        self.transports.0.lock().unwrap().push(FakeTransport {
            endpoint: endpoint.to_owned(),
            events,
        });
        Box::pin(rx)
    }
}

/// Collects every message passed to the handler it creates.
#[derive(Clone, Default)]
pub struct Received(Arc<Mutex<Vec<String>>>);

impl Received {
    pub fn handler(&self) -> impl Fn(String) + Send + Sync + 'static {
        let received = self.clone();
        move |payload: String| received.0.lock().unwrap().push(payload)
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Captures formatted log output of the current thread.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Install a capturing subscriber for the current thread until the guard drops.
    ///
    /// Only reliable on the current-thread runtime, where spawned tasks run on the test thread.
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_max_level(tracing::Level::TRACE)
            .finish();

        (capture, tracing::subscriber::set_default(subscriber))
    }

    pub fn lines(&self) -> Vec<String> {
        let bytes = self.0.lock().unwrap();
        String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_owned)
            .collect()
    }

    pub fn at_level(&self, level: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.trim_start().starts_with(level))
            .collect()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Let spawned tasks process everything queued so far.
///
/// With a paused clock this advances time by a single millisecond, far below any
/// reconnect delay used in the tests.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}
