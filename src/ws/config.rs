#![expect(
    clippy::module_name_repetitions,
    reason = "Configuration types intentionally mirror the module name for clarity"
)]

use std::time::Duration;

use backoff::backoff::Constant;

const DEFAULT_RECONNECT_DELAY_DURATION: Duration = Duration::from_millis(1000);

/// Configuration for WebSocket client behavior.
#[non_exhaustive]
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Reconnection strategy configuration
    pub reconnect: ReconnectConfig,
}

/// What happens to the stored message handler when the manager reconnects on its own.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HandlerPolicy {
    /// Reattach the handler supplied to the last `connect` to every new transport.
    #[default]
    Preserve,
    /// Retry without a handler. Messages on the new transport are dropped until
    /// the caller connects again with a handler.
    Drop,
}

/// Configuration for automatic reconnection behavior.
///
/// Reconnection always retries, forever, after the same fixed delay.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Pause between losing a connection and the next attempt
    pub delay: Duration,
    /// Whether the message handler survives a reconnect
    pub handler: HandlerPolicy,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_RECONNECT_DELAY_DURATION,
            handler: HandlerPolicy::default(),
        }
    }
}

impl From<&ReconnectConfig> for Constant {
    fn from(config: &ReconnectConfig) -> Self {
        Constant::new(config.delay)
    }
}
