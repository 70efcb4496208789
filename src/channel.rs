//! Endpoints of channel-based WebSocket servers.
//!
//! Such a server exposes one subscribe endpoint per channel at `<base>/channel/<name>/`.
//! It compares channel names case-insensitively and treats `_` and `:` as the same
//! separator, so `Room_1` and `room:1` are one channel.
#![expect(
    clippy::module_name_repetitions,
    reason = "Channel types and helpers are named after the channel they address"
)]

use std::fmt;

use url::Url;

use crate::Result;
use crate::error::Error;

/// Name of the channel every subscriber receives.
pub const ALL_CHANNELS: &str = "__all__";

/// A normalized channel name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelName(String);

impl ChannelName {
    /// Normalize `raw`: surrounding whitespace is trimmed, letters are lowercased and
    /// `_` becomes `:`. A blank name selects [`ALL_CHANNELS`].
    #[must_use]
    pub fn new(raw: &str) -> Self {
        let name = raw.trim();
        if name.is_empty() {
            return Self::all();
        }

        Self(name.to_lowercase().replace('_', ":"))
    }

    #[must_use]
    pub fn all() -> Self {
        Self(ALL_CHANNELS.to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the subscribe endpoint of `channel` below `base`.
///
/// `base` is the server URL including any route prefix, e.g. `ws://host:8080/api`.
/// Query and fragment of `base` are dropped.
pub fn channel_endpoint(base: &str, channel: &ChannelName) -> Result<String> {
    if channel.as_str().contains(['/', '?', '#']) {
        return Err(Error::validation(format!(
            "channel name {channel} cannot contain '/', '?' or '#'"
        )));
    }

    let mut url = Url::parse(base)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    let endpoint = url.join(&format!("channel/{channel}/"))?;
    Ok(endpoint.into())
}
