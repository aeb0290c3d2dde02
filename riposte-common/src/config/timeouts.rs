//! Timeouts applied by the client.
//!
//! Responses are framed by silence: a reply is considered complete once the
//! server has sent nothing for [`ClientTimeouts::idle_timeout`]. This is a
//! heuristic. A slow server may be under-read and two replies sent
//! back-to-back may be merged into one.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTimeouts {
    /// Timeout for establishing the TCP connection and the TLS handshake.
    ///
    /// Default: 30 seconds
    #[serde(default = "defaults::connect_secs")]
    pub connect_secs: u64,

    /// How long the server may stay silent before a response is considered
    /// complete.
    ///
    /// Default: 2000 milliseconds
    #[serde(default = "defaults::idle_millis")]
    pub idle_millis: u64,
}

impl ClientTimeouts {
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_millis)
    }
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: defaults::connect_secs(),
            idle_millis: defaults::idle_millis(),
        }
    }
}

mod defaults {
    pub const fn connect_secs() -> u64 {
        30
    }

    pub const fn idle_millis() -> u64 {
        2000
    }
}
