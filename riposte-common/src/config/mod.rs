//! Configuration shared between the client and the executor.
//!
//! - [`timeouts`]: connect and idle-read timeouts
//! - [`ClientSettings`]: everything a session needs besides the target

pub mod timeouts;

use serde::{Deserialize, Serialize};

pub use timeouts::ClientTimeouts;

/// Settings applied to every connection opened during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    #[serde(default)]
    pub timeouts: ClientTimeouts,

    /// Upper bound on a single collected response.
    ///
    /// Default: 1 MiB
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
}

const fn default_max_response_bytes() -> usize {
    1024 * 1024
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeouts: ClientTimeouts::default(),
            max_response_bytes: default_max_response_bytes(),
        }
    }
}

/// The server under test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub host: String,
    pub port: u16,
    /// Wrap the connection in TLS, validated against the system trust store.
    #[serde(default)]
    pub secure: bool,
}

impl Target {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            secure: false,
        }
    }

    #[must_use]
    pub const fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}
