//! Run configuration.
//!
//! Everything the executor needs is carried in a [`RunConfig`] value. Client
//! settings may come from a RON file:
//!
//! ```ron
//! (
//!     timeouts: (connect_secs: 10, idle_millis: 500),
//!     max_response_bytes: 65536,
//! )
//! ```

use std::{io, path::Path};

use riposte_common::config::{ClientSettings, Target};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Invalid configuration {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub target: Target,

    /// Record assertion failures and keep going instead of stopping at the
    /// first one.
    #[serde(default)]
    pub continue_on_error: bool,

    #[serde(default)]
    pub client: ClientSettings,
}

impl RunConfig {
    #[must_use]
    pub fn new(target: Target) -> Self {
        Self {
            target,
            continue_on_error: false,
            client: ClientSettings::default(),
        }
    }

    #[must_use]
    pub const fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: ClientSettings) -> Self {
        self.client = client;
        self
    }
}

/// Reads [`ClientSettings`] from a RON file.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the file cannot be read or parsed.
pub fn load_client_settings(path: &Path) -> Result<ClientSettings, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    ron::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })
}
