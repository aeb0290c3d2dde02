//! Protocol-agnostic response collection.
//!
//! The collector knows nothing about how the server frames its replies. It
//! keeps reading until the server either closes the stream or stays silent
//! for the idle timeout, and treats everything received as one response.
//!
//! This is a heuristic: a server that pauses for longer than the idle timeout
//! mid-reply is under-read (the remainder shows up in the next response), and
//! two replies sent back-to-back within the timeout are merged.

use std::time::Duration;

use riposte_common::{config::ClientSettings, incoming};

use crate::{
    error::{ConnectionError, DecodeError, Result},
    transport::Transport,
};

/// Size of each individual read.
const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseCollector {
    idle_timeout: Duration,
    max_response_bytes: usize,
}

impl Default for ResponseCollector {
    fn default() -> Self {
        Self::from(&ClientSettings::default())
    }
}

impl From<&ClientSettings> for ResponseCollector {
    fn from(settings: &ClientSettings) -> Self {
        Self {
            idle_timeout: settings.timeouts.idle_timeout(),
            max_response_bytes: settings.max_response_bytes,
        }
    }
}

impl ResponseCollector {
    #[must_use]
    pub const fn new(idle_timeout: Duration, max_response_bytes: usize) -> Self {
        Self {
            idle_timeout,
            max_response_bytes,
        }
    }

    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Drains everything the server sends until it closes the stream or goes
    /// quiet for the idle timeout, and decodes it as UTF-8.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`](crate::error::ConnectionError) if a read
    /// fails or the response exceeds the configured limit, and a
    /// [`DecodeError`] if the bytes are not valid UTF-8.
    pub async fn collect(&self, transport: &mut Transport) -> Result<String> {
        let mut response = Vec::new();
        let mut chunk = vec![0u8; CHUNK_SIZE];

        loop {
            let Ok(read) = tokio::time::timeout(self.idle_timeout, transport.read(&mut chunk)).await
            else {
                break;
            };

            let n = read?;
            if n == 0 {
                break;
            }

            if response.len() + n > self.max_response_bytes {
                return Err(ConnectionError::ResponseTooLarge(self.max_response_bytes).into());
            }
            response.extend_from_slice(&chunk[..n]);
        }

        let response = String::from_utf8(response).map_err(DecodeError::from)?;
        incoming!("{response:?}");

        Ok(response)
    }
}
