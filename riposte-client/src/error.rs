//! Error types for the client.
//!
//! Both kinds are fatal to the test case they occur in: they are never
//! retried and never counted as assertion failures.

use std::{io, string::FromUtf8Error, time::Duration};

use thiserror::Error;

/// Errors raised while establishing or using a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The host name could not be resolved to any address.
    #[error("Unable to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: io::Error,
    },

    /// Every resolved address refused or failed the connection.
    #[error("Unable to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: io::Error,
    },

    /// Connecting (including the TLS handshake) took too long.
    #[error("Timed out connecting to {target} after {:?}", .elapsed)]
    Timeout { target: String, elapsed: Duration },

    /// The host is not usable as a TLS server name.
    #[error("Invalid TLS server name: {0}")]
    InvalidServerName(String),

    /// TLS handshake failed (certificate validation, protocol mismatch, ...).
    #[error("TLS error: {0}")]
    Tls(String),

    /// There is no open connection.
    #[error("Connection is closed")]
    Closed,

    /// The server kept sending past the configured response limit.
    #[error("Response exceeded {0} bytes")]
    ResponseTooLarge(usize),

    /// I/O error on an established connection (reset, broken pipe, ...).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// The server sent bytes that are not valid UTF-8.
#[derive(Debug, Error)]
#[error("Response of {len} bytes is not valid UTF-8: {source}")]
pub struct DecodeError {
    len: usize,
    #[source]
    source: FromUtf8Error,
}

impl DecodeError {
    /// The raw bytes that failed to decode.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }
}

impl From<FromUtf8Error> for DecodeError {
    fn from(source: FromUtf8Error) -> Self {
        Self {
            len: source.as_bytes().len(),
            source,
        }
    }
}

/// Any error produced by the client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        Self::Connection(ConnectionError::Io(err))
    }
}

/// Specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
