//! A single plain or TLS-wrapped stream to the server under test.

use std::{io, sync::Arc, time::Duration};

use riposte_common::{config::Target, internal, outgoing, tracing};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
};
use tokio_rustls::{
    TlsConnector,
    client::TlsStream,
    rustls::{ClientConfig, RootCertStore, pki_types::ServerName},
};

use crate::error::ConnectionError;

enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Connection {
    async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        match self {
            Self::Plain(stream) => {
                stream.write_all(data).await?;
                stream.flush().await
            }
            Self::Tls(stream) => {
                stream.write_all(data).await?;
                stream.flush().await
            }
        }
    }

    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf).await,
            // Peers that drop the TCP stream without a close_notify are
            // treated as having closed normally.
            Self::Tls(stream) => match stream.read(buf).await {
                Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => {
                    tracing::debug!(%err, "TLS stream closed without close_notify");
                    Ok(0)
                }
                result => result,
            },
        }
    }

    async fn shutdown(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.shutdown().await,
            Self::Tls(stream) => stream.shutdown().await,
        }
    }
}

/// Owns at most one connection at a time.
///
/// `Disconnected -> connect() -> Connected -> disconnect() -> Disconnected`
#[derive(Default)]
pub struct Transport {
    connection: Option<Connection>,
    connector: Option<TlsConnector>,
}

impl Transport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `config` for TLS connections instead of a config built from the
    /// system trust store.
    #[must_use]
    pub fn with_tls_config(config: Arc<ClientConfig>) -> Self {
        Self {
            connection: None,
            connector: Some(TlsConnector::from(config)),
        }
    }

    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens a connection to `target`, replacing any connection still open.
    ///
    /// When `target.secure` is set a TLS handshake is performed against the
    /// system trust store, using the target host as the server name.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if resolution, the TCP connect or the
    /// handshake fails, or if the whole attempt exceeds `timeout`.
    pub async fn connect(
        &mut self,
        target: &Target,
        timeout: Duration,
    ) -> Result<(), ConnectionError> {
        self.disconnect().await;

        internal!(level = DEBUG, "Connecting to {target} (tls: {})", target.secure);

        let connection = tokio::time::timeout(timeout, self.open(target))
            .await
            .map_err(|_| ConnectionError::Timeout {
                target: target.to_string(),
                elapsed: timeout,
            })??;

        self.connection = Some(connection);
        internal!(level = DEBUG, "Connected to {target}");

        Ok(())
    }

    async fn open(&mut self, target: &Target) -> Result<Connection, ConnectionError> {
        let stream = Self::dial(target).await?;

        if !target.secure {
            return Ok(Connection::Plain(stream));
        }

        let server_name = ServerName::try_from(target.host.clone())
            .map_err(|e| ConnectionError::InvalidServerName(format!("{}: {e}", target.host)))?;

        let stream = self
            .connector()?
            .connect(server_name, stream)
            .await
            .map_err(|e| ConnectionError::Tls(e.to_string()))?;

        Ok(Connection::Tls(Box::new(stream)))
    }

    async fn dial(target: &Target) -> Result<TcpStream, ConnectionError> {
        let addrs = tokio::net::lookup_host((target.host.as_str(), target.port))
            .await
            .map_err(|source| ConnectionError::Resolve {
                host: target.host.clone(),
                source,
            })?;

        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect(addr).await {
                Ok(stream) => return Ok(stream),
                Err(err) => {
                    tracing::debug!(%addr, %err, "Connection attempt failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.map_or_else(
            || ConnectionError::Resolve {
                host: target.host.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            },
            |source| ConnectionError::Connect {
                target: target.to_string(),
                source,
            },
        ))
    }

    fn connector(&mut self) -> Result<TlsConnector, ConnectionError> {
        if let Some(connector) = &self.connector {
            return Ok(connector.clone());
        }

        let mut root_store = RootCertStore::empty();

        let certs = rustls_native_certs::load_native_certs();
        for cert in certs.certs {
            root_store
                .add(cert)
                .map_err(|e| ConnectionError::Tls(format!("Failed to add certificate: {e}")))?;
        }
        if !certs.errors.is_empty() {
            tracing::warn!(?certs.errors, "Some certificates could not be loaded");
        }

        let config = ClientConfig::builder()
            .with_root_certificates(root_store)
            .with_no_client_auth();

        let connector = TlsConnector::from(Arc::new(config));
        self.connector = Some(connector.clone());

        Ok(connector)
    }

    /// Closes the connection if one is open. Calling this while disconnected
    /// does nothing.
    pub async fn disconnect(&mut self) {
        if let Some(mut connection) = self.connection.take() {
            if let Err(err) = connection.shutdown().await {
                tracing::debug!(%err, "Error while shutting down connection");
            }
            internal!(level = DEBUG, "Disconnected");
        }
    }

    /// Writes all of `data` to the server.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Closed`] when not connected and
    /// [`ConnectionError::Io`] if the peer has reset the connection.
    pub async fn send(&mut self, data: &[u8]) -> Result<(), ConnectionError> {
        let connection = self.connection.as_mut().ok_or(ConnectionError::Closed)?;

        outgoing!("{:?}", String::from_utf8_lossy(data));
        connection.send(data).await?;

        Ok(())
    }

    /// Reads whatever is available into `buf`. `Ok(0)` means the peer has
    /// closed its side of the stream, with or without a TLS close_notify.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::Closed`] when not connected and
    /// [`ConnectionError::Io`] on a read failure.
    pub async fn read(&mut self, buf: &mut [u8]) -> Result<usize, ConnectionError> {
        let connection = self.connection.as_mut().ok_or(ConnectionError::Closed)?;
        Ok(connection.read(buf).await?)
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field(
                "connection",
                &match self.connection {
                    None => "disconnected",
                    Some(Connection::Plain(_)) => "plain",
                    Some(Connection::Tls(_)) => "tls",
                },
            )
            .finish_non_exhaustive()
    }
}
