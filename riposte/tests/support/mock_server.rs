//! Scripted line-protocol server for tests
//!
//! Sends a greeting on connect, then answers every received line with the
//! first configured reply whose prefix matches, or `500` otherwise.
#![allow(dead_code)] // Test utility module - not all methods used in every test
//!
//! ```rust,no_run
//! let server = MockServer::builder()
//!     .with_greeting("220 hello\r\n")
//!     .with_reply("LOGIN", "230 OK\r\n")
//!     .build()
//!     .await?;
//! ```

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    time::timeout,
};

#[derive(Debug, Clone)]
struct Reply {
    prefix: String,
    bytes: Vec<u8>,
    close: bool,
}

#[derive(Debug, Clone)]
struct MockServerConfig {
    greeting: Vec<u8>,
    replies: Vec<Reply>,
    default_reply: Vec<u8>,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            greeting: b"220 Mock server ready\r\n".to_vec(),
            replies: Vec::new(),
            default_reply: b"500 Unknown command\r\n".to_vec(),
        }
    }
}

pub struct MockServer {
    addr: SocketAddr,
    commands_received: Arc<RwLock<Vec<String>>>,
    connections: Arc<AtomicUsize>,
    shutdown: Arc<AtomicBool>,
}

impl MockServer {
    #[must_use]
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    #[must_use]
    pub const fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Every line received, across all connections, with the line ending
    /// stripped.
    pub async fn commands(&self) -> Vec<String> {
        self.commands_received.read().await.clone()
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }

    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    async fn handle_client(
        mut stream: TcpStream,
        config: Arc<MockServerConfig>,
        commands: Arc<RwLock<Vec<String>>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();

        writer.write_all(&config.greeting).await?;
        writer.flush().await?;

        loop {
            line.clear();

            let Ok(read) = timeout(Duration::from_secs(10), reader.read_until(b'\n', &mut line)).await
            else {
                return Ok(());
            };

            if read? == 0 {
                return Ok(());
            }

            let command = String::from_utf8_lossy(&line).trim_end().to_string();
            commands.write().await.push(command.clone());

            let reply = config
                .replies
                .iter()
                .find(|reply| command.starts_with(reply.prefix.as_str()));

            match reply {
                Some(reply) => {
                    writer.write_all(&reply.bytes).await?;
                    writer.flush().await?;
                    if reply.close {
                        return Ok(());
                    }
                }
                None => {
                    writer.write_all(&config.default_reply).await?;
                    writer.flush().await?;
                }
            }
        }
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[derive(Default)]
pub struct MockServerBuilder {
    config: MockServerConfig,
}

impl MockServerBuilder {
    #[must_use]
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.config.greeting = greeting.into().into_bytes();
        self
    }

    /// Reply with `response` to any line starting with `prefix`.
    #[must_use]
    pub fn with_reply(mut self, prefix: impl Into<String>, response: impl Into<String>) -> Self {
        self.config.replies.push(Reply {
            prefix: prefix.into(),
            bytes: response.into().into_bytes(),
            close: false,
        });
        self
    }

    /// Reply and then close the connection.
    #[must_use]
    pub fn with_closing_reply(
        mut self,
        prefix: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.config.replies.push(Reply {
            prefix: prefix.into(),
            bytes: response.into().into_bytes(),
            close: true,
        });
        self
    }

    /// Bind to a random local port and start accepting connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind.
    pub async fn build(self) -> Result<MockServer, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = Arc::new(self.config);
        let commands = Arc::new(RwLock::new(Vec::new()));
        let connections = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(AtomicBool::new(false));

        let commands_clone = Arc::clone(&commands);
        let connections_clone = Arc::clone(&connections);
        let shutdown_clone = Arc::clone(&shutdown);

        tokio::spawn(async move {
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }

                let accept_result = timeout(Duration::from_millis(100), listener.accept()).await;

                if let Ok(Ok((stream, _peer))) = accept_result {
                    connections_clone.fetch_add(1, Ordering::Relaxed);
                    let config = Arc::clone(&config);
                    let commands = Arc::clone(&commands_clone);

                    tokio::spawn(async move {
                        if let Err(e) = MockServer::handle_client(stream, config, commands).await {
                            eprintln!("Mock server client error: {e}");
                        }
                    });
                }
            }
        });

        Ok(MockServer {
            addr,
            commands_received: commands,
            connections,
            shutdown,
        })
    }
}
