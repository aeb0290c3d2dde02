//! Runs one test case on a fresh connection.

use std::ops::ControlFlow;

use riposte_common::{
    case::{CommandStep, TestCase},
    config::{ClientSettings, Target},
    internal, tracing,
};
use thiserror::Error;

use crate::{
    collector::ResponseCollector,
    error::{ClientError, ConnectionError},
    transport::Transport,
};

/// A command that was sent, paired with everything collected in reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange<'a> {
    /// Zero-based position of the step within its test case.
    pub index: usize,
    pub step: &'a CommandStep,
    pub response: String,
}

impl Exchange<'_> {
    /// Whether the response contains the step's expected substring.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.step.matches(&self.response)
    }
}

/// Why a session stopped before all of its steps were exchanged.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The connection could not be established; no command was sent.
    #[error("Failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: ConnectionError,
    },

    /// Reading the server's greeting failed.
    #[error("Failed to read greeting: {0}")]
    Greeting(#[source] ClientError),

    /// Sending a command or collecting its response failed.
    #[error("Command {} ({command}) failed: {source}", .index + 1)]
    Exchange {
        index: usize,
        command: String,
        #[source]
        source: ClientError,
    },
}

impl SessionError {
    /// Whether the failure happened before the connection was established.
    #[must_use]
    pub const fn is_connect(&self) -> bool {
        matches!(self, Self::Connect { .. })
    }

    /// Whether the failure was caused by undecodable response bytes.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(
            self,
            Self::Greeting(ClientError::Decode(_))
                | Self::Exchange {
                    source: ClientError::Decode(_),
                    ..
                }
        )
    }
}

/// Drives a single [`TestCase`] against the target.
///
/// Every call to [`SessionRunner::run`] opens its own connection and closes it
/// again before returning, whatever the outcome. Connections are never reused
/// between test cases.
#[derive(Debug)]
pub struct SessionRunner {
    target: Target,
    settings: ClientSettings,
    collector: ResponseCollector,
    transport: Transport,
}

impl SessionRunner {
    #[must_use]
    pub fn new(target: Target, settings: ClientSettings) -> Self {
        Self {
            collector: ResponseCollector::from(&settings),
            target,
            settings,
            transport: Transport::new(),
        }
    }

    /// Runs sessions over `transport`, e.g. one with a custom TLS config.
    #[must_use]
    pub fn with_transport(mut self, transport: Transport) -> Self {
        self.transport = transport;
        self
    }

    #[must_use]
    pub const fn target(&self) -> &Target {
        &self.target
    }

    /// Runs every step of `case` in order.
    ///
    /// After connecting, one response is collected and discarded: this is the
    /// server's unsolicited greeting. Each step is then sent and its response
    /// collected. `observe` sees each exchange as soon as it completes and
    /// may return [`ControlFlow::Break`] to stop before the next command is
    /// sent.
    ///
    /// Returns the completed exchanges in step order.
    ///
    /// # Errors
    ///
    /// Returns a [`SessionError`] on a connection or decode failure. The
    /// session is abandoned at that point.
    pub async fn run<'a, F>(
        &mut self,
        case: &'a TestCase,
        mut observe: F,
    ) -> Result<Vec<Exchange<'a>>, SessionError>
    where
        F: FnMut(&Exchange<'a>) -> ControlFlow<()>,
    {
        self.transport.disconnect().await;

        let result = self.exchange_all(case, &mut observe).await;

        self.transport.disconnect().await;

        result
    }

    async fn exchange_all<'a, F>(
        &mut self,
        case: &'a TestCase,
        observe: &mut F,
    ) -> Result<Vec<Exchange<'a>>, SessionError>
    where
        F: FnMut(&Exchange<'a>) -> ControlFlow<()>,
    {
        self.transport
            .connect(&self.target, self.settings.timeouts.connect_timeout())
            .await
            .map_err(|source| SessionError::Connect {
                target: self.target.to_string(),
                source,
            })?;

        let greeting = self
            .collector
            .collect(&mut self.transport)
            .await
            .map_err(SessionError::Greeting)?;
        tracing::debug!(greeting = greeting.trim_end(), "Skipped server greeting");

        let mut exchanges = Vec::with_capacity(case.len());

        for (index, step) in case.steps().iter().enumerate() {
            let response = self.exchange(step).await.map_err(|source| {
                SessionError::Exchange {
                    index,
                    command: step.command().trim().to_string(),
                    source,
                }
            })?;

            let exchange = Exchange {
                index,
                step,
                response,
            };
            let flow = observe(&exchange);
            exchanges.push(exchange);

            if flow.is_break() {
                internal!(
                    level = DEBUG,
                    "Stopping after command {} of {}",
                    index + 1,
                    case.len()
                );
                break;
            }
        }

        Ok(exchanges)
    }

    async fn exchange(&mut self, step: &CommandStep) -> Result<String, ClientError> {
        self.transport.send(&step.wire_bytes()).await?;
        self.collector.collect(&mut self.transport).await
    }
}
