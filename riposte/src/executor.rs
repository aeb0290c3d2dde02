//! Drives every test case and applies the pass/fail policy.
//!
//! Each step passes when the collected response contains the expected
//! substring. What happens on a mismatch depends on
//! [`RunConfig::continue_on_error`]:
//!
//! - off (fail-fast): the run stops at the first mismatch and nothing after
//!   it is sent
//! - on: the mismatch is recorded and the run carries on; once every test
//!   case has run, all recorded failures are returned together
//!
//! Connection and decode errors are not assertion failures. They always end
//! the current test case and are never retried.

use std::{fmt, ops::ControlFlow};

use riposte_client::{SessionError, SessionRunner};
use riposte_common::{
    case::{CommandStep, TestCase},
    tracing::{self, Instrument},
};
use thiserror::Error;

use crate::{
    config::RunConfig,
    report::Reporter,
    source::{CommandSource, SourceError},
};

/// A response that did not contain its expected text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    test: usize,
    command: String,
    expected: String,
    actual: String,
}

impl Failure {
    /// `test` is the 1-based position of the test case.
    #[must_use]
    pub fn new(test: usize, step: &CommandStep, actual: &str) -> Self {
        Self {
            test,
            command: step.command().trim().to_string(),
            expected: step.expected().to_string(),
            actual: actual.to_string(),
        }
    }

    #[must_use]
    pub const fn test(&self) -> usize {
        self.test
    }

    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    #[must_use]
    pub fn expected(&self) -> &str {
        &self.expected
    }

    #[must_use]
    pub fn actual(&self) -> &str {
        &self.actual
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Test {}, Command: {} | Expected: {} | Got: {}",
            self.test, self.command, self.expected, self.actual
        )
    }
}

/// A test case abandoned because of a connection or decode error.
#[derive(Debug)]
pub struct AbortedCase {
    pub test: usize,
    pub error: SessionError,
}

/// Everything recorded over a run.
#[derive(Debug, Default)]
pub struct ExecutionResult {
    failures: Vec<Failure>,
    aborted: Vec<AbortedCase>,
    cases_run: usize,
    commands_run: usize,
    continue_on_error: bool,
}

impl ExecutionResult {
    pub(crate) fn new(continue_on_error: bool) -> Self {
        Self {
            continue_on_error,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failures(&self) -> &[Failure] {
        &self.failures
    }

    #[must_use]
    pub fn aborted(&self) -> &[AbortedCase] {
        &self.aborted
    }

    #[must_use]
    pub const fn cases_run(&self) -> usize {
        self.cases_run
    }

    /// Commands that were sent and answered.
    #[must_use]
    pub const fn commands_run(&self) -> usize {
        self.commands_run
    }

    /// Whether the run kept going past failures rather than stopping at the
    /// first one.
    #[must_use]
    pub const fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.aborted.is_empty()
    }

    pub(crate) fn record_failure(&mut self, failure: Failure) {
        self.failures.push(failure);
    }

    pub(crate) fn record_abort(&mut self, test: usize, error: SessionError) {
        self.aborted.push(AbortedCase { test, error });
    }
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} failures encountered, {} test cases aborted",
            self.failures.len(),
            self.aborted.len()
        )
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    /// The command source could not be loaded. Nothing was sent.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Fail-fast mode stopped at this mismatch.
    #[error("{0}")]
    Assertion(Failure),

    /// Fail-fast mode stopped because a test case could not be run.
    #[error("Test {test} aborted: {source}")]
    Session {
        test: usize,
        #[source]
        source: SessionError,
    },

    /// Continue-on-error mode finished with failures.
    #[error("{0}")]
    Aggregate(ExecutionResult),
}

impl RunError {
    /// Whether any test case was stopped by a connection or decode error,
    /// as opposed to only failing assertions.
    #[must_use]
    pub fn is_abort(&self) -> bool {
        match self {
            Self::Session { .. } => true,
            Self::Aggregate(result) => !result.aborted().is_empty(),
            Self::Source(_) | Self::Assertion(_) => false,
        }
    }
}

/// Runs test cases one after another, each on its own connection.
pub struct Executor<R> {
    config: RunConfig,
    reporter: R,
}

impl<R: Reporter> Executor<R> {
    pub const fn new(config: RunConfig, reporter: R) -> Self {
        Self { config, reporter }
    }

    pub const fn config(&self) -> &RunConfig {
        &self.config
    }

    pub const fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Loads the test cases from `source` and runs them.
    ///
    /// # Errors
    ///
    /// See [`Executor::run`]. Source errors are returned before any
    /// connection is made.
    pub async fn run_source<S: CommandSource + ?Sized>(
        &mut self,
        source: &S,
    ) -> Result<ExecutionResult, RunError> {
        let cases = source.test_cases()?;
        self.run(&cases).await
    }

    /// Runs `cases` in order.
    ///
    /// # Errors
    ///
    /// In fail-fast mode, returns the first [`RunError::Assertion`] or
    /// [`RunError::Session`]. With continue-on-error, returns
    /// [`RunError::Aggregate`] once all cases have run if anything failed.
    pub async fn run(&mut self, cases: &[TestCase]) -> Result<ExecutionResult, RunError> {
        let continue_on_error = self.config.continue_on_error;
        let mut runner = SessionRunner::new(self.config.target.clone(), self.config.client.clone());
        let mut result = ExecutionResult::new(continue_on_error);

        tracing::info!(
            server = %self.config.target,
            cases = cases.len(),
            continue_on_error,
            "Starting run"
        );

        for (index, case) in cases.iter().enumerate() {
            let test = index + 1;
            let reporter = &mut self.reporter;
            let mut stopped_at = None;

            let outcome = runner
                .run(case, |exchange| {
                    if exchange.passed() {
                        reporter.passed(test, exchange.step, &exchange.response);
                        return ControlFlow::Continue(());
                    }

                    let failure = Failure::new(test, exchange.step, &exchange.response);
                    reporter.failed(&failure);
                    result.record_failure(failure.clone());

                    if continue_on_error {
                        ControlFlow::Continue(())
                    } else {
                        stopped_at = Some(failure);
                        ControlFlow::Break(())
                    }
                })
                .instrument(tracing::info_span!("test", test))
                .await;

            result.cases_run += 1;

            match outcome {
                Ok(exchanges) => result.commands_run += exchanges.len(),
                Err(error) => {
                    tracing::warn!(test, %error, "Test case aborted");
                    self.reporter.aborted(test, &error);

                    if !continue_on_error {
                        self.reporter.finished(&result);
                        return Err(RunError::Session {
                            test,
                            source: error,
                        });
                    }
                    result.record_abort(test, error);
                }
            }

            if let Some(failure) = stopped_at {
                self.reporter.finished(&result);
                return Err(RunError::Assertion(failure));
            }
        }

        tracing::info!(
            cases = result.cases_run,
            commands = result.commands_run,
            failures = result.failures.len(),
            aborted = result.aborted.len(),
            "Run complete"
        );
        self.reporter.finished(&result);

        if result.is_success() {
            Ok(result)
        } else {
            Err(RunError::Aggregate(result))
        }
    }
}
