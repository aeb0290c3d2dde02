//! Human-readable output of a run.

use std::io::Write;

use riposte_client::SessionError;
use riposte_common::case::CommandStep;

use crate::executor::{ExecutionResult, Failure};

/// Receives the outcome of every command as the run progresses.
pub trait Reporter {
    /// A response contained its expected text. `test` is 1-based.
    fn passed(&mut self, test: usize, step: &CommandStep, actual: &str);

    fn failed(&mut self, failure: &Failure);

    /// A test case was abandoned because of a connection or decode error.
    fn aborted(&mut self, test: usize, error: &SessionError);

    fn finished(&mut self, result: &ExecutionResult);
}

/// Writes a plain text trace to any [`Write`] sink, stdout by default.
#[derive(Debug)]
pub struct ConsoleReporter<W: Write> {
    out: W,
}

impl Default for ConsoleReporter<std::io::Stdout> {
    fn default() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn passed(&mut self, _test: usize, _step: &CommandStep, actual: &str) {
        let _ = writeln!(self.out, "{actual}");
    }

    fn failed(&mut self, failure: &Failure) {
        let _ = writeln!(self.out, "FAILURE: {failure}");
    }

    fn aborted(&mut self, test: usize, error: &SessionError) {
        let _ = writeln!(self.out, "ABORTED: Test {test}: {error}");
    }

    fn finished(&mut self, result: &ExecutionResult) {
        // Fail-fast runs end on their single failure, already printed above.
        if result.continue_on_error() && !result.failures().is_empty() {
            let _ = writeln!(
                self.out,
                "{} failures encountered. See details above.",
                result.failures().len()
            );
        }
        if !result.aborted().is_empty() {
            let _ = writeln!(
                self.out,
                "{} test cases aborted. See details above.",
                result.aborted().len()
            );
        }
        let _ = self.out.flush();
    }
}
