//! Test-case data model.
//!
//! A [`TestCase`] is an ordered list of [`CommandStep`]s replayed against a
//! fresh connection. Each step pairs the literal command with a substring
//! that must appear somewhere in the server's reply.

use std::fmt;

use crate::error::StepError;

/// Line terminator appended to a command before it is written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Terminator {
    /// Sent exactly as written.
    #[default]
    None,
    /// `\r\n` is appended.
    Crlf,
}

impl Terminator {
    #[must_use]
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Self::None => b"",
            Self::Crlf => b"\r\n",
        }
    }
}

/// A single command and the substring its response must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    command: String,
    expected: String,
    terminator: Terminator,
}

impl CommandStep {
    /// Creates a step whose command is sent verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::EmptyCommand`] if `command` is empty.
    pub fn new(command: impl Into<String>, expected: impl Into<String>) -> Result<Self, StepError> {
        Self::with_terminator(command, expected, Terminator::None)
    }

    /// Creates a step for a line-oriented protocol: the command is sent
    /// followed by `\r\n`.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::EmptyCommand`] if `command` is empty.
    pub fn line(command: impl Into<String>, expected: impl Into<String>) -> Result<Self, StepError> {
        Self::with_terminator(command, expected, Terminator::Crlf)
    }

    /// # Errors
    ///
    /// Returns [`StepError::EmptyCommand`] if `command` is empty.
    pub fn with_terminator(
        command: impl Into<String>,
        expected: impl Into<String>,
        terminator: Terminator,
    ) -> Result<Self, StepError> {
        let command = command.into();
        if command.is_empty() {
            return Err(StepError::EmptyCommand);
        }

        Ok(Self {
            command,
            expected: expected.into(),
            terminator,
        })
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
    pub const fn terminator(&self) -> Terminator {
        self.terminator
    }

    /// The exact bytes written to the server for this step.
    #[must_use]
    pub fn wire_bytes(&self) -> Vec<u8> {
        let terminator = self.terminator.as_bytes();
        let mut bytes = Vec::with_capacity(self.command.len() + terminator.len());
        bytes.extend_from_slice(self.command.as_bytes());
        bytes.extend_from_slice(terminator);
        bytes
    }

    /// Whether `actual` contains the expected substring.
    ///
    /// An empty expectation matches anything.
    #[must_use]
    pub fn matches(&self, actual: &str) -> bool {
        actual.contains(self.expected.as_str())
    }
}

impl fmt::Display for CommandStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.command.trim(), self.expected)
    }
}

/// An ordered sequence of steps, run in isolation on its own connection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    steps: Vec<CommandStep>,
}

impl TestCase {
    #[must_use]
    pub const fn new(steps: Vec<CommandStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn steps(&self) -> &[CommandStep] {
        &self.steps
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<Vec<CommandStep>> for TestCase {
    fn from(steps: Vec<CommandStep>) -> Self {
        Self::new(steps)
    }
}

impl FromIterator<CommandStep> for TestCase {
    fn from_iter<T: IntoIterator<Item = CommandStep>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
