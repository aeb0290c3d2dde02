//! Errors raised while building test-case data.

use thiserror::Error;

/// A [`CommandStep`](crate::case::CommandStep) could not be constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    /// The command text was empty.
    #[error("Command must not be empty")]
    EmptyCommand,
}
