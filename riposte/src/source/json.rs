//! Structured command documents.
//!
//! ```json
//! {
//!   "test_cases": [
//!     { "commands": [{ "command": "NOOP\r\n", "expected_response": "200" }] }
//!   ]
//! }
//! ```
//!
//! Commands are sent exactly as written, so the document must carry its own
//! line endings.

use riposte_common::case::{CommandStep, TestCase};
use serde::Deserialize;

use super::SourceError;

#[derive(Debug, Deserialize)]
struct Document {
    test_cases: Vec<Case>,
}

#[derive(Debug, Deserialize)]
struct Case {
    commands: Vec<Step>,
}

#[derive(Debug, Deserialize)]
struct Step {
    command: String,
    expected_response: String,
}

/// # Errors
///
/// Returns [`SourceError::Json`] if the document does not have the expected
/// shape and [`SourceError::EmptyCommand`] for an empty command.
pub fn parse(input: &str) -> Result<Vec<TestCase>, SourceError> {
    let document: Document = serde_json::from_str(input)?;

    document
        .test_cases
        .into_iter()
        .enumerate()
        .map(|(test, case)| {
            case.commands
                .into_iter()
                .enumerate()
                .map(|(step, Step { command, expected_response })| {
                    CommandStep::new(command, expected_response).map_err(|_| {
                        SourceError::EmptyCommand {
                            test: test + 1,
                            step: step + 1,
                        }
                    })
                })
                .collect::<Result<TestCase, _>>()
        })
        .collect()
}
