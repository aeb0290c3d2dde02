//! Protocol-conformance test client.
//!
//! Replays recorded command sequences against a server speaking a
//! line-oriented text protocol and checks that every response contains the
//! expected text. See [`executor::Executor`] for the pass/fail policy and
//! [`source`] for the command file formats.

pub mod config;
pub mod executor;
pub mod report;
pub mod source;

pub use config::RunConfig;
pub use executor::{ExecutionResult, Executor, Failure, RunError};
pub use report::{ConsoleReporter, Reporter};
pub use source::{CommandSource, FileSource, SourceError, SourceFormat};
