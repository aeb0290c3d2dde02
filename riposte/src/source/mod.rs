//! Where test cases come from.
//!
//! Two textual encodings are understood:
//!
//! - [`lines`]: one test case per line, written as whitespace separated
//!   `command/expected` pairs
//! - [`json`]: a `test_cases` document
//!
//! Any error here is fatal to the run and is reported before a single
//! connection is attempted.

pub mod json;
pub mod lines;

use std::{
    io,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use riposte_common::case::TestCase;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Unable to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid command document: {0}")]
    Json(#[from] serde_json::Error),

    /// A non-blank line contained no `command/expected` pair.
    #[error("Line {line}: no command/expected pair in {content:?}")]
    Malformed { line: usize, content: String },

    #[error("Test {test}, step {step}: command must not be empty")]
    EmptyCommand { test: usize, step: usize },
}

/// Produces the ordered list of test cases for a run.
pub trait CommandSource {
    /// # Errors
    ///
    /// Returns a [`SourceError`] if the input cannot be read or is malformed.
    fn test_cases(&self) -> Result<Vec<TestCase>, SourceError>;
}

impl CommandSource for Vec<TestCase> {
    fn test_cases(&self) -> Result<Vec<TestCase>, SourceError> {
        Ok(self.clone())
    }
}

/// Encoding of a command file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// `command/expected` pairs, one test case per line. Commands are sent
    /// with `\r\n` appended.
    #[default]
    Lines,
    /// `{"test_cases": [{"commands": [{"command", "expected_response"}]}]}`.
    /// Commands are sent verbatim.
    Json,
}

impl SourceFormat {
    /// Guesses the format from the file extension, defaulting to
    /// [`SourceFormat::Lines`].
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Lines,
        }
    }

    /// File read when no path is given.
    #[must_use]
    pub const fn default_path(self) -> &'static str {
        match self {
            Self::Lines => "commands.txt",
            Self::Json => "commands.json",
        }
    }

    /// # Errors
    ///
    /// Returns a [`SourceError`] if `input` is malformed for this format.
    pub fn parse(self, input: &str) -> Result<Vec<TestCase>, SourceError> {
        match self {
            Self::Lines => lines::parse(input),
            Self::Json => json::parse(input),
        }
    }
}

/// Test cases read from a file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSource {
    path: PathBuf,
    format: SourceFormat,
}

impl FileSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, format: SourceFormat) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    /// Uses the file extension to pick the format.
    #[must_use]
    pub fn detect(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = SourceFormat::from_path(&path);
        Self { path, format }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub const fn format(&self) -> SourceFormat {
        self.format
    }
}

impl CommandSource for FileSource {
    fn test_cases(&self) -> Result<Vec<TestCase>, SourceError> {
        let content = std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            path: self.path.clone(),
            source,
        })?;

        self.format.parse(&content)
    }
}
