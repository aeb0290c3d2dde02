//! Line-oriented command files.
//!
//! Every non-blank line is one test case made of `command/expected` pairs:
//!
//! ```text
//! USER alice/331 PASS secret/230
//! NOOP/200
//! ```
//!
//! A pair runs from the current position up to the first `/` (which needs at
//! least one character in front of it), then on up to the next whitespace.
//! The command may therefore contain spaces but the expected text may not.
//! The pair is split at its *rightmost* `/`, so `GET a/b/c` becomes the
//! command `GET a/b` expecting `c`.
//!
//! Blank lines are skipped and do not count towards test numbering: `Test 2`
//! is the second non-blank line, wherever it sits in the file. Line numbers
//! in [`SourceError::Malformed`] are still file line numbers.

use riposte_common::{
    case::{CommandStep, TestCase},
    tracing,
};

use super::SourceError;

/// # Errors
///
/// Returns [`SourceError::Malformed`] for a non-blank line without any pair
/// and [`SourceError::EmptyCommand`] for a pair with a blank command.
pub fn parse(input: &str) -> Result<Vec<TestCase>, SourceError> {
    let mut cases = Vec::new();

    for (number, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (found, rest) = pairs(line);
        if found.is_empty() {
            return Err(SourceError::Malformed {
                line: number + 1,
                content: line.to_string(),
            });
        }

        let rest = rest.trim();
        if !rest.is_empty() {
            tracing::warn!(line = number + 1, ignored = rest, "Ignoring text after last pair");
        }

        let test = cases.len() + 1;
        let steps = found
            .into_iter()
            .enumerate()
            .map(|(index, pair)| step(pair, test, index + 1))
            .collect::<Result<Vec<_>, _>>()?;

        cases.push(TestCase::new(steps));
    }

    Ok(cases)
}

fn step(pair: &str, test: usize, step: usize) -> Result<CommandStep, SourceError> {
    let (command, expected) = pair
        .rsplit_once('/')
        .ok_or(SourceError::EmptyCommand { test, step })?;

    CommandStep::line(command.trim(), expected)
        .map_err(|_| SourceError::EmptyCommand { test, step })
}

/// Splits `line` into its pairs, returning them along with any unmatched
/// trailing text.
fn pairs(line: &str) -> (Vec<&str>, &str) {
    let mut found = Vec::new();
    let mut rest = line;

    loop {
        let Some(first) = rest.chars().next() else {
            break;
        };
        let skip = first.len_utf8();

        let Some(slash) = rest[skip..].find('/').map(|i| i + skip) else {
            break;
        };

        let after = &rest[slash + 1..];
        let mut chars = after.char_indices();
        if chars.next().is_none() {
            break;
        }

        let end = chars
            .find(|(_, c)| c.is_whitespace())
            .map_or(after.len(), |(i, _)| i);

        let (pair, tail) = rest.split_at(slash + 1 + end);
        found.push(pair);
        rest = tail;
    }

    (found, rest)
}
