//! Splits a hex text fixture into one binary `.test` file per named test case.
//!
//! A fixture is a sequence of lines. `TEST=<name>` opens a block, following
//! lines carry hex pairs, and `[Debug]` lines are ignored anywhere.

use std::{
    fs, mem,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use hex::FromHexError;
use thiserror::Error;

/// Upper bound on the decoded size of a single block: one 320x240 16-bit framebuffer.
pub(crate) const BUFFER_CAPACITY: usize = 320 * 240 * 2;

const TEST_MARKER: &str = "TEST=";
const DEBUG_MARKER: &str = "[Debug]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SplitError {
    #[error("test {test}: invalid hex pair `{pair}`")]
    InvalidHex { test: String, pair: String },
    #[error("test {test}: dangling hex digit `{digit}` at end of line")]
    DanglingNibble { test: String, digit: char },
    #[error("test {test}: decoded data exceeds buffer capacity of {capacity} bytes")]
    CapacityExceeded { test: String, capacity: usize },
}

/// A completed block, ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TestCase {
    pub(crate) name: String,
    pub(crate) bytes: Vec<u8>,
}

impl TestCase {
    fn file_name(&self) -> String {
        format!("{}.test", self.name)
    }
}

#[derive(Debug, Default)]
enum State {
    #[default]
    Idle,
    Active {
        name: String,
        bytes: Vec<u8>,
    },
}

/// Line-driven state machine. Feed it trimmed, non-empty lines in order and
/// call [`FixtureSplitter::finish`] once the input is exhausted.
#[derive(Debug, Default)]
pub(crate) struct FixtureSplitter {
    state: State,
}

impl FixtureSplitter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Consumes one line. Returns the previous block when a `TEST=` header
    /// closes it with at least one decoded byte.
    pub(crate) fn push_line(&mut self, line: &str) -> Result<Option<TestCase>, SplitError> {
        if line.starts_with(DEBUG_MARKER) {
            return Ok(None);
        }

        if let Some(rest) = line.strip_prefix(TEST_MARKER) {
            let finished = self.flush();
            let name = rest.trim();
            // An empty name never becomes active, so its data is dropped.
            if !name.is_empty() {
                self.state = State::Active {
                    name: name.to_string(),
                    bytes: Vec::new(),
                };
            }
            return Ok(finished);
        }

        if let State::Active { name, bytes } = &mut self.state {
            decode_line(name, line, bytes)?;
        }
        Ok(None)
    }

    pub(crate) fn finish(mut self) -> Option<TestCase> {
        self.flush()
    }

    #[cfg(test)]
    fn active_test(&self) -> Option<&str> {
        match &self.state {
            State::Idle => None,
            State::Active { name, .. } => Some(name),
        }
    }

    fn flush(&mut self) -> Option<TestCase> {
        match mem::take(&mut self.state) {
            State::Active { name, bytes } if !bytes.is_empty() => Some(TestCase { name, bytes }),
            _ => None,
        }
    }
}

fn decode_line(test: &str, line: &str, out: &mut Vec<u8>) -> Result<(), SplitError> {
    let digits: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    let decoded = hex::decode(&digits).map_err(|err| match err {
        FromHexError::InvalidHexCharacter { c, index } => {
            let start = index - index % 2;
            SplitError::InvalidHex {
                test: test.to_string(),
                pair: digits
                    .get(start..start + 2)
                    .map_or_else(|| c.to_string(), str::to_string),
            }
        }
        FromHexError::OddLength | FromHexError::InvalidStringLength => {
            SplitError::DanglingNibble {
                test: test.to_string(),
                digit: digits.chars().last().unwrap_or_default(),
            }
        }
    })?;
    if out.len() + decoded.len() > BUFFER_CAPACITY {
        return Err(SplitError::CapacityExceeded {
            test: test.to_string(),
            capacity: BUFFER_CAPACITY,
        });
    }
    out.extend(decoded);
    Ok(())
}

fn fixture_lines(content: &str) -> impl Iterator<Item = &str> {
    content
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub len: usize,
}

#[derive(Debug, Default)]
pub struct SplitReport {
    pub written: Vec<WrittenFile>,
}

pub fn split_file(input: &Path, out_dir: &Path) -> Result<SplitReport> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("failed to read fixture {}", input.display()))?;
    split_into(&content, out_dir)
}

/// Scans `content` and writes every non-empty block to `out_dir`, which must
/// already exist. Blocks flushed before an error stay on disk.
pub(crate) fn split_into(content: &str, out_dir: &Path) -> Result<SplitReport> {
    let mut splitter = FixtureSplitter::new();
    let mut report = SplitReport::default();

    for line in fixture_lines(content) {
        if let Some(case) = splitter.push_line(line)? {
            report.written.push(write_case(out_dir, &case)?);
        }
    }
    if let Some(case) = splitter.finish() {
        report.written.push(write_case(out_dir, &case)?);
    }

    Ok(report)
}

fn write_case(out_dir: &Path, case: &TestCase) -> Result<WrittenFile> {
    let path = out_dir.join(case.file_name());
    fs::write(&path, &case.bytes)
        .with_context(|| format!("failed to write test case {}", path.display()))?;
    println!("Wrote {} bytes to {}", case.bytes.len(), path.display());
    Ok(WrittenFile {
        path,
        len: case.bytes.len(),
    })
}
