//! Line input: EOF-aware reading, terminator detection, script accumulation.
//!
//! The console is content-agnostic about script syntax.  Every input line is
//! either one of the two control tokens — compared by exact equality after
//! stripping the line terminator, nothing else — or a script line appended
//! verbatim to the pending buffer.

use std::io::{self, BufRead};

// ── Terminators ───────────────────────────────────────────────────────────────

/// The two control tokens that drive the session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Terminators {
    /// Ends accumulation and triggers execution of the pending script.
    pub end_of_script: String,
    /// Ends the session; pending, never-terminated input is discarded.
    pub exit: String,
}

impl Default for Terminators {
    fn default() -> Self {
        Self {
            end_of_script: ";;".to_owned(),
            exit: "exit".to_owned(),
        }
    }
}

impl Terminators {
    /// Classify one input line.
    ///
    /// Comparison is exact: no trimming, no prefix matching.  A line
    /// `";;  "` with trailing spaces is a script line.  The end-of-script
    /// token is checked first, so if both tokens are configured to the same
    /// string, end-of-script deterministically wins.
    pub fn classify(&self, line: &str) -> LineKind {
        if line == self.end_of_script {
            LineKind::EndOfScript
        } else if line == self.exit {
            LineKind::Exit
        } else {
            LineKind::Script
        }
    }
}

/// What one input line means to the session loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// An ordinary line, buffered into the pending script.
    Script,
    /// Execute the pending buffer.
    EndOfScript,
    /// Terminate the session.
    Exit,
}

// ── LineReader ────────────────────────────────────────────────────────────────

/// Reads one line at a time, stripping only the trailing `\n` / `\r\n`.
///
/// Interior whitespace and trailing spaces are preserved — token matching
/// depends on it.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next line, or `Ok(None)` once the source is exhausted.
    pub fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.inner.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(Some(line))
    }
}

// ── ScriptBuffer ──────────────────────────────────────────────────────────────

/// The pending script: lines collected since the last terminator (or
/// session start), each stored verbatim plus a newline.
#[derive(Debug, Default)]
pub struct ScriptBuffer {
    text: String,
}

impl ScriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line plus a newline.
    pub fn push_line(&mut self, line: &str) {
        self.text.push_str(line);
        self.text.push('\n');
    }

    /// Take the accumulated script, resetting the buffer to empty.  The
    /// reset happens here, before execution, so a failing run never
    /// re-executes stale lines.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    /// Discard the accumulated script without executing it.
    pub fn clear(&mut self) {
        self.text.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
