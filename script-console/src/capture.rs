//! Per-execution and cumulative script output capture.
//!
//! Script print operations never write to the console's own status stream.
//! Each execution gets a fresh [`ScriptSink`], bound into the environment
//! as the reserved `out` entry; when the execution ends — successfully or
//! not — the sink's contents are merged into the cumulative transcript.
//! The merge also runs on failure, so partial output printed before a
//! mid-script error stays visible in the transcript.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

// ── ScriptSink ────────────────────────────────────────────────────────────────

/// Clonable writable handle the current script prints into.
///
/// All clones append to the same buffer.  Writes performed outside an
/// active execution (e.g. through a handle a script stashed in the store)
/// land in a detached buffer and are never merged — the console does not
/// guard against that.
#[derive(Debug, Clone, Default)]
pub struct ScriptSink {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl ScriptSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buf.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append `text` as-is.
    pub fn print(&self, text: &str) {
        self.lock().extend_from_slice(text.as_bytes());
    }

    /// Append `text` followed by a newline.
    pub fn println(&self, text: &str) {
        let mut buf = self.lock();
        buf.extend_from_slice(text.as_bytes());
        buf.push(b'\n');
    }

    /// Snapshot of everything written so far.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Write for ScriptSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl PartialEq for ScriptSink {
    /// Identity comparison: two handles are equal when they share a buffer.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.buf, &other.buf)
    }
}

// ── OutputCapture ─────────────────────────────────────────────────────────────

/// The pair of sinks backing one session's script output.
///
/// `cumulative` spans the whole session and accumulates every executed
/// script's output in order; `current` is replaced — not cleared — at the
/// start of every execution and holds only the most recent script's output.
#[derive(Debug, Default)]
pub struct OutputCapture {
    cumulative: String,
    current: Option<ScriptSink>,
    merged: bool,
}

impl OutputCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an execution: allocate a fresh current sink and return a
    /// handle for the session to bind as the `out` entry.  The previous
    /// sink is detached; `cumulative` is untouched.
    pub fn begin_execution(&mut self) -> ScriptSink {
        let sink = ScriptSink::new();
        self.current = Some(sink.clone());
        self.merged = false;
        sink
    }

    /// Finish an execution: append the current sink's contents to the
    /// cumulative transcript.  Runs on every exit path, including failed
    /// evaluations; calling it twice for the same execution appends once.
    pub fn end_execution(&mut self) {
        if self.merged {
            return;
        }
        if let Some(sink) = &self.current {
            self.cumulative.push_str(&sink.contents());
        }
        self.merged = true;
    }

    /// Everything every execution printed, in order.
    pub fn cumulative(&self) -> &str {
        &self.cumulative
    }

    /// What the most recent execution printed; empty before any execution.
    pub fn current(&self) -> String {
        self.current.as_ref().map(ScriptSink::contents).unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
