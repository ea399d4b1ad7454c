//! The console session controller.
//!
//! Drives the read/execute/report loop over a pair of byte streams: lines
//! accumulate until the end-of-script token, the pending script runs
//! against the environment through the injected [`Evaluator`], and the
//! captured output plus return value (or the failure) are reported on the
//! status stream.  The exit token ends the session.
//!
//! The loop is single-threaded and strictly sequential; the blocking line
//! read is its only suspension point.  A session runs once — after it
//! terminates, construct a new [`Console`] instead of re-running it.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use script_console::{Console, EvalError, Environment, Value};
//!
//! // An evaluator that "runs" any script by returning its line count.
//! let evaluator = |script: &str, _env: &mut Environment| {
//!     Ok::<_, EvalError>(Value::Int(script.lines().count() as i64))
//! };
//!
//! let input = Cursor::new("first line\nsecond line\n;;\nexit\n");
//! let mut console = Console::with_io(evaluator, input, Vec::new());
//! console.disable_colors();
//! console.run().unwrap();
//! assert_eq!(console.last_result(), Some(&Value::Int(2)));
//! ```

use std::io::{self, BufRead, BufReader, Write};

use tracing::{debug, warn};

use crate::capture::OutputCapture;
use crate::env::{Environment, UndefinedBindingError, OUTPUT_NAME, STORE_NAME};
use crate::eval::{EvalError, Evaluator};
use crate::input::{LineKind, LineReader, ScriptBuffer, Terminators};
use crate::store::Store;
use crate::value::Value;

pub const ANSI_RESET: &str = "\u{1b}[0m";
pub const ANSI_RED: &str = "\u{1b}[31m";
pub const ANSI_BLUE: &str = "\u{1b}[34m";

// ── ConsoleError ──────────────────────────────────────────────────────────────

/// Fatal session failures.
///
/// Script evaluation failures are *not* here — they are reported on the
/// status stream and the loop keeps prompting.  These errors end the
/// session and propagate to the embedding host.
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Input closed before the exit token was seen.
    #[error("input exhausted before the exit token was seen")]
    InputExhausted,
    /// Reading the input or writing the status stream failed.
    #[error("console i/o error: {0}")]
    Io(#[from] io::Error),
    /// `run()` called again after the session terminated.
    #[error("session already terminated; construct a new console")]
    SessionTerminated,
}

// ── Console ───────────────────────────────────────────────────────────────────

/// An interactive scripting session.
///
/// Construct one per session, expose bindings with
/// [`set_variable`](Console::set_variable), then call
/// [`run`](Console::run).  Token and color setters are meant to be used
/// before `run`; reconfiguring them mid-session (from an evaluator
/// callback) is undefined behavior the console does not guard against.
pub struct Console<E> {
    evaluator: E,
    env: Environment,
    store: Store,
    capture: OutputCapture,
    buffer: ScriptBuffer,
    terminators: Terminators,
    input: LineReader<Box<dyn BufRead>>,
    output: Box<dyn Write>,
    colors: bool,
    last_result: Option<Value>,
    last_error: Option<EvalError>,
    terminated: bool,
}

impl<E: Evaluator> Console<E> {
    /// Console on the process's standard input and output.
    pub fn new(evaluator: E) -> Self {
        Self::with_io(evaluator, BufReader::new(io::stdin()), io::stdout())
    }

    /// Console on caller-supplied streams.
    pub fn with_io(
        evaluator: E,
        input: impl BufRead + 'static,
        output: impl Write + 'static,
    ) -> Self {
        let store = Store::new();
        let mut env = Environment::new();
        // The store entry exists from construction on and is never replaced.
        env.set_variable(STORE_NAME, Value::Map(store.clone()));
        Self {
            evaluator,
            env,
            store,
            capture: OutputCapture::new(),
            buffer: ScriptBuffer::new(),
            terminators: Terminators::default(),
            input: LineReader::new(Box::new(input)),
            output: Box::new(output),
            colors: true,
            last_result: None,
            last_error: None,
            terminated: false,
        }
    }

    // ── Bindings ──────────────────────────────────────────────────────────────

    /// Insert or replace a binding, observable to subsequent executions.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if Environment::is_reserved(&name) {
            warn!(name = %name, "binding shadows a reserved console name");
        }
        self.env.set_variable(name, value);
    }

    pub fn get_variable(&self, name: &str) -> Result<&Value, UndefinedBindingError> {
        self.env.get_variable(name)
    }

    pub fn has_variable(&self, name: &str) -> bool {
        self.env.has_variable(name)
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Direct mutable access to the binding map.  Replacing the reserved
    /// entries through it is the same configuration hazard as binding over
    /// them by name, minus the warning.
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// The session store (same map scripts see under `store`).
    pub fn store(&self) -> &Store {
        &self.store
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    pub fn end_of_script(&self) -> &str {
        &self.terminators.end_of_script
    }

    pub fn set_end_of_script(&mut self, token: impl Into<String>) {
        self.terminators.end_of_script = token.into();
    }

    pub fn exit_token(&self) -> &str {
        &self.terminators.exit
    }

    pub fn set_exit_token(&mut self, token: impl Into<String>) {
        self.terminators.exit = token.into();
    }

    pub fn enable_colors(&mut self) {
        self.colors = true;
    }

    pub fn disable_colors(&mut self) {
        self.colors = false;
    }

    pub fn colors_enabled(&self) -> bool {
        self.colors
    }

    // ── Observable outputs ────────────────────────────────────────────────────

    /// Everything every execution printed, in order.
    pub fn cumulative_output(&self) -> String {
        self.capture.cumulative().to_owned()
    }

    /// What the most recent execution printed; empty before any execution.
    pub fn current_output(&self) -> String {
        self.capture.current()
    }

    /// Result of the most recent successful execution.  A failed execution
    /// leaves the previous value in place.
    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    /// Error of the most recent execution, cleared by the next success.
    pub fn last_error(&self) -> Option<&EvalError> {
        self.last_error.as_ref()
    }

    // ── Session loop ──────────────────────────────────────────────────────────

    /// Run the session to completion.
    ///
    /// Returns `Ok(())` once the exit token is seen.  EOF on the input
    /// before that is [`ConsoleError::InputExhausted`]; the host decides
    /// whether that is fatal.  Evaluation failures never end the loop.
    pub fn run(&mut self) -> Result<(), ConsoleError> {
        if self.terminated {
            return Err(ConsoleError::SessionTerminated);
        }
        self.print_banner()?;
        loop {
            let line = match self.input.next_line()? {
                Some(line) => line,
                None => {
                    self.terminated = true;
                    return Err(ConsoleError::InputExhausted);
                }
            };
            match self.terminators.classify(&line) {
                LineKind::EndOfScript => self.execute_pending()?,
                LineKind::Exit => {
                    // Pending, never-terminated input is discarded unexecuted.
                    self.buffer.clear();
                    writeln!(self.output, "Bye!")?;
                    break;
                }
                LineKind::Script => self.buffer.push_line(&line),
            }
        }
        self.output.flush()?;
        self.terminated = true;
        Ok(())
    }

    /// One `Executing` transition: run the pending buffer and report.
    fn execute_pending(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "Executing script...")?;
        let script = self.buffer.take();
        debug!(bytes = script.len(), "executing script");

        let sink = self.capture.begin_execution();
        self.env.set_variable(OUTPUT_NAME, Value::Sink(sink));
        let result = self.evaluator.evaluate(&script, &mut self.env);
        // Merge into the transcript on every path, also when the script
        // failed partway through.
        self.capture.end_execution();

        match result {
            Ok(value) => {
                let current = self.capture.current();
                writeln!(self.output, "Script output:")?;
                self.paint(ANSI_BLUE)?;
                writeln!(self.output, "{}", current.trim())?;
                self.paint(ANSI_RESET)?;
                writeln!(self.output, "Script returned:")?;
                self.paint(ANSI_BLUE)?;
                writeln!(self.output, "{value}")?;
                self.paint(ANSI_RESET)?;
                self.last_result = Some(value);
                self.last_error = None;
            }
            Err(err) => {
                debug!(error = %err, "script evaluation failed");
                writeln!(self.output, "Exception while executing script:")?;
                self.paint(ANSI_RED)?;
                writeln!(self.output, "{err}")?;
                if let Some(trace) = err.trace() {
                    writeln!(self.output, "{trace}")?;
                }
                self.paint(ANSI_RESET)?;
                self.last_error = Some(err);
            }
        }

        writeln!(self.output, "--------------")?;
        writeln!(self.output, "Write another script:")?;
        Ok(())
    }

    // ── Startup output ────────────────────────────────────────────────────────

    fn print_banner(&mut self) -> Result<(), ConsoleError> {
        self.paint(ANSI_BLUE)?;
        writeln!(self.output, "--- Script console ---")?;
        writeln!(self.output, "Write a script to execute.")?;
        writeln!(
            self.output,
            "After you are done, write the command for \"end of script\" and the script will be executed."
        )?;
        writeln!(
            self.output,
            "If you want to leave the console, write the command for \"exit\"."
        )?;
        writeln!(self.output)?;
        writeln!(self.output, "Special commands:")?;
        writeln!(self.output, "end of script - {}", self.terminators.end_of_script)?;
        writeln!(self.output, "exit - {}", self.terminators.exit)?;
        writeln!(self.output)?;
        self.print_bindings()?;
        writeln!(self.output)?;
        self.paint(ANSI_RESET)?;
        Ok(())
    }

    /// One-shot listing of the bindings present right now.  Bindings added
    /// later never retroactively appear here but stay fully usable.
    fn print_bindings(&mut self) -> io::Result<()> {
        writeln!(self.output, "Bindings (variable name - type):")?;
        let mut bindings: Vec<(String, &'static str)> = self
            .env
            .iter()
            .map(|(name, value)| (name.clone(), value.type_name()))
            .collect();
        bindings.sort();
        for (name, ty) in bindings {
            writeln!(self.output, "{name} - {ty}")?;
        }
        Ok(())
    }

    fn paint(&mut self, code: &str) -> io::Result<()> {
        if self.colors {
            write!(self.output, "{code}")?;
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::ScriptSink;
    use std::io::Cursor;

    fn nil_eval(_script: &str, _env: &mut Environment) -> Result<Value, EvalError> {
        Ok(Value::Nil)
    }

    fn console_over(
        input: &'static str,
    ) -> (
        Console<fn(&str, &mut Environment) -> Result<Value, EvalError>>,
        ScriptSink,
    ) {
        let status = ScriptSink::new();
        let mut console = Console::with_io(
            nil_eval as fn(&str, &mut Environment) -> Result<Value, EvalError>,
            Cursor::new(input),
            status.clone(),
        );
        console.disable_colors();
        (console, status)
    }

    #[test]
    fn store_binding_exists_from_construction() {
        let (console, _status) = console_over("exit\n");
        assert!(console.has_variable(STORE_NAME));
        match console.get_variable(STORE_NAME) {
            Ok(Value::Map(map)) => assert!(map.same_as(console.store())),
            other => panic!("unexpected store binding: {other:?}"),
        }
    }

    #[test]
    fn banner_shows_tokens_and_bindings() {
        let (mut console, status) = console_over("exit\n");
        console.set_variable("answer", 42i64);
        console.run().unwrap();
        let transcript = status.contents();
        assert!(transcript.contains("end of script - ;;"));
        assert!(transcript.contains("exit - exit"));
        assert!(transcript.contains("answer - integer"));
        assert!(transcript.contains("store - map"));
        assert!(transcript.contains("Bye!"));
    }

    #[test]
    fn rerun_after_termination_is_an_error() {
        let (mut console, _status) = console_over("exit\n");
        console.run().unwrap();
        assert!(matches!(console.run(), Err(ConsoleError::SessionTerminated)));
    }

    #[test]
    fn eof_is_input_exhausted_and_terminates() {
        let (mut console, _status) = console_over("no exit here\n");
        assert!(matches!(console.run(), Err(ConsoleError::InputExhausted)));
        assert!(matches!(console.run(), Err(ConsoleError::SessionTerminated)));
    }

    #[test]
    fn colors_paint_status_regions() {
        let status = ScriptSink::new();
        let mut console = Console::with_io(
            nil_eval as fn(&str, &mut Environment) -> Result<Value, EvalError>,
            Cursor::new(";;\nexit\n"),
            status.clone(),
        );
        console.run().unwrap();
        let transcript = status.contents();
        assert!(transcript.contains(ANSI_BLUE));
        assert!(transcript.contains(ANSI_RESET));
    }
}
