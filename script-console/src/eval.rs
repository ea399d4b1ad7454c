//! The execution adapter boundary.
//!
//! The console never parses or runs script text itself; it hands the
//! accumulated source and the [`Environment`] to an injected [`Evaluator`]
//! and reports whatever comes back.  The call is synchronous — the session
//! blocks until the evaluator returns, with no timeout or cancellation; a
//! hung script hangs the session.

use crate::env::Environment;
use crate::value::Value;

/// Failure of one script evaluation.
///
/// Compile-time and run-time failures travel through the same type and are
/// reported identically: the session prints the description (plus the trace
/// when one is available) and keeps prompting.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// The script could not be parsed or compiled.
    #[error("parse error: {message}")]
    Parse { message: String },
    /// The script failed while running.
    #[error("runtime error: {message}")]
    Runtime {
        message: String,
        /// Stack/source trace, when the platform affords one.
        trace: Option<String>,
    },
}

impl EvalError {
    pub fn parse(message: impl Into<String>) -> Self {
        EvalError::Parse {
            message: message.into(),
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        EvalError::Runtime {
            message: message.into(),
            trace: None,
        }
    }

    pub fn runtime_with_trace(message: impl Into<String>, trace: impl Into<String>) -> Self {
        EvalError::Runtime {
            message: message.into(),
            trace: Some(trace.into()),
        }
    }

    /// The trace attached to a runtime failure, if any.
    pub fn trace(&self) -> Option<&str> {
        match self {
            EvalError::Runtime { trace, .. } => trace.as_deref(),
            EvalError::Parse { .. } => None,
        }
    }
}

/// An embedded script evaluator.
///
/// Implementations run `script` against `env` — reading bindings, calling
/// native functions, printing through the bound output handle — and return
/// a single result value or an error.  The console treats the script
/// grammar as entirely opaque.
pub trait Evaluator {
    fn evaluate(&mut self, script: &str, env: &mut Environment) -> Result<Value, EvalError>;
}

/// Closures are evaluators, so hosts and tests can inject one-liners.
impl<F> Evaluator for F
where
    F: FnMut(&str, &mut Environment) -> Result<Value, EvalError>,
{
    fn evaluate(&mut self, script: &str, env: &mut Environment) -> Result<Value, EvalError> {
        self(script, env)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
