//! An embeddable interactive scripting console.
//!
//! A host application constructs a [`Console`], exposes named [`Value`]
//! bindings to it, and runs the read/execute/report loop over a pair of
//! byte streams.  Script text accumulates line by line until the
//! end-of-script token (default `;;`) is seen, is then handed to the
//! injected [`Evaluator`] together with the [`Environment`], and the
//! captured output plus return value are reported back.  The exit token
//! (default `exit`) ends the session.
//!
//! Every session carries a reserved [`Store`] binding — a shared mutable
//! map scripts can use to keep state between executions — and rebinds a
//! fresh output handle before each run, so each execution's printed output
//! is captured separately from the cumulative transcript.
//!
//! The script language itself is pluggable: any [`Evaluator`] works,
//! including a plain closure.  With the `lua` feature, [`LuaEvaluator`]
//! provides Lua 5.4 out of the box.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use script_console::{Console, EvalError, Environment, Value};
//!
//! // A toy evaluator: every script evaluates to its line count.
//! let evaluator = |script: &str, _env: &mut Environment| {
//!     Ok::<_, EvalError>(Value::Int(script.lines().count() as i64))
//! };
//!
//! let input = Cursor::new("first line\nsecond line\n;;\nexit\n");
//! let mut console = Console::with_io(evaluator, input, Vec::new());
//! console.run().unwrap();
//! assert_eq!(console.last_result(), Some(&Value::Int(2)));
//! ```

pub mod capture;
pub mod console;
pub mod env;
pub mod eval;
pub mod input;
pub mod lua;
pub mod store;
pub mod value;

// Re-exports for convenience.
pub use capture::{OutputCapture, ScriptSink};
pub use console::{Console, ConsoleError};
pub use env::{Environment, UndefinedBindingError, OUTPUT_NAME, STORE_NAME};
pub use eval::{EvalError, Evaluator};
pub use input::{LineKind, Terminators};
#[cfg(feature = "lua")]
pub use lua::LuaEvaluator;
pub use store::Store;
pub use value::{NativeFn, Value};
