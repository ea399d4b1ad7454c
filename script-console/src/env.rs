//! Named bindings visible to script code.
//!
//! The environment is a flat mapping from binding name to [`Value`],
//! mutated by the host before or during a session and read by the
//! evaluator on every execution.  Two names are reserved:
//!
//! * [`STORE_NAME`] — the session [`Store`](crate::store::Store), set once
//!   at session construction and never replaced;
//! * [`OUTPUT_NAME`] — the execution-scoped output handle, rebound by the
//!   session before every run.
//!
//! A host choosing one of the reserved identifiers for its own binding is a
//! configuration hazard, not an enforced error; [`Environment::is_reserved`]
//! makes the collision checkable and the console logs a warning when it
//! happens.

use std::collections::HashMap;

use crate::value::Value;

/// Reserved binding name for the session store.
pub const STORE_NAME: &str = "store";

/// Reserved binding name for the execution-scoped output handle.
pub const OUTPUT_NAME: &str = "out";

/// Error returned when a binding is read but was never set.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("undefined binding: {name}")]
pub struct UndefinedBindingError {
    pub name: String,
}

/// The mutable binding map shared between host and script.
#[derive(Debug, Default)]
pub struct Environment {
    vars: HashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` for names the console itself binds.
    pub fn is_reserved(name: &str) -> bool {
        name == STORE_NAME || name == OUTPUT_NAME
    }

    /// Insert or replace a binding.  Always succeeds; the new value is
    /// observable to every subsequent execution.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Look up a binding, failing if it was never set.
    pub fn get_variable(&self, name: &str) -> Result<&Value, UndefinedBindingError> {
        self.vars.get(name).ok_or_else(|| UndefinedBindingError {
            name: name.to_owned(),
        })
    }

    /// Existence check, no side effects.
    pub fn has_variable(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    /// Remove a binding.  Returns `true` if it existed.
    pub fn unset_variable(&mut self, name: &str) -> bool {
        self.vars.remove(name).is_some()
    }

    /// Iterate over all bindings (unordered).
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
