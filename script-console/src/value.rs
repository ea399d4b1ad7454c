//! Dynamic value type crossing the host/script boundary.
//!
//! The console is polymorphic over what a host binds into a session: plain
//! scalars, a shared mutable map ([`Store`]), native functions, or the
//! execution-scoped output handle.  The core never interprets a value beyond
//! its display form and type descriptor; evaluators convert to and from
//! their engine's own types.

use std::fmt;
use std::sync::Arc;

use crate::capture::ScriptSink;
use crate::store::Store;

// ── NativeFn ──────────────────────────────────────────────────────────────────

/// A host-supplied native function callable from script code.
///
/// The closure is behind an `Arc`, so cloning a bound function is a cheap
/// reference-count increment.  Errors are plain strings; an evaluator
/// surfaces them through its own runtime-error channel.
#[derive(Clone)]
pub struct NativeFn(Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>);

impl NativeFn {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Invoke the function with the given arguments.
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.0)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NativeFn")
    }
}

impl PartialEq for NativeFn {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

// ── Value ─────────────────────────────────────────────────────────────────────

/// A value bound into the console [`Environment`](crate::env::Environment)
/// or returned by a script execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// A shared mutable map — the session store, or any host-supplied map.
    /// Cloning shares the underlying entries.
    Map(Store),
    /// A host-supplied native function.
    Func(NativeFn),
    /// The execution-scoped output handle (the reserved `out` binding).
    Sink(ScriptSink),
}

impl Default for Value {
    fn default() -> Self {
        Value::Nil
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => {
                // Print floats without trailing zeros where possible, but
                // keep one decimal so they stay visually distinct from ints.
                if x.fract() == 0.0 && x.abs() < 1e15 {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{x}")
                }
            }
            Value::Str(s) => f.write_str(s),
            Value::Map(store) => {
                // Entries sorted by key so the rendering is deterministic.
                let mut entries = store.entries();
                entries.sort_by(|a, b| a.0.cmp(&b.0));
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
            Value::Func(_) => f.write_str("<fn>"),
            Value::Sink(_) => f.write_str("<out>"),
        }
    }
}

impl Value {
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    /// Human-readable type descriptor, used by the startup bindings listing.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "real",
            Value::Str(_) => "string",
            Value::Map(_) => "map",
            Value::Func(_) => "function",
            Value::Sink(_) => "output",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

impl From<Store> for Value {
    fn from(store: Store) -> Self {
        Value::Map(store)
    }
}

impl From<NativeFn> for Value {
    fn from(f: NativeFn) -> Self {
        Value::Func(f)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
