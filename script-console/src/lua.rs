//! Optional Lua 5.4 evaluation via the `mlua` crate.
//!
//! Enabled with the `lua` Cargo feature:
//! ```text
//! cargo build --features lua
//! cargo test  --features lua
//! ```
//!
//! [`LuaEvaluator`] is the reference [`Evaluator`](crate::eval::Evaluator)
//! implementation.  One Lua state lives for the whole session, so globals a
//! script creates persist across executions; environment bindings are
//! re-bound as globals before every run.
//!
//! # Script-visible API
//!
//! | Binding                | Effect                                        |
//! |------------------------|-----------------------------------------------|
//! | `out.print(v)`         | Append `v` to the captured execution output   |
//! | `out.println(v)`       | Same, followed by a newline                   |
//! | `print(…)`             | Redirected into the captured output           |
//! | `store.key = value`    | Persist a value across executions             |
//! | any host binding       | Converted per the table below                 |
//!
//! # Value conversion
//!
//! | [`Value`]      | Lua                                   |
//! |----------------|---------------------------------------|
//! | `Nil`          | `nil`                                 |
//! | `Bool`         | boolean                               |
//! | `Int`          | integer                               |
//! | `Float`        | number                                |
//! | `Str`          | string                                |
//! | `Map`          | table (snapshot; only `store` syncs back) |
//! | `Func`         | function                              |
//! | `Sink`         | the `out` table                       |
//!
//! Lua tables coming back convert into fresh `Map`s; functions and other
//! engine-only values degrade to a `<type>` placeholder string.
//!
//! [`Value`]: crate::value::Value

#[cfg(feature = "lua")]
pub use lua_impl::LuaEvaluator;

#[cfg(feature = "lua")]
mod lua_impl {
    use std::collections::HashMap;

    use mlua::prelude::*;

    use crate::env::{Environment, OUTPUT_NAME, STORE_NAME};
    use crate::eval::{EvalError, Evaluator};
    use crate::store::Store;
    use crate::value::Value;

    /// Cap on nested table/map conversion, against cyclic structures.
    const MAX_CONVERT_DEPTH: usize = 16;

    // ── LuaEvaluator ──────────────────────────────────────────────────────

    /// A Lua 5.4 interpreter behind the console's evaluator boundary.
    ///
    /// Create once per session; drop to close the interpreter.
    pub struct LuaEvaluator {
        lua: Lua,
    }

    impl LuaEvaluator {
        pub fn new() -> Self {
            Self { lua: Lua::new() }
        }

        /// Write the script's final `store` table back through the shared
        /// handle, so mutations done with plain `store.key = value` syntax
        /// survive the execution.  A script that rebinds `store` to a
        /// non-table value forfeits persistence for that run.
        fn sync_store_back(&self, env: &Environment) {
            let store = match env.get_variable(STORE_NAME) {
                Ok(Value::Map(store)) => store.clone(),
                _ => return,
            };
            if let Ok(LuaValue::Table(tbl)) = self.lua.globals().get::<LuaValue>(STORE_NAME) {
                let mut entries = HashMap::new();
                for pair in tbl.pairs::<LuaValue, LuaValue>() {
                    if let Ok((key, value)) = pair {
                        entries.insert(text_of(&key), from_lua(&value));
                    }
                }
                store.replace_all(entries);
            }
        }
    }

    impl Default for LuaEvaluator {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Evaluator for LuaEvaluator {
        fn evaluate(&mut self, script: &str, env: &mut Environment) -> Result<Value, EvalError> {
            let globals = self.lua.globals();

            // Re-bind every environment entry as a global.  The environment
            // is authoritative for its names; anything else in the Lua state
            // is a script-created global and persists untouched.
            for (name, value) in env.iter() {
                let converted = to_lua(&self.lua, value).map_err(setup_error)?;
                globals.set(name.as_str(), converted).map_err(setup_error)?;
            }

            // Route the global `print` into the current sink as well, so
            // plain `print(...)` is captured like `out.println(...)`.
            if let Ok(Value::Sink(sink)) = env.get_variable(OUTPUT_NAME) {
                let sink = sink.clone();
                let print = self
                    .lua
                    .create_function(move |_, args: LuaMultiValue| {
                        let parts: Vec<String> =
                            args.into_iter().map(|a| text_of(&a)).collect();
                        sink.println(&parts.join("\t"));
                        Ok(())
                    })
                    .map_err(setup_error)?;
                globals.set("print", print).map_err(setup_error)?;
            }

            let result = self.lua.load(script).eval::<LuaValue>();

            // Runs on the failure path too: store writes made before a
            // mid-script error are kept.
            self.sync_store_back(env);

            match result {
                Ok(value) => Ok(from_lua(&value)),
                Err(err) => Err(convert_error(err)),
            }
        }
    }

    // ── Value conversion ──────────────────────────────────────────────────

    fn to_lua(lua: &Lua, value: &Value) -> LuaResult<LuaValue> {
        to_lua_at(lua, value, 0)
    }

    fn to_lua_at(lua: &Lua, value: &Value, depth: usize) -> LuaResult<LuaValue> {
        if depth >= MAX_CONVERT_DEPTH {
            return Ok(LuaValue::String(lua.create_string("<nested>")?));
        }
        match value {
            Value::Nil => Ok(LuaValue::Nil),
            Value::Bool(b) => Ok(LuaValue::Boolean(*b)),
            Value::Int(n) => Ok(LuaValue::Integer(*n)),
            Value::Float(x) => Ok(LuaValue::Number(*x)),
            Value::Str(s) => Ok(LuaValue::String(lua.create_string(s)?)),
            Value::Map(map) => {
                let tbl = lua.create_table()?;
                for (key, entry) in map.entries() {
                    tbl.set(key, to_lua_at(lua, &entry, depth + 1)?)?;
                }
                Ok(LuaValue::Table(tbl))
            }
            Value::Func(f) => {
                let f = f.clone();
                let func = lua.create_function(move |ctx, args: LuaMultiValue| {
                    let args: Vec<Value> = args.into_iter().map(|a| from_lua(&a)).collect();
                    match f.call(&args) {
                        Ok(v) => to_lua(ctx, &v),
                        Err(message) => Err(LuaError::RuntimeError(message)),
                    }
                })?;
                Ok(LuaValue::Function(func))
            }
            Value::Sink(sink) => {
                let tbl = lua.create_table()?;
                let s = sink.clone();
                tbl.set(
                    "print",
                    lua.create_function(move |_, text: Option<LuaValue>| {
                        s.print(&text.as_ref().map(text_of).unwrap_or_default());
                        Ok(())
                    })?,
                )?;
                let s = sink.clone();
                tbl.set(
                    "println",
                    lua.create_function(move |_, text: Option<LuaValue>| {
                        s.println(&text.as_ref().map(text_of).unwrap_or_default());
                        Ok(())
                    })?,
                )?;
                Ok(LuaValue::Table(tbl))
            }
        }
    }

    fn from_lua(value: &LuaValue) -> Value {
        from_lua_at(value, 0)
    }

    fn from_lua_at(value: &LuaValue, depth: usize) -> Value {
        match value {
            LuaValue::Nil => Value::Nil,
            LuaValue::Boolean(b) => Value::Bool(*b),
            LuaValue::Integer(n) => Value::Int(*n),
            LuaValue::Number(x) => Value::Float(*x),
            LuaValue::String(s) => Value::Str(string_of(s)),
            LuaValue::Table(tbl) => {
                if depth >= MAX_CONVERT_DEPTH {
                    return Value::Str("<table>".to_owned());
                }
                let map = Store::new();
                for pair in tbl.clone().pairs::<LuaValue, LuaValue>() {
                    if let Ok((key, entry)) = pair {
                        map.put(text_of(&key), from_lua_at(&entry, depth + 1));
                    }
                }
                Value::Map(map)
            }
            other => Value::Str(format!("<{}>", other.type_name())),
        }
    }

    /// Plain-text rendering of a Lua value, used for printed output and
    /// for stringifying table keys.
    fn text_of(value: &LuaValue) -> String {
        match value {
            LuaValue::Nil => "nil".to_owned(),
            LuaValue::Boolean(b) => b.to_string(),
            LuaValue::Integer(n) => n.to_string(),
            LuaValue::Number(x) => x.to_string(),
            LuaValue::String(s) => string_of(s),
            other => format!("<{}>", other.type_name()),
        }
    }

    fn string_of(s: &LuaString) -> String {
        match s.to_str() {
            Ok(text) => text.to_owned(),
            Err(_) => String::from_utf8_lossy(&s.as_bytes()).into_owned(),
        }
    }

    // ── Error mapping ─────────────────────────────────────────────────────

    /// Failure while wiring bindings into the Lua state, before the script
    /// itself ran.
    fn setup_error(err: LuaError) -> EvalError {
        EvalError::runtime(err.to_string())
    }

    fn convert_error(err: LuaError) -> EvalError {
        match err {
            LuaError::SyntaxError { message, .. } => EvalError::parse(message),
            LuaError::RuntimeError(message) => EvalError::runtime(message),
            LuaError::CallbackError { traceback, cause } => {
                EvalError::runtime_with_trace(cause.to_string(), traceback)
            }
            other => EvalError::runtime(other.to_string()),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
