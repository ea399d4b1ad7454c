//! Session-level tests driven through in-memory streams, with closure
//! evaluators standing in for a real script engine.  Lua end-to-end
//! coverage lives in `lua_tests.rs`.

use std::cell::Cell;
use std::io::Cursor;
use std::rc::Rc;

use script_console::{
    Console, ConsoleError, EvalError, Environment, Evaluator, NativeFn, ScriptSink, Store, Value,
    OUTPUT_NAME, STORE_NAME,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// The output handle bound for the current execution.
fn out_sink(env: &Environment) -> ScriptSink {
    match env.get_variable(OUTPUT_NAME) {
        Ok(Value::Sink(sink)) => sink.clone(),
        other => panic!("no output sink bound: {other:?}"),
    }
}

/// Evaluator that prints every script line and returns the line count.
fn echo_lines(script: &str, env: &mut Environment) -> Result<Value, EvalError> {
    let sink = out_sink(env);
    for line in script.lines() {
        sink.println(line);
    }
    Ok(Value::Int(script.lines().count() as i64))
}

/// Evaluator emulating a script body of `print(testService.hello())`.
fn call_test_service(_script: &str, env: &mut Environment) -> Result<Value, EvalError> {
    let service = match env.get_variable("testService") {
        Ok(Value::Map(map)) => map.clone(),
        Ok(other) => return Err(EvalError::runtime(format!("not a service: {other:?}"))),
        Err(e) => return Err(EvalError::runtime(e.to_string())),
    };
    match service.get("hello") {
        Some(Value::Func(f)) => {
            let greeting = f.call(&[]).map_err(EvalError::runtime)?;
            out_sink(env).println(&greeting.to_string());
            Ok(Value::Nil)
        }
        other => Err(EvalError::runtime(format!("hello is not callable: {other:?}"))),
    }
}

fn quiet_console<E: Evaluator>(evaluator: E, input: &'static str) -> (Console<E>, ScriptSink) {
    let status = ScriptSink::new();
    let mut console = Console::with_io(evaluator, Cursor::new(input), status.clone());
    console.disable_colors();
    (console, status)
}

fn greeter_service() -> Store {
    let service = Store::new();
    service.put(
        "hello",
        Value::Func(NativeFn::new(|_| Ok(Value::Str("Hello script console!".into())))),
    );
    service
}

// ── Output capture and results ────────────────────────────────────────────────

#[test]
fn single_execution_captures_output_and_result() {
    let (mut console, status) = quiet_console(echo_lines, "hello\n;;\nexit\n");
    console.run().unwrap();
    assert_eq!(console.current_output(), "hello\n");
    assert_eq!(console.cumulative_output(), "hello\n");
    assert_eq!(console.last_result(), Some(&Value::Int(1)));
    let transcript = status.contents();
    assert!(transcript.contains("Script output:"));
    assert!(transcript.contains("Script returned:"));
}

#[test]
fn two_executions_accumulate_in_order() {
    let (mut console, _status) = quiet_console(echo_lines, "test\n;;\ntest2\n;;\nexit\n");
    console.run().unwrap();
    assert_eq!(console.cumulative_output().trim(), "test\ntest2");
    assert_eq!(console.current_output().trim(), "test2");
}

#[test]
fn current_output_is_empty_before_any_execution() {
    let (console, _status) = quiet_console(echo_lines, "exit\n");
    assert_eq!(console.current_output(), "");
    assert_eq!(console.cumulative_output(), "");
}

#[test]
fn partial_output_before_a_failure_is_kept() {
    let eval = |_script: &str, env: &mut Environment| {
        out_sink(env).println("this is printed");
        Err::<Value, _>(EvalError::runtime("boom"))
    };
    let (mut console, status) = quiet_console(eval, "x\n;;\nexit\n");
    console.run().unwrap();
    assert_eq!(console.cumulative_output().trim(), "this is printed");
    assert!(matches!(console.last_error(), Some(EvalError::Runtime { .. })));
    assert!(status.contents().contains("Exception while executing script:"));
}

// ── Scenarios against the binding model ───────────────────────────────────────

#[test]
fn service_binding_is_reachable_from_the_script() {
    let (mut console, _status) =
        quiet_console(call_test_service, "print(testService.hello())\n;;\nexit\n");
    console.set_variable("testService", Value::Map(greeter_service()));
    console.run().unwrap();
    assert_eq!(console.cumulative_output().trim(), "Hello script console!");
}

#[test]
fn unset_binding_reference_fails_without_output() {
    let (mut console, status) =
        quiet_console(call_test_service, "print(testService.hello())\n;;\nexit\n");
    console.run().unwrap();
    assert_eq!(console.cumulative_output(), "");
    assert!(matches!(console.last_error(), Some(EvalError::Runtime { .. })));
    assert!(status.contents().contains("undefined binding: testService"));
}

#[test]
fn parse_failure_is_reported_and_loop_continues() {
    let eval =
        |_script: &str, _env: &mut Environment| Err::<Value, _>(EvalError::parse("bad token"));
    let (mut console, status) = quiet_console(eval, "notascript?\n;;\nexit\n");
    console.run().unwrap();
    assert_eq!(console.cumulative_output(), "");
    assert!(matches!(console.last_error(), Some(EvalError::Parse { .. })));
    // The loop kept going: the farewell still happened.
    assert!(status.contents().contains("Bye!"));
}

#[test]
fn a_failed_execution_keeps_the_previous_result() {
    let runs = Rc::new(Cell::new(0u32));
    let counter = runs.clone();
    let eval = move |_script: &str, _env: &mut Environment| {
        counter.set(counter.get() + 1);
        if counter.get() == 1 {
            Ok(Value::Int(1))
        } else {
            Err(EvalError::runtime("boom"))
        }
    };
    let (mut console, _status) = quiet_console(eval, "a\n;;\nb\n;;\nexit\n");
    console.run().unwrap();
    assert_eq!(runs.get(), 2);
    assert_eq!(console.last_result(), Some(&Value::Int(1)));
    assert!(matches!(console.last_error(), Some(EvalError::Runtime { .. })));
}

// ── Store ─────────────────────────────────────────────────────────────────────

#[test]
fn store_persists_across_executions() {
    let second_run_saw = Rc::new(Cell::new(false));
    let saw = second_run_saw.clone();
    let runs = Cell::new(0u32);
    let eval = move |_script: &str, env: &mut Environment| {
        let store = match env.get_variable(STORE_NAME) {
            Ok(Value::Map(map)) => map.clone(),
            other => panic!("store binding missing: {other:?}"),
        };
        runs.set(runs.get() + 1);
        if runs.get() == 1 {
            store.put("stashed", 7i64);
        } else {
            saw.set(store.get("stashed") == Some(Value::Int(7)));
        }
        Ok::<_, EvalError>(Value::Nil)
    };
    let (mut console, _status) = quiet_console(eval, "a\n;;\nb\n;;\nexit\n");
    console.run().unwrap();
    assert!(second_run_saw.get());
    assert_eq!(console.store().get("stashed"), Some(Value::Int(7)));
}

// ── Terminator handling ───────────────────────────────────────────────────────

#[test]
fn exit_discards_the_pending_buffer() {
    let called = Rc::new(Cell::new(false));
    let flag = called.clone();
    let eval = move |_script: &str, _env: &mut Environment| {
        flag.set(true);
        Ok::<_, EvalError>(Value::Nil)
    };
    let (mut console, _status) = quiet_console(eval, "never executed\nexit\n");
    console.run().unwrap();
    assert!(!called.get());
    assert_eq!(console.cumulative_output(), "");
}

#[test]
fn a_token_with_trailing_spaces_is_just_a_script_line() {
    let called = Rc::new(Cell::new(false));
    let flag = called.clone();
    let eval = move |_script: &str, _env: &mut Environment| {
        flag.set(true);
        Ok::<_, EvalError>(Value::Nil)
    };
    let (mut console, _status) = quiet_console(eval, ";;  \nexit\n");
    console.run().unwrap();
    assert!(!called.get());
}

#[test]
fn custom_end_of_script_token_takes_effect() {
    let eval = |_script: &str, _env: &mut Environment| Ok::<_, EvalError>(Value::Int(123));
    let (mut console, _status) = quiet_console(eval, "return computeHello()\nEOS;\nexit\n");
    console.set_end_of_script("EOS;");
    console.run().unwrap();
    assert_eq!(console.last_result(), Some(&Value::Int(123)));
    assert_eq!(console.cumulative_output(), "");
}

#[test]
fn custom_exit_token_takes_effect() {
    let (mut console, status) = quiet_console(echo_lines, "test\n;;\nquit\n");
    console.set_exit_token("quit");
    console.run().unwrap();
    assert_eq!(console.cumulative_output().trim(), "test");
    assert!(status.contents().contains("exit - quit"));
}

#[test]
fn identical_tokens_always_execute() {
    let runs = Rc::new(Cell::new(0u32));
    let counter = runs.clone();
    let eval = move |_script: &str, _env: &mut Environment| {
        counter.set(counter.get() + 1);
        Ok::<_, EvalError>(Value::Nil)
    };
    let (mut console, _status) = quiet_console(eval, "done\n");
    console.set_end_of_script("done");
    console.set_exit_token("done");
    // End-of-script wins on every match, so the session can only end by EOF.
    assert!(matches!(console.run(), Err(ConsoleError::InputExhausted)));
    assert_eq!(runs.get(), 1);
}

// ── Lifecycle ─────────────────────────────────────────────────────────────────

#[test]
fn eof_before_exit_is_input_exhausted() {
    let (mut console, _status) = quiet_console(echo_lines, "dangling\n");
    assert!(matches!(console.run(), Err(ConsoleError::InputExhausted)));
}

#[test]
fn bindings_listing_is_a_startup_snapshot() {
    let eval = |_script: &str, env: &mut Environment| {
        env.set_variable("later", 1i64);
        Ok::<_, EvalError>(Value::Nil)
    };
    let (mut console, status) = quiet_console(eval, "x\n;;\nexit\n");
    console.set_variable("early", "here");
    console.run().unwrap();
    let transcript = status.contents();
    assert!(transcript.contains("early - string"));
    assert!(!transcript.contains("later -"));
    // The binding added mid-session is still live afterwards.
    assert!(console.has_variable("later"));
}
