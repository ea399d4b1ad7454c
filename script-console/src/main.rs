use std::process;

use script_console::{Console, LuaEvaluator, NativeFn, Store, Value};

/// Parsed command-line options.
#[derive(Debug, Default)]
struct Args {
    end_of_script: Option<String>,
    exit_token: Option<String>,
    no_color: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut parsed = Args::default();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-e" => {
                parsed.end_of_script =
                    Some(args.next().ok_or("-e requires a token argument")?);
            }
            "-x" => {
                parsed.exit_token = Some(args.next().ok_or("-x requires a token argument")?);
            }
            "--no-color" => parsed.no_color = true,
            other => return Err(format!("unknown argument `{other}`")),
        }
    }
    Ok(parsed)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("script-console: {e}");
            eprintln!("Usage: script-console [-e <end-of-script-token>] [-x <exit-token>] [--no-color]");
            process::exit(2);
        }
    };

    let mut console = Console::new(LuaEvaluator::new());
    if let Some(token) = args.end_of_script {
        console.set_end_of_script(token);
    }
    if let Some(token) = args.exit_token {
        console.set_exit_token(token);
    }
    if args.no_color {
        console.disable_colors();
    }

    // A sample service binding, so there is something to poke at:
    //   print(greeter.hello())
    let greeter = Store::new();
    greeter.put(
        "hello",
        Value::Func(NativeFn::new(|_| Ok(Value::Str("Hello script console!".into())))),
    );
    console.set_variable("greeter", Value::Map(greeter));

    if let Err(e) = console.run() {
        eprintln!("script-console: {e}");
        process::exit(1);
    }
}
