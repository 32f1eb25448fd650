use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use tywrap_bridge::{builtins, serve, Config};
use tywrap_runtime::Dispatcher;

/// Stdout is reserved for protocol responses, so all logging goes to
/// stderr; `RUST_LOG` controls verbosity the usual way.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("tywrap-bridge: invalid configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let dispatcher = Dispatcher::new(builtins::default_registry(), config.codec.fallback_mode);

    match serve(io::stdin(), io::stdout(), io::stderr(), dispatcher, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tywrap-bridge: fatal I/O error: {e}");
            ExitCode::FAILURE
        }
    }
}
