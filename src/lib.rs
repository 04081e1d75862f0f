pub mod ast;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod repl;
pub mod scanner;
pub mod source;
pub mod stdlib;

use std::sync::Once;

// Re-export error types for convenience
pub use error::{CompileError, ErrorCategory, ErrorKind, ReturnCode, RuntimeError};

static TRACING_INIT: Once = Once::new();

/// Install the tracing subscriber. Does nothing unless `RUST_LOG` is set,
/// e.g. `RUST_LOG=giosue=debug` or `RUST_LOG=giosue::scanner=trace`.
///
/// Safe to call more than once. Logs go to stderr so they never mix with
/// program output.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{EnvFilter, fmt, prelude::*};

        if std::env::var("RUST_LOG").is_ok() {
            tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_target(true),
                )
                .with(EnvFilter::from_default_env())
                .init();
        }
    });
}
