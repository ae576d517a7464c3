//! Tracing setup for the `aura` binary.
//!
//! Logs go to a daily-rolling file so they never interleave with the REPL.
//! `AURA_LOG` takes an `EnvFilter` directive (default `warn`).

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_ENV_VAR: &str = "AURA_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Installs the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be kept alive
/// for the lifetime of the process.
pub fn init(logs_dir: &Path, verbose: bool) -> WorkerGuard {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { DEFAULT_DIRECTIVE }));

    let file_appender = tracing_appender::rolling::daily(logs_dir, "aura.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = verbose.then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .with(stderr_layer)
        .init();

    guard
}
