//! Tracing subscriber setup
//!
//! Shared tracing configuration used by the binary and by tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber writing to `log_file_path`.
///
/// Filtering follows `RUST_LOG`, defaulting to INFO. Returns false if the
/// log file could not be created or a subscriber was already installed.
pub fn init_global(log_file_path: &Path) -> bool {
    let Ok(log_file) = File::create(log_file_path) else {
        return false;
    };
    build_subscriber(Arc::new(log_file)).try_init().is_ok()
}

/// Initialize the global tracing subscriber writing to stderr.
pub fn init_stderr() -> bool {
    build_subscriber(std::io::stderr).try_init().is_ok()
}

/// Build a subscriber with environment filtering and the given writer.
///
/// This is the core subscriber configuration shared between production and tests.
pub fn build_subscriber<W>(writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer().with_writer(writer).with_ansi(false);

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
