//! Tracing subscriber setup (§1 ambient stack: `tracing` + `tracing-subscriber`
//! as the workflow engine crate itself uses them) plus `tracing-error`'s
//! span-trace capture on fatal startup paths (§1 "for the richer
//! human-facing errors at service boundaries").

use tracing_error::{ErrorLayer, SpanTrace};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

/// Installs the global subscriber for a service binary: an env-filtered
/// `fmt` layer plus [`ErrorLayer`], which tracks the active span stack so
/// [`fatal`] can attach a [`SpanTrace`] to the log line that kills the
/// process.
pub fn init(debug: bool) {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    Registry::default()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(ErrorLayer::default())
        .init();
}

/// Logs `message` with the triggering error and the captured span trace,
/// then exits the process with `code` (§6 Exit codes). Every unrecoverable
/// startup failure in the service binaries goes through this so the log
/// line shows which initialization step was on the stack when it failed.
pub fn fatal(message: &str, err: &dyn std::fmt::Display, code: i32) -> ! {
    let trace = SpanTrace::capture();
    tracing::error!(%err, %trace, "{message}");
    std::process::exit(code);
}
