//! Tracing setup, trimmed from the teacher's `logging::config`/`logging::mod`
//! down to what a library (not a long-running server) needs: an env filter
//! plus a console layer. The teacher's file-rotation sink and slow-query
//! layer are command/query-engine concerns this crate has no counterpart
//! for (see DESIGN.md) and are dropped rather than carried dead.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a process-wide `tracing` subscriber: an `EnvFilter` (respecting
/// `RUST_LOG`, defaulting to `info`) over a plain console layer.
///
/// Safe to call more than once; later calls are no-ops once a global
/// subscriber is installed.
pub fn init_logging() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_does_not_panic_when_called_twice() {
        init_logging();
        init_logging();
    }
}
