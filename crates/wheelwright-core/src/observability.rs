//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for WHEELWRIGHT_QUIET, WHEELWRIGHT_LOG_LEVEL
//! and WHEELWRIGHT_LOG_JSON. Logs go to stderr so child tool output and
//! `--json` stdout stay clean.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Initialize tracing. Call once at process startup; later calls are no-ops.
/// `debug` (the `--debug` flag) wins over the configured level.
pub fn init_tracing(debug: bool) {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level: String = if debug {
        "wheelwright=debug,wheelwright_core=debug,wheelwright_runner=debug".to_string()
    } else if cfg.quiet {
        "wheelwright=warn,wheelwright_core=warn,wheelwright_runner=warn".to_string()
    } else {
        expand_level(&cfg.log_level)
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_thread_ids(false),
            )
            .try_init()
    };
}

/// A bare level (`debug`) applies to all wheelwright crates; anything with a
/// `=` is taken as a full filter directive.
fn expand_level(level: &str) -> String {
    if level.contains('=') || level.contains(',') {
        level.to_string()
    } else {
        format!("wheelwright={level},wheelwright_core={level},wheelwright_runner={level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_level() {
        assert_eq!(
            expand_level("debug"),
            "wheelwright=debug,wheelwright_core=debug,wheelwright_runner=debug"
        );
        assert_eq!(expand_level("wheelwright=trace"), "wheelwright=trace");
    }
}
