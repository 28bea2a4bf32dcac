//! Logging setup

/// Initialize logging for conversion tracing.
///
/// Reads the filter from `RUST_LOG` (e.g. `RUST_LOG=hostbridge_core=trace`).
/// Without a call to this function no log output is produced.
/// Subsequent calls are no-ops.
pub fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        // Another subscriber may already be installed by the embedding host
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .without_time()
            .try_init();
    });
}
