use tracing_subscriber::EnvFilter;

/// Install the process-wide tracing subscriber.
///
/// A stderr `fmt` layer gated by `RUST_LOG` (defaulting to `info`). Safe to
/// call once per process; a second call is a no-op rather than a panic,
/// since tests may initialize the subscriber more than once across a
/// binary.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
