use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "warn,nexus=info";

/// Logs go to stderr so stdout stays clean for the chat transcript.
/// Filtering follows `RUST_LOG` when set.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
