pub mod build_info;

/// Events from every engine crate at info level.
pub const DEFAULT_LOG_FILTER: &str = "recur_engine=info,recur_core=info,recur_storage_json=info";

/// Installs the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `directives` when set. Invalid directives fall back to
/// [`DEFAULT_LOG_FILTER`].
pub fn init_tracing(directives: &str) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if let Err(err) = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
    {
        // Another global subscriber is installed; report through it.
        tracing::warn!(error = %err, "tracing subscriber already installed, keeping it");
    }
}
