use tracing_subscriber::{EnvFilter, fmt::time::*};

/// Log to the console. Override the filter with `RUST_LOG`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug,tower_http_view_cache=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::rfc_3339())
        .init();
}
