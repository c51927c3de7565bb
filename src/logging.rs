//! Process-wide `tracing` subscriber for the `interview` binary.
//!
//! Library code only emits through the `tracing` macros; installing a
//! subscriber is the host's job.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "warn";

/// Filter directive: explicit value, then `RUST_LOG`, then [`DEFAULT_FILTER`].
pub fn filter_directive(explicit: Option<&str>) -> String {
    let non_blank = |value: String| {
        let value = value.trim().to_string();
        (!value.is_empty()).then_some(value)
    };

    explicit
        .map(str::to_string)
        .and_then(non_blank)
        .or_else(|| std::env::var("RUST_LOG").ok().and_then(non_blank))
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Installs a stderr fmt subscriber. Safe to call more than once; later
/// calls are ignored.
pub fn init(explicit: Option<&str>) {
    let filter = EnvFilter::try_new(filter_directive(explicit))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
