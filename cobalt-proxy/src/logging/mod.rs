//! Logging setup.
//!
//! Installs a global `tracing` subscriber with an env-driven filter and local
//! timezone timestamps.

use chrono::Local;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::Writer, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::LogFormat;

/// Default log filter directive.
pub const DEFAULT_LOG_FILTER: &str = "cobalt_proxy=info,platforms_parser=info,tower_http=info";

/// Custom timer that uses the local timezone via chrono.
#[derive(Debug, Clone, Copy)]
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = Local::now();
        write!(w, "{}", now.format("%Y-%m-%dT%H:%M:%S%.3f%:z"))
    }
}

/// Filter from `RUST_LOG`, or [`DEFAULT_LOG_FILTER`] when unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Install the global subscriber.
///
/// Returns an error if a subscriber was already installed.
pub fn init_logging(format: LogFormat) -> crate::Result<()> {
    let fmt_layer = match format {
        LogFormat::Json => fmt::layer().json().with_timer(LocalTimer).boxed(),
        LogFormat::Pretty => fmt::layer().with_timer(LocalTimer).with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt_layer)
        .try_init()
        .map_err(|e| crate::Error::Other(format!("Failed to initialize logging: {e}")))
}
