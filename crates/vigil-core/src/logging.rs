//! Logging and tracing setup.
//!
//! Events go to stderr so that report output on stdout stays clean.
//! Filtering follows `RUST_LOG`, falling back to the given default.

use std::sync::Once;

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

static INIT: Once = Once::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Initialize the global tracing subscriber.
///
/// Subsequent calls are ignored, as is a subscriber installed elsewhere.
pub fn init_tracing(format: LogFormat, default_filter: &str) {
    INIT.call_once(|| {
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_filter));

        let registry = tracing_subscriber::registry().with(env_filter);

        let result = match format {
            LogFormat::Text => registry
                .with(
                    fmt::layer()
                        .with_writer(std::io::stderr)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_target(true),
                )
                .try_init(),
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_span_events(FmtSpan::CLOSE)
                        .with_target(true)
                        .with_current_span(true),
                )
                .try_init(),
        };

        if result.is_ok() {
            tracing::debug!(?format, "tracing initialized");
        }
    });
}
