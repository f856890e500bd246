//! Logging initialization.
//!
//! Controlled by two environment variables:
//! - `INSDB_LOG`: an `EnvFilter` directive (default `warn`), e.g.
//!   `INSDB_LOG=insdb=debug`
//! - `INSDB_LOG_FORMAT`: `json` for JSON events, anything else for the
//!   compact human format
//!
//! Everything goes to stderr so stdout stays clean for command output.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Filter directive environment variable.
pub const LOG_ENV: &str = "INSDB_LOG";
/// Output format environment variable.
pub const LOG_FORMAT_ENV: &str = "INSDB_LOG_FORMAT";

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. Call once, first thing in `main()`.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
