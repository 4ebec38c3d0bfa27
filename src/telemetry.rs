//! Telemetry installation.
//!
//! Installs a global tracing subscriber and registers metric descriptions.
//! Library consumers that already own a subscriber can skip [`init`]
//! entirely; the engine only ever emits events and metrics, it never
//! requires them to be collected.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_gauge, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::error::TelemetryError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Output format for the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

/// Install a global tracing subscriber with the given default directive
/// (e.g. `"info"` or `"trama=debug"`), honoring `RUST_LOG` overrides.
pub fn init(default_directive: &str, format: LogFormat) -> Result<(), TelemetryError> {
    describe_metrics();

    let directive: tracing_subscriber::filter::Directive =
        default_directive.parse().map_err(|_| TelemetryError::Directive {
            directive: default_directive.to_string(),
        })?;
    let env_filter = EnvFilter::builder()
        .with_default_directive(directive)
        .from_env_lossy();

    let fmt_layer = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| TelemetryError::Install {
            message: err.to_string(),
        })
}

/// Register metric descriptions once per process.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "trama_store_hit_total",
            Unit::Count,
            "Total number of record store hits."
        );
        describe_counter!(
            "trama_store_miss_total",
            Unit::Count,
            "Total number of record store misses."
        );
        describe_counter!(
            "trama_store_evict_total",
            Unit::Count,
            "Total number of records evicted due to capacity."
        );
        describe_counter!(
            "trama_fetch_total",
            Unit::Count,
            "Total number of fetch requests reaching a terminal outcome."
        );
        describe_histogram!(
            "trama_fetch_ms",
            Unit::Milliseconds,
            "Fetch request latency in milliseconds."
        );
        describe_gauge!(
            "trama_change_log_len",
            Unit::Count,
            "Current number of retained change events."
        );
        describe_counter!(
            "trama_change_dropped_total",
            Unit::Count,
            "Total number of change events dropped due to log overflow."
        );
    });
}
