//! OpenTelemetry instrument wiring.
//!
//! Builds the call counter and latency histogram from a [`Meter`] and
//! hands them to a [`CallRecorder`]. Naming follows the OTel database
//! client conventions (dot-separated).

use opentelemetry::metrics::{Counter, Histogram, Meter, MeterProvider};
use opentelemetry::{global, InstrumentationScope};
use tracing::debug;

use crate::config::MetricsConfig;
use crate::recorder::CallRecorder;

/// Total instrumented calls, by operation and status.
pub fn calls_counter(meter: &Meter, name: &str) -> Counter<u64> {
    meter
        .u64_counter(name.to_string())
        .with_description("Number of database calls")
        .build()
}

/// Call latency in milliseconds, by operation and status.
pub fn latency_histogram(meter: &Meter, name: &str) -> Histogram<f64> {
    meter
        .f64_histogram(name.to_string())
        .with_description("Database call latency")
        .with_unit("ms")
        .build()
}

/// Build a recorder whose instruments come from `meter`.
pub fn recorder_from_meter(meter: &Meter, config: &MetricsConfig) -> CallRecorder {
    debug!(
        calls = %config.calls_metric,
        latency = %config.latency_metric,
        "Creating call recorder instruments"
    );

    CallRecorder::from_instruments(
        latency_histogram(meter, &config.latency_metric),
        calls_counter(meter, &config.calls_metric),
        config.base_attributes(),
    )
}

/// Build a recorder from the global meter provider.
///
/// Uses a no-op provider until the host installs one.
pub fn recorder_from_global(config: &MetricsConfig) -> CallRecorder {
    let scope = InstrumentationScope::builder(config.meter_name.clone())
        .with_version(env!("CARGO_PKG_VERSION"))
        .build();
    let meter = global::meter_provider().meter_with_scope(scope);
    recorder_from_meter(&meter, config)
}
