//! Callmeter - call metrics for database drivers
//!
//! Wraps named operations (driver methods such as `Query`, `Exec`,
//! `Begin`) and emits a call counter and a latency histogram carrying the
//! same attributes: the operation name, its outcome and caller context.
//!
//! - [`recorder`] - the [`CallRecorder`] and its per-call [`Measurement`]
//! - [`extractor`] - pluggable attribute extraction from statements
//! - [`advice`] - wrappers measuring a closure or future
//! - [`instruments`] - OpenTelemetry counter/histogram wiring
//! - [`config`] - YAML and environment configuration

pub mod advice;
pub mod bootstrap;
pub mod config;
pub mod extractor;
pub mod instruments;
pub mod recorder;
pub mod semconv;

pub use config::{ConfigError, MetricsConfig};
pub use extractor::{
    AttributeExtractor, NamedValue, NoopExtractor, QueryCapture, StatementExtractor, Value,
};
pub use recorder::{
    CallCounter, CallRecorder, LatencyRecorder, Measurement, MethodRecorder, Outcome,
};
pub use semconv::Status;
