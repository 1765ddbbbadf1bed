//! Call recording: one counter increment and one latency observation per call.
//!
//! A [`CallRecorder`] is built once and shared. Each call to
//! [`MethodRecorder::record`] starts the clock and returns a [`Measurement`]
//! owning all per-call state. Finishing the measurement emits both metrics
//! with the same attribute set.
//!
//! ```ignore
//! let recorder = CallRecorder::from_instruments(latency, calls, vec![system_attr("postgresql")]);
//!
//! let measurement = recorder.record(&cx, "Query", &[]);
//! let result = conn.query(sql, args);
//! measurement.finish_result(&result, &[]);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use opentelemetry::metrics::{Counter, Histogram};
use opentelemetry::{Context, KeyValue};
use tracing::{debug, trace};

use crate::semconv::{self, Status};

/// Number of attributes the recorder itself appends (operation, status, error).
const RESERVED_ATTRIBUTES: usize = 3;

/// Adds a value to the call counter's sum.
pub type CallCounter = Arc<dyn Fn(&Context, u64, &[KeyValue]) + Send + Sync>;

/// Records one latency observation, in milliseconds.
pub type LatencyRecorder = Arc<dyn Fn(&Context, f64, &[KeyValue]) + Send + Sync>;

/// Opens measurements for named operations.
///
/// Implementations must be safe to call from many threads at once.
pub trait MethodRecorder: Send + Sync {
    /// Start measuring `operation`. `labels` are known before the call runs.
    fn record(&self, cx: &Context, operation: &str, labels: &[KeyValue]) -> Measurement;
}

/// Outcome of an instrumented call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Failed, with the error text captured verbatim.
    Error(String),
}

impl Outcome {
    /// Build an outcome from an optional error.
    pub fn from_error(err: Option<&dyn fmt::Display>) -> Self {
        match err {
            None => Outcome::Ok,
            Some(e) => Outcome::Error(e.to_string()),
        }
    }

    pub fn status(&self) -> Status {
        match self {
            Outcome::Ok => Status::Ok,
            Outcome::Error(_) => Status::Error,
        }
    }
}

impl<T, E: fmt::Display> From<&Result<T, E>> for Outcome {
    fn from(result: &Result<T, E>) -> Self {
        match result {
            Ok(_) => Outcome::Ok,
            Err(e) => Outcome::Error(e.to_string()),
        }
    }
}

/// Records call counts and latencies for database operations.
///
/// Cloning is cheap; all clones share the same sinks and base attributes.
#[derive(Clone)]
pub struct CallRecorder {
    record_latency: LatencyRecorder,
    count_calls: CallCounter,
    attributes: Arc<[KeyValue]>,
}

impl CallRecorder {
    /// Create a recorder from two sinks and a base attribute set.
    pub fn new(
        latency_recorder: LatencyRecorder,
        calls_counter: CallCounter,
        attributes: Vec<KeyValue>,
    ) -> Self {
        Self {
            record_latency: latency_recorder,
            count_calls: calls_counter,
            attributes: attributes.into(),
        }
    }

    /// Create a recorder backed by OpenTelemetry instruments.
    ///
    /// The context given to [`MethodRecorder::record`] is attached while the
    /// instruments are called, so exemplars pick up its span.
    pub fn from_instruments(
        latency: Histogram<f64>,
        calls: Counter<u64>,
        attributes: Vec<KeyValue>,
    ) -> Self {
        let record_latency: LatencyRecorder =
            Arc::new(move |cx: &Context, value: f64, attrs: &[KeyValue]| {
                let _guard = cx.clone().attach();
                latency.record(value, attrs);
            });
        let count_calls: CallCounter =
            Arc::new(move |cx: &Context, value: u64, attrs: &[KeyValue]| {
                let _guard = cx.clone().attach();
                calls.add(value, attrs);
            });
        Self::new(record_latency, count_calls, attributes)
    }

    /// A recorder that discards every observation.
    pub fn noop() -> Self {
        Self::new(
            Arc::new(|_: &Context, _: f64, _: &[KeyValue]| {}),
            Arc::new(|_: &Context, _: u64, _: &[KeyValue]| {}),
            Vec::new(),
        )
    }

    /// Base attributes attached to every observation.
    pub fn attributes(&self) -> &[KeyValue] {
        &self.attributes
    }
}

impl fmt::Debug for CallRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallRecorder")
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

impl MethodRecorder for CallRecorder {
    fn record(&self, cx: &Context, operation: &str, labels: &[KeyValue]) -> Measurement {
        let start = Instant::now();

        let mut attrs =
            Vec::with_capacity(self.attributes.len() + labels.len() + RESERVED_ATTRIBUTES);
        attrs.extend_from_slice(&self.attributes);
        attrs.extend_from_slice(labels);
        attrs.push(semconv::operation_attr(operation));

        Measurement {
            cx: cx.clone(),
            start,
            attrs,
            record_latency: Arc::clone(&self.record_latency),
            count_calls: Arc::clone(&self.count_calls),
        }
    }
}

/// An open measurement of one call.
///
/// Finishing consumes the measurement, so it can only be closed once.
/// Dropping it unfinished records nothing.
#[must_use = "a measurement records nothing until it is finished"]
pub struct Measurement {
    cx: Context,
    start: Instant,
    attrs: Vec<KeyValue>,
    record_latency: LatencyRecorder,
    count_calls: CallCounter,
}

impl Measurement {
    /// Close the measurement and emit the call count and latency.
    ///
    /// `extra` holds attributes discovered while the call ran. They are
    /// appended before the status attributes.
    pub fn finish(mut self, outcome: Outcome, extra: &[KeyValue]) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        self.attrs.extend_from_slice(extra);
        self.attrs.push(outcome.status().into());
        if let Outcome::Error(message) = outcome {
            debug!(error = %message, elapsed_ms, "instrumented call failed");
            self.attrs.push(semconv::error_attr(message));
        }

        (self.count_calls)(&self.cx, 1, &self.attrs);
        (self.record_latency)(&self.cx, elapsed_ms, &self.attrs);

        trace!(attributes = self.attrs.len(), elapsed_ms, "call recorded");
    }

    /// Close as successful.
    pub fn finish_ok(self, extra: &[KeyValue]) {
        self.finish(Outcome::Ok, extra);
    }

    /// Close as failed with `err`.
    pub fn finish_err(self, err: &dyn fmt::Display, extra: &[KeyValue]) {
        self.finish(Outcome::Error(err.to_string()), extra);
    }

    /// Close with the outcome of `result`.
    pub fn finish_result<T, E: fmt::Display>(self, result: &Result<T, E>, extra: &[KeyValue]) {
        self.finish(Outcome::from(result), extra);
    }

    /// Attributes collected so far.
    pub fn attributes(&self) -> &[KeyValue] {
        &self.attrs
    }
}

impl fmt::Debug for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Measurement")
            .field("start", &self.start)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}
