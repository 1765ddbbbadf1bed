//! Wrappers that measure a call around the work itself.
//!
//! Core driver code stays free of metrics; the host wraps each call:
//!
//! ```ignore
//! let rows = instrument_query(&recorder, &extractor, &cx, "Query", sql, &args, || {
//!     conn.query(sql, &args)
//! })?;
//! ```
//!
//! Results pass through untouched.

use std::fmt::Display;
use std::future::Future;

use opentelemetry::{Context, KeyValue};

use crate::extractor::{AttributeExtractor, NamedValue};
use crate::recorder::MethodRecorder;

/// Measure a synchronous call.
pub fn instrument<R, T, E, F>(
    recorder: &R,
    cx: &Context,
    operation: &str,
    labels: &[KeyValue],
    f: F,
) -> Result<T, E>
where
    R: MethodRecorder + ?Sized,
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let measurement = recorder.record(cx, operation, labels);
    let result = f();
    measurement.finish_result(&result, &[]);
    result
}

/// Measure an asynchronous call. The clock starts before the future is polled.
pub async fn instrument_async<R, T, E, Fut>(
    recorder: &R,
    cx: &Context,
    operation: &str,
    labels: &[KeyValue],
    fut: Fut,
) -> Result<T, E>
where
    R: MethodRecorder + ?Sized,
    E: Display,
    Fut: Future<Output = Result<T, E>>,
{
    let measurement = recorder.record(cx, operation, labels);
    let result = fut.await;
    measurement.finish_result(&result, &[]);
    result
}

/// Measure a statement execution, labelling it with the extractor's output.
pub fn instrument_query<R, X, T, E, F>(
    recorder: &R,
    extractor: &X,
    cx: &Context,
    operation: &str,
    query: &str,
    args: &[NamedValue],
    f: F,
) -> Result<T, E>
where
    R: MethodRecorder + ?Sized,
    X: AttributeExtractor + ?Sized,
    E: Display,
    F: FnOnce() -> Result<T, E>,
{
    let labels = extractor.extract(cx, query, args);
    instrument(recorder, cx, operation, &labels, f)
}
