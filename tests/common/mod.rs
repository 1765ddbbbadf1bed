//! Shared utilities for integration tests.
//!
//! Provides an in-memory sink pair that captures every observation.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use callmeter::{CallCounter, CallRecorder, LatencyRecorder};
use opentelemetry::{Context, KeyValue};

/// One observation as seen by a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    Count(u64, Vec<KeyValue>),
    Latency(f64, Vec<KeyValue>),
}

impl Observation {
    pub fn attributes(&self) -> &[KeyValue] {
        match self {
            Observation::Count(_, attrs) | Observation::Latency(_, attrs) => attrs,
        }
    }
}

/// Shared observation log written by both sinks.
#[derive(Debug, Clone, Default)]
pub struct Captured {
    log: Arc<Mutex<Vec<Observation>>>,
}

impl Captured {
    /// Build a recorder whose sinks append to this log.
    pub fn recorder(&self, base: Vec<KeyValue>) -> CallRecorder {
        let counts = Arc::clone(&self.log);
        let count_calls: CallCounter =
            Arc::new(move |_: &Context, value: u64, attrs: &[KeyValue]| {
                counts
                    .lock()
                    .unwrap()
                    .push(Observation::Count(value, attrs.to_vec()));
            });

        let latencies = Arc::clone(&self.log);
        let record_latency: LatencyRecorder =
            Arc::new(move |_: &Context, value: f64, attrs: &[KeyValue]| {
                latencies
                    .lock()
                    .unwrap()
                    .push(Observation::Latency(value, attrs.to_vec()));
            });

        CallRecorder::new(record_latency, count_calls, base)
    }

    pub fn observations(&self) -> Vec<Observation> {
        self.log.lock().unwrap().clone()
    }

    pub fn counts(&self) -> Vec<(u64, Vec<KeyValue>)> {
        self.observations()
            .into_iter()
            .filter_map(|o| match o {
                Observation::Count(n, attrs) => Some((n, attrs)),
                Observation::Latency(..) => None,
            })
            .collect()
    }

    pub fn latencies(&self) -> Vec<(f64, Vec<KeyValue>)> {
        self.observations()
            .into_iter()
            .filter_map(|o| match o {
                Observation::Latency(v, attrs) => Some((v, attrs)),
                Observation::Count(..) => None,
            })
            .collect()
    }
}

/// Value of the first attribute with `key`, as a string.
pub fn value_of(attrs: &[KeyValue], key: &str) -> Option<String> {
    attrs
        .iter()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.as_str().into_owned())
}

/// Attributes as sorted `(key, value)` strings, for order-insensitive comparison.
pub fn sorted(attrs: &[KeyValue]) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = attrs
        .iter()
        .map(|kv| (kv.key.as_str().to_string(), kv.value.as_str().into_owned()))
        .collect();
    pairs.sort();
    pairs
}
