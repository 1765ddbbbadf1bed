//! Recorder contract tests.
//!
//! Every finished measurement yields one count of 1 and one latency
//! observation with the same attributes, tagged with the operation and a
//! single status.

mod common;

use callmeter::semconv::{DB_OPERATION, DB_SQL_ERROR, DB_SQL_STATUS};
use callmeter::{MethodRecorder, Outcome};
use common::{sorted, value_of, Captured, Observation};
use opentelemetry::{Context, KeyValue};

#[test]
fn test_failed_query_example() {
    let captured = Captured::default();
    let recorder = captured.recorder(Vec::new());

    let measurement = recorder.record(
        &Context::new(),
        "Query",
        &[KeyValue::new("dbSystem", "postgres")],
    );
    let result: Result<(), String> = Err("connection reset".to_string());
    measurement.finish_result(&result, &[]);

    let mut expected = vec![
        ("dbSystem".to_string(), "postgres".to_string()),
        (DB_OPERATION.to_string(), "Query".to_string()),
        (DB_SQL_ERROR.to_string(), "connection reset".to_string()),
        (DB_SQL_STATUS.to_string(), "ERROR".to_string()),
    ];
    expected.sort();

    let counts = captured.counts();
    let latencies = captured.latencies();
    assert_eq!(counts.len(), 1);
    assert_eq!(latencies.len(), 1);
    assert_eq!(counts[0].0, 1);
    assert_eq!(sorted(&counts[0].1), expected);
    assert_eq!(sorted(&latencies[0].1), expected);
}

#[test]
fn test_every_label_present_on_success() {
    let labels_per_call: Vec<Vec<KeyValue>> = vec![
        Vec::new(),
        vec![KeyValue::new("a", "1")],
        vec![
            KeyValue::new("a", "1"),
            KeyValue::new("b", 2_i64),
            KeyValue::new("c", true),
        ],
    ];

    for (i, labels) in labels_per_call.iter().enumerate() {
        let captured = Captured::default();
        let recorder = captured.recorder(vec![KeyValue::new("db.system", "sqlite")]);
        let operation = format!("Op{i}");

        recorder
            .record(&Context::new(), &operation, labels)
            .finish(Outcome::Ok, &[]);

        let observations = captured.observations();
        assert_eq!(observations.len(), 2);
        assert!(matches!(observations[0], Observation::Count(1, _)));
        assert!(matches!(observations[1], Observation::Latency(v, _) if v >= 0.0));

        for observation in &observations {
            let attrs = observation.attributes();
            for label in labels {
                assert!(attrs.contains(label), "missing {label:?} in {attrs:?}");
            }
            assert_eq!(value_of(attrs, DB_OPERATION), Some(operation.clone()));
            assert_eq!(
                attrs
                    .iter()
                    .filter(|kv| kv.key.as_str() == DB_SQL_STATUS)
                    .count(),
                1
            );
        }
        assert_eq!(observations[0].attributes(), observations[1].attributes());
    }
}

#[test]
fn test_duplicate_keys_coexist_in_order() {
    let captured = Captured::default();
    let recorder = captured.recorder(vec![KeyValue::new("shard", "base")]);

    recorder
        .record(&Context::new(), "Exec", &[KeyValue::new("shard", "open")])
        .finish_ok(&[KeyValue::new("shard", "close")]);

    let shards: Vec<_> = captured.counts()[0]
        .1
        .iter()
        .filter(|kv| kv.key.as_str() == "shard")
        .map(|kv| kv.value.as_str().into_owned())
        .collect();
    assert_eq!(shards, vec!["base", "open", "close"]);
}

#[test]
fn test_latency_reflects_elapsed_time() {
    let captured = Captured::default();
    let recorder = captured.recorder(Vec::new());

    let measurement = recorder.record(&Context::new(), "Query", &[]);
    std::thread::sleep(std::time::Duration::from_millis(20));
    measurement.finish_ok(&[]);

    let (elapsed_ms, _) = &captured.latencies()[0];
    assert!(*elapsed_ms >= 20.0, "elapsed {elapsed_ms}ms");
}

#[test]
fn test_recorder_behind_trait_object() {
    let captured = Captured::default();
    let recorder: Box<dyn MethodRecorder> = Box::new(captured.recorder(Vec::new()));

    recorder
        .record(&Context::new(), "Rollback", &[])
        .finish_err(&"tx aborted", &[]);

    let counts = captured.counts();
    assert_eq!(value_of(&counts[0].1, DB_SQL_ERROR).as_deref(), Some("tx aborted"));
}
