//! Attribute keys and status vocabulary.
//!
//! Key names follow the OpenTelemetry database semantic conventions.
//! The recorder reserves `db.operation`, `db.sql.status` and `db.sql.error`;
//! caller-supplied labels should avoid them if downstream aggregation
//! expects unique keys.

use std::fmt;

use opentelemetry::{Key, KeyValue};

/// Operation (driver method) name.
pub const DB_OPERATION: &str = "db.operation";
/// Outcome of the call, see [`Status`].
pub const DB_SQL_STATUS: &str = "db.sql.status";
/// Error text, present only when the status is `ERROR`.
pub const DB_SQL_ERROR: &str = "db.sql.error";

/// Database management system identifier (e.g. `postgresql`).
pub const DB_SYSTEM: &str = "db.system";
/// Database (schema) name.
pub const DB_NAME: &str = "db.name";
/// Instance name, for telling apart several pools to the same system.
pub const DB_INSTANCE: &str = "db.instance";
/// Statement text.
pub const DB_STATEMENT: &str = "db.statement";
/// Prefix for captured statement arguments.
pub const DB_SQL_ARGS_PREFIX: &str = "db.sql.args.";

/// Outcome status of an instrumented call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    Ok,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Status> for KeyValue {
    fn from(status: Status) -> Self {
        KeyValue::new(Key::from_static_str(DB_SQL_STATUS), status.as_str())
    }
}

/// Create an operation label.
pub fn operation_attr(operation: &str) -> KeyValue {
    KeyValue::new(DB_OPERATION, operation.to_string())
}

/// Create an error label carrying the full error text.
pub fn error_attr(message: impl Into<String>) -> KeyValue {
    KeyValue::new(DB_SQL_ERROR, message.into())
}

/// Create a `db.system` label.
pub fn system_attr(system: &str) -> KeyValue {
    KeyValue::new(DB_SYSTEM, system.to_string())
}

/// Create a `db.name` label.
pub fn database_name_attr(name: &str) -> KeyValue {
    KeyValue::new(DB_NAME, name.to_string())
}

/// Create a `db.instance` label.
pub fn instance_attr(instance: &str) -> KeyValue {
    KeyValue::new(DB_INSTANCE, instance.to_string())
}

/// Create a `db.statement` label.
pub fn statement_attr(statement: &str) -> KeyValue {
    KeyValue::new(DB_STATEMENT, statement.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(Status::Ok.as_str(), "OK");
        assert_eq!(Status::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_status_into_key_value() {
        let kv: KeyValue = Status::Error.into();
        assert_eq!(kv.key.as_str(), DB_SQL_STATUS);
        assert_eq!(kv.value.as_str(), "ERROR");
    }

    #[test]
    fn test_operation_attr() {
        let kv = operation_attr("Query");
        assert_eq!(kv.key.as_str(), "db.operation");
        assert_eq!(kv.value.as_str(), "Query");
    }
}
