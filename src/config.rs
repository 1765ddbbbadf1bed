//! Configuration for call metrics.
//!
//! Supports YAML file and environment variable overrides.

use std::collections::BTreeMap;
use std::path::Path;

use opentelemetry::KeyValue;
use serde::Deserialize;

use crate::extractor::{AttributeExtractor, QueryCapture};
use crate::semconv;

/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "CALLMETER_CONFIG";
/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "callmeter.yaml";
/// Environment variable overriding `system`.
pub const DB_SYSTEM_ENV_VAR: &str = "CALLMETER_DB_SYSTEM";
/// Environment variable overriding `database_name`.
pub const DB_NAME_ENV_VAR: &str = "CALLMETER_DB_NAME";
/// Environment variable overriding `instance_name`.
pub const DB_INSTANCE_ENV_VAR: &str = "CALLMETER_DB_INSTANCE";
/// Environment variable overriding `query`.
pub const QUERY_CAPTURE_ENV_VAR: &str = "CALLMETER_QUERY_CAPTURE";

/// Default name of the call counter.
pub const DEFAULT_CALLS_METRIC: &str = "db.sql.client.calls";
/// Default name of the latency histogram.
pub const DEFAULT_LATENCY_METRIC: &str = "db.sql.client.latency";
/// Default instrumentation scope.
pub const DEFAULT_METER_NAME: &str = "callmeter";

/// Metrics configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Instrumentation scope name used to obtain the meter.
    pub meter_name: String,
    /// Call counter name.
    pub calls_metric: String,
    /// Latency histogram name (milliseconds).
    pub latency_metric: String,
    /// Database system, emitted as `db.system`.
    pub system: Option<String>,
    /// Database name, emitted as `db.name`.
    pub database_name: Option<String>,
    /// Instance name, emitted as `db.instance`.
    pub instance_name: Option<String>,
    /// Extra attributes attached to every observation.
    pub attributes: BTreeMap<String, String>,
    /// Statement capture level.
    pub query: QueryCapture,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            meter_name: DEFAULT_METER_NAME.to_string(),
            calls_metric: DEFAULT_CALLS_METRIC.to_string(),
            latency_metric: DEFAULT_LATENCY_METRIC.to_string(),
            system: None,
            database_name: None,
            instance_name: None,
            attributes: BTreeMap::new(),
            query: QueryCapture::None,
        }
    }
}

impl MetricsConfig {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var(CONFIG_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;

        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(system) = std::env::var(DB_SYSTEM_ENV_VAR) {
            self.system = Some(system);
        }

        if let Ok(name) = std::env::var(DB_NAME_ENV_VAR) {
            self.database_name = Some(name);
        }

        if let Ok(instance) = std::env::var(DB_INSTANCE_ENV_VAR) {
            self.instance_name = Some(instance);
        }

        if let Ok(capture) = std::env::var(QUERY_CAPTURE_ENV_VAR) {
            self.query = QueryCapture::parse(&capture).ok_or_else(|| {
                ConfigError::InvalidEnv(QUERY_CAPTURE_ENV_VAR.to_string(), capture.clone())
            })?;
        }

        Ok(())
    }

    /// Attributes attached to every observation.
    ///
    /// `db.system`, `db.name` and `db.instance` come first when set, then the
    /// configured attributes in key order.
    pub fn base_attributes(&self) -> Vec<KeyValue> {
        let mut attrs = Vec::with_capacity(3 + self.attributes.len());

        if let Some(system) = &self.system {
            attrs.push(semconv::system_attr(system));
        }
        if let Some(name) = &self.database_name {
            attrs.push(semconv::database_name_attr(name));
        }
        if let Some(instance) = &self.instance_name {
            attrs.push(semconv::instance_attr(instance));
        }

        attrs.extend(
            self.attributes
                .iter()
                .map(|(k, v)| KeyValue::new(k.clone(), v.clone())),
        );
        attrs
    }

    /// Extractor for the configured capture level.
    pub fn extractor(&self) -> Box<dyn AttributeExtractor> {
        self.query.extractor()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {0}: '{1}'")]
    InvalidEnv(String, String),
}
