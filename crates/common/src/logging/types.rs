//! Configuration types for the logging subsystem.

use std::{path::PathBuf, time::Duration};

use opentelemetry::KeyValue;
use opentelemetry_sdk::Resource;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt::format::FmtSpan;

/// Stdout layer settings.
#[derive(Debug, Clone)]
pub struct StdoutConfig {
    /// Emit JSON lines instead of the compact human format.
    pub json_format: bool,
    /// Span lifecycle events to log.
    pub fmt_span: FmtSpan,
}

impl Default for StdoutConfig {
    fn default() -> Self {
        Self {
            json_format: false,
            fmt_span: FmtSpan::CLOSE,
        }
    }
}

/// Rolling file output.
#[derive(Debug, Clone)]
pub struct FileLoggingConfig {
    pub directory: PathBuf,
    /// File name prefix, `avs-operator` yields `avs-operator.2026-10-14` with daily rotation.
    pub file_name_prefix: String,
    pub rotation: Rotation,
    pub json_format: bool,
}

impl FileLoggingConfig {
    pub fn new(directory: PathBuf, file_name_prefix: impl Into<String>) -> Self {
        Self {
            directory,
            file_name_prefix: file_name_prefix.into(),
            rotation: Rotation::DAILY,
            json_format: false,
        }
    }

    pub fn with_json_format(mut self, json_format: bool) -> Self {
        self.json_format = json_format;
        self
    }
}

/// OTLP exporter request settings.
#[derive(Debug, Clone)]
pub struct OtlpExportConfig {
    pub timeout: Duration,
}

impl Default for OtlpExportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

/// OpenTelemetry resource attributes describing this process.
#[derive(Debug, Clone)]
pub struct ResourceConfig {
    pub service_name: String,
    pub service_version: Option<String>,
    /// Deployment environment, e.g. "mainnet", "holesky", "devnet".
    pub deployment_environment: Option<String>,
    /// Unique id of this operator instance, usually its chain address.
    pub service_instance_id: Option<String>,
    pub custom_attributes: Vec<KeyValue>,
}

impl ResourceConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: None,
            deployment_environment: None,
            service_instance_id: None,
            custom_attributes: Vec::new(),
        }
    }

    /// Builds the OpenTelemetry [`Resource`] following the semantic conventions.
    pub fn build_resource(&self) -> Resource {
        let mut attributes = vec![KeyValue::new("service.name", self.service_name.clone())];

        if let Some(version) = &self.service_version {
            attributes.push(KeyValue::new("service.version", version.clone()));
        }
        if let Some(env) = &self.deployment_environment {
            attributes.push(KeyValue::new("deployment.environment", env.clone()));
        }
        if let Some(instance_id) = &self.service_instance_id {
            attributes.push(KeyValue::new("service.instance.id", instance_id.clone()));
        }
        attributes.extend(self.custom_attributes.iter().cloned());

        Resource::new(attributes)
    }
}

/// Top-level logger configuration consumed by [`super::init`].
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub resource: ResourceConfig,
    /// OTLP collector endpoint; no OTLP layer is installed when unset.
    pub otel_url: Option<String>,
    pub stdout_config: StdoutConfig,
    pub file_logging_config: Option<FileLoggingConfig>,
    pub otlp_export_config: OtlpExportConfig,
}

impl LoggerConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            resource: ResourceConfig::new(service_name),
            otel_url: None,
            stdout_config: StdoutConfig::default(),
            file_logging_config: None,
            otlp_export_config: OtlpExportConfig::default(),
        }
    }

    pub fn set_otlp_url(&mut self, url: String) {
        self.otel_url = Some(url);
    }

    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.resource.service_version = Some(version.into());
        self
    }

    pub fn with_deployment_environment(mut self, env: impl Into<String>) -> Self {
        self.resource.deployment_environment = Some(env.into());
        self
    }

    pub fn with_service_instance_id(mut self, instance_id: impl Into<String>) -> Self {
        self.resource.service_instance_id = Some(instance_id.into());
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.stdout_config.json_format = enabled;
        self
    }

    pub fn with_file_logging(mut self, config: FileLoggingConfig) -> Self {
        self.file_logging_config = Some(config);
        self
    }

    pub fn with_otlp_export_config(mut self, config: OtlpExportConfig) -> Self {
        self.otlp_export_config = config;
        self
    }

    pub fn add_resource_attribute(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.resource
            .custom_attributes
            .push(KeyValue::new(key, value.into()));
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::new("(avs-operator)")
    }
}
