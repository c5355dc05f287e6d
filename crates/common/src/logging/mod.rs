//! Logging subsystem: stdout, optional rolling files and optional OTLP export.

mod manager;
mod types;


pub use manager::{finalize, init, LoggingInitError};
pub use tracing_appender::rolling::Rotation;
pub use types::{FileLoggingConfig, LoggerConfig, OtlpExportConfig, ResourceConfig, StdoutConfig};

/// Formats a service name with an optional label suffix, e.g. `avs-operator%holesky`.
pub fn format_service_name(base: &str, label: Option<&str>) -> String {
    match label {
        Some(label) if !label.is_empty() => format!("{base}%{label}"),
        _ => base.to_owned(),
    }
}
