//! Logging initialization and shutdown.

use std::sync::OnceLock;

use opentelemetry::{
    global::{self, set_text_map_propagator},
    trace::{TraceError, TracerProvider},
};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    propagation::TraceContextPropagator,
    runtime::Tokio,
    trace::{Config, TracerProvider as SdkTracerProvider},
};
use thiserror::Error;
use tracing::{debug, error, info, Level};
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::{
    filter::{Directive, EnvFilter, ParseError},
    fmt::layer,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    Layer,
};

use super::types::LoggerConfig;

/// Transport crates that are chatty at INFO about every websocket frame.
const QUIET_DIRECTIVES: &[&str] = &["alloy_transport_ws=warn", "alloy_pubsub=warn"];

/// Kept around so [`finalize`] can flush pending spans.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("invalid log filter directive: {0}")]
    Directive(#[from] ParseError),

    #[error("failed to build OTLP pipeline: {0}")]
    Otlp(#[from] TraceError),

    #[error("global subscriber already installed: {0}")]
    AlreadyInstalled(#[from] TryInitError),
}

fn build_filter() -> Result<EnvFilter, LoggingInitError> {
    let mut filt = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    for d in QUIET_DIRECTIVES {
        filt = filt.add_directive(d.parse::<Directive>()?);
    }
    Ok(filt)
}

/// Installs the global subscriber.
///
/// Must be called from within a tokio runtime context when an OTLP endpoint is configured,
/// since the batch exporter spawns onto it.
pub fn init(config: LoggerConfig) -> Result<(), LoggingInitError> {
    set_text_map_propagator(TraceContextPropagator::new());

    let filt = build_filter()?;

    let stdout_layer = if config.stdout_config.json_format {
        layer()
            .json()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed()
    } else {
        layer()
            .compact()
            .with_span_events(config.stdout_config.fmt_span.clone())
            .with_filter(filt.clone())
            .boxed()
    };

    let file_layer = config.file_logging_config.as_ref().map(|file_config| {
        let appender = RollingFileAppender::new(
            file_config.rotation.clone(),
            &file_config.directory,
            &file_config.file_name_prefix,
        );

        if file_config.json_format {
            layer()
                .json()
                .with_writer(appender)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        } else {
            layer()
                .compact()
                .with_writer(appender)
                .with_ansi(false)
                .with_filter(filt.clone())
                .boxed()
        }
    });

    let otel_layer = match config.otel_url.as_ref() {
        Some(otel_url) => {
            let trace_config = Config::default().with_resource(config.resource.build_resource());

            let exporter = opentelemetry_otlp::new_exporter()
                .tonic()
                .with_endpoint(otel_url)
                .with_timeout(config.otlp_export_config.timeout);

            let tp = opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(exporter)
                .with_trace_config(trace_config)
                .install_batch(Tokio)?;

            let tracer = tp.tracer("avs-operator");
            // A second init in the same process keeps the first provider.
            let _ = TRACER_PROVIDER.set(tp);
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(file_layer)
        .with(otel_layer)
        .try_init()?;

    info!(
        service_name = %config.resource.service_name,
        service_version = ?config.resource.service_version,
        deployment_environment = ?config.resource.deployment_environment,
        otlp = config.otel_url.is_some(),
        file_logging = config.file_logging_config.is_some(),
        "logging initialized"
    );

    Ok(())
}

/// Flushes pending spans and tears down the OTLP pipeline, if one was installed.
pub fn finalize() {
    info!("shutting down logging");

    match TRACER_PROVIDER.get() {
        Some(provider) => {
            if let Err(e) = provider.shutdown() {
                error!(%e, "failed to shut down tracer provider");
            }
        }
        None => debug!("no tracer provider to shut down"),
    }

    global::shutdown_tracer_provider();
}
