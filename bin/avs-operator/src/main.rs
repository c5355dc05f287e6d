//! AVS operator
//!
//! Watches the service manager for new verification tasks, checks each proof and emits a
//! BLS-signed response for aggregation.

mod args;
mod config;
mod errors;
mod helpers;

use std::sync::Arc;

use alloy_primitives::Address;
use args::{Args, EnvArgs};
use avs_chainio::WsTaskEventSource;
use avs_common::{logging, shutdown_channel};
use avs_operator::{LoggingSink, OperatorIdentity, OperatorLoop, ResponseSigner, TaskProcessor};
use avs_verifier::VerifierRegistry;
use config::Config;
use errors::{AppError, Result};
use helpers::{build_registry, load_identity};
use tokio::runtime::Handle;
use tracing::info;

const SERVICE_NAME: &str = "avs-operator";

fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();
    if let Err(e) = main_inner(args) {
        eprintln!("FATAL ERROR: {e}");

        return Err(e.into());
    }

    Ok(())
}

fn main_inner(args: Args) -> Result<()> {
    let config = Config::from_args(&args)?;

    // Start runtime for async IO tasks.
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("avs-rt")
        .build()
        .map_err(AppError::Runtime)?;

    // The operator address labels the telemetry resource.
    let identity = load_identity(&config)?;
    init_logging(runtime.handle(), &config, identity.address())?;
    // Public halves only.
    info!(
        address = %identity.address(),
        bls_public_key = %identity.bls().public_key_bytes(),
        "ready to sign as operator"
    );

    let registry = build_registry(&config)?;
    info!(supported = ?registry.supported(), "verifiers ready");

    let result = runtime.block_on(run(config, identity, registry));
    logging::finalize();
    result
}

async fn run(config: Config, identity: OperatorIdentity, registry: VerifierRegistry) -> Result<()> {
    info!(ws_url = %config.ws_url, "connecting to chain");
    let source = WsTaskEventSource::connect(
        &config.ws_url,
        config.service_manager,
        config.event_buffer,
        identity.tx_signer().clone(),
    )
    .await?;

    let signer = ResponseSigner::new(Arc::new(identity));
    let processor = TaskProcessor::new(Arc::new(registry), signer);

    let (trigger, signal) = shutdown_channel();
    tokio::spawn(trigger.trigger_on_os_signal());

    let stats = OperatorLoop::new(source, processor, LoggingSink, config.reconnect)
        .run(signal)
        .await?;
    info!(?stats, "operator exited");

    Ok(())
}

/// Sets up the logging system given a handle to a runtime context to possibly
/// start the OTLP output on.
fn init_logging(rt: &Handle, config: &Config, operator: Address) -> Result<()> {
    let file_config = &config.logging;
    // Environment wins over the config file.
    let env_args = EnvArgs::from_env();

    let label = env_args
        .service_label
        .as_deref()
        .or(file_config.service_label.as_deref());
    let service_name = logging::format_service_name(SERVICE_NAME, label);

    let json_format = env_args
        .json_logs
        .or(file_config.json_format)
        .unwrap_or(false);
    let mut lconfig = logging::LoggerConfig::new(service_name)
        .with_service_version(env!("CARGO_PKG_VERSION"))
        .with_service_instance_id(operator.to_string())
        .with_json_logging(json_format)
        .add_resource_attribute("avs.service_manager", config.service_manager.to_string());
    if let Some(env) = &file_config.environment {
        lconfig = lconfig.with_deployment_environment(env.clone());
    }

    let otlp_url = env_args.otlp_url.clone().or(file_config.otlp_url.clone());
    if let Some(url) = &otlp_url {
        lconfig.set_otlp_url(url.clone());
    }

    let prefix = file_config.log_file_prefix.as_deref().unwrap_or(SERVICE_NAME);
    let file_logging_config = env_args.get_file_logging_config(prefix).or_else(|| {
        file_config
            .log_dir
            .clone()
            .map(|dir| logging::FileLoggingConfig::new(dir, prefix))
    });
    if let Some(file) = &file_logging_config {
        lconfig = lconfig.with_file_logging(file.clone().with_json_format(json_format));
    }

    {
        // OTLP batch export spawns onto the current runtime.
        let _g = rt.enter();
        logging::init(lconfig)?;
    }

    if let Some(url) = &otlp_url {
        info!(%url, "using OpenTelemetry tracing output");
    }
    if let Some(file) = &file_logging_config {
        info!(
            log_dir = %file.directory.display(),
            log_prefix = %file.file_name_prefix,
            "file logging enabled"
        );
    }
    Ok(())
}
