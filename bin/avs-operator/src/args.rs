use std::{env, path::PathBuf};

use alloy_primitives::Address;
use argh::FromArgs;
use avs_common::logging::FileLoggingConfig;

/// Configs overridable by environment.
#[derive(Debug, Clone, Default)]
pub(crate) struct EnvArgs {
    /// OpenTelemetry OTLP endpoint URL
    pub otlp_url: Option<String>,
    /// Service label to include in service name
    pub service_label: Option<String>,
    /// Directory for file-based logs
    pub log_dir: Option<PathBuf>,
    /// Emit JSON logs when set to anything but "0" or "false"
    pub json_logs: Option<bool>,
}

impl EnvArgs {
    pub(crate) fn from_env() -> Self {
        Self {
            otlp_url: env::var("AVS_OTLP_URL").ok(),
            service_label: env::var("AVS_SVC_LABEL").ok(),
            log_dir: env::var_os("AVS_LOG_DIR").map(PathBuf::from),
            json_logs: env::var("AVS_LOG_JSON").ok().map(|v| parse_flag(&v)),
        }
    }

    /// File logging config if a log directory was given.
    pub(crate) fn get_file_logging_config(&self, prefix: &str) -> Option<FileLoggingConfig> {
        self.log_dir
            .as_ref()
            .map(|dir| FileLoggingConfig::new(dir.clone(), prefix))
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_ascii_lowercase().as_str(), "" | "0" | "false" | "no")
}

#[derive(Debug, Clone, FromArgs)]
#[argh(description = "AVS proof verification operator")]
pub(crate) struct Args {
    #[argh(option, short = 'c', description = "path to the TOML config file")]
    pub config: Option<PathBuf>,

    #[argh(option, short = 'w', description = "websocket URL of the execution node")]
    pub ws_url: Option<String>,

    #[argh(option, description = "service manager contract address")]
    pub service_manager: Option<Address>,

    #[argh(option, description = "path to the hex encoded BLS secret key")]
    pub bls_key: Option<PathBuf>,

    #[argh(option, description = "path to the hex encoded ECDSA private key")]
    pub ecdsa_key: Option<PathBuf>,
}
