//! Operator configuration.
//!
//! Loaded from an optional TOML file, then overridden by command-line arguments. The resolved
//! [`Config`] carries everything startup needs.

use std::{path::PathBuf, str::FromStr, time::Duration};

use alloy_primitives::Address;
use avs_operator::ReconnectPolicy;
use avs_primitives::ProvingSystemId;
use serde::{Deserialize, Serialize};

use crate::{args::Args, errors::ConfigError};

/// Operator configuration as written in the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct OperatorConfig {
    #[serde(default)]
    pub(crate) chain: ChainConfig,

    #[serde(default)]
    pub(crate) operator: IdentityConfig,

    #[serde(default)]
    pub(crate) verifiers: VerifiersConfig,

    #[serde(default)]
    pub(crate) reconnect: ReconnectConfig,

    #[serde(default)]
    pub(crate) logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ChainConfig {
    /// Websocket endpoint of the execution node.
    #[serde(default = "default_values::ws_url")]
    pub(crate) ws_url: String,

    pub(crate) service_manager_address: Option<Address>,

    /// Capacity of the task channel between the event source and the loop.
    #[serde(default = "default_values::event_buffer")]
    pub(crate) event_buffer: usize,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            ws_url: default_values::ws_url(),
            service_manager_address: None,
            event_buffer: default_values::event_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct IdentityConfig {
    /// Registered operator address. Must match the ECDSA key when set.
    pub(crate) address: Option<Address>,
    pub(crate) bls_private_key_path: Option<PathBuf>,
    pub(crate) ecdsa_private_key_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct VerifiersConfig {
    /// Proving systems to verify, by name. Every built-in verifier if unset.
    pub(crate) enabled: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReconnectStrategy {
    Immediate,
    #[default]
    Backoff,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct ReconnectConfig {
    #[serde(default)]
    pub(crate) strategy: ReconnectStrategy,

    #[serde(default = "default_values::base_delay_ms")]
    pub(crate) base_delay_ms: u64,

    #[serde(default = "default_values::max_delay_ms")]
    pub(crate) max_delay_ms: u64,

    #[serde(default = "default_values::multiplier")]
    pub(crate) multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            strategy: ReconnectStrategy::default(),
            base_delay_ms: default_values::base_delay_ms(),
            max_delay_ms: default_values::max_delay_ms(),
            multiplier: default_values::multiplier(),
        }
    }
}

impl ReconnectConfig {
    pub(crate) fn to_policy(&self) -> Result<ReconnectPolicy, ConfigError> {
        match self.strategy {
            ReconnectStrategy::Immediate => Ok(ReconnectPolicy::Immediate),
            ReconnectStrategy::Backoff => {
                if !self.multiplier.is_finite() || self.multiplier < 1.0 {
                    return Err(ConfigError::InvalidReconnect(format!(
                        "multiplier must be at least 1.0, got {}",
                        self.multiplier
                    )));
                }
                if self.base_delay_ms > self.max_delay_ms {
                    return Err(ConfigError::InvalidReconnect(format!(
                        "base_delay_ms {} exceeds max_delay_ms {}",
                        self.base_delay_ms, self.max_delay_ms
                    )));
                }
                Ok(ReconnectPolicy::Backoff {
                    base: Duration::from_millis(self.base_delay_ms),
                    max: Duration::from_millis(self.max_delay_ms),
                    multiplier: self.multiplier,
                })
            }
        }
    }
}

/// Logging configuration for the operator.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub(crate) struct LoggingConfig {
    /// Service label to append to the service name (e.g., "prod", "dev").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) service_label: Option<String>,

    /// OpenTelemetry OTLP endpoint URL for distributed tracing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) otlp_url: Option<String>,

    /// Directory path for file-based logging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) log_dir: Option<PathBuf>,

    /// Prefix for log file names (defaults to "avs-operator" if not set).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) log_file_prefix: Option<String>,

    /// Use JSON format for logs instead of compact format.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) json_format: Option<bool>,

    /// Deployment environment reported with traces (e.g., "holesky", "mainnet").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) environment: Option<String>,
}

mod default_values {
    pub(super) fn ws_url() -> String {
        "ws://localhost:8546".to_owned()
    }

    pub(super) fn event_buffer() -> usize {
        64
    }

    pub(super) fn base_delay_ms() -> u64 {
        100
    }

    pub(super) fn max_delay_ms() -> u64 {
        10_000
    }

    pub(super) fn multiplier() -> f64 {
        2.0
    }
}

impl OperatorConfig {
    pub(crate) fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub(crate) fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}

/// Fully resolved startup configuration.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) ws_url: String,
    pub(crate) service_manager: Address,
    pub(crate) event_buffer: usize,
    pub(crate) operator_address: Option<Address>,
    pub(crate) bls_key_path: PathBuf,
    pub(crate) ecdsa_key_path: PathBuf,
    /// `None` enables every built-in verifier.
    pub(crate) enabled_verifiers: Option<Vec<ProvingSystemId>>,
    pub(crate) reconnect: ReconnectPolicy,
    pub(crate) logging: LoggingConfig,
}

impl Config {
    /// Reads the config file named by `--config`, if any, and applies argument overrides.
    pub(crate) fn from_args(args: &Args) -> Result<Self, ConfigError> {
        let file = match &args.config {
            Some(path) => OperatorConfig::from_file(path)?,
            None => OperatorConfig::default(),
        };
        Self::resolve(file, args)
    }

    pub(crate) fn resolve(file: OperatorConfig, args: &Args) -> Result<Self, ConfigError> {
        let OperatorConfig {
            chain,
            operator,
            verifiers,
            reconnect,
            logging,
        } = file;

        let enabled_verifiers = verifiers
            .enabled
            .map(|names| {
                names
                    .iter()
                    .map(|name| ProvingSystemId::from_str(name))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;

        Ok(Self {
            ws_url: args.ws_url.clone().unwrap_or(chain.ws_url),
            service_manager: args
                .service_manager
                .or(chain.service_manager_address)
                .ok_or(ConfigError::Missing("--service-manager or chain.service_manager_address"))?,
            event_buffer: chain.event_buffer,
            operator_address: operator.address,
            bls_key_path: args
                .bls_key
                .clone()
                .or(operator.bls_private_key_path)
                .ok_or(ConfigError::Missing("--bls-key or operator.bls_private_key_path"))?,
            ecdsa_key_path: args
                .ecdsa_key
                .clone()
                .or(operator.ecdsa_private_key_path)
                .ok_or(ConfigError::Missing(
                    "--ecdsa-key or operator.ecdsa_private_key_path",
                ))?,
            enabled_verifiers,
            reconnect: reconnect.to_policy()?,
            logging,
        })
    }
}
