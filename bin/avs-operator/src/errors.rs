//! Error types for initialization and configuration.

use std::{io, path::PathBuf};

use avs_chainio::ChainIoError;
use avs_common::logging::LoggingInitError;
use avs_operator::{IdentityError, OperatorError};
use avs_primitives::ParseProvingSystemError;
use avs_verifier::RegistryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error("runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("logging: {0}")]
    Logging(#[from] LoggingInitError),

    #[error("reading key file {}: {source}", path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("key file {} is not valid hex: {reason}", path.display())]
    KeyEncoding { path: PathBuf, reason: String },

    #[error("identity: {0}")]
    Identity(#[from] IdentityError),

    #[error("verifiers: {0}")]
    Verifiers(#[from] RegistryError),

    #[error("chain: {0}")]
    Chain(#[from] ChainIoError),

    #[error("operator: {0}")]
    Operator(#[from] OperatorError),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("reading {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("unparsable config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required value is set neither in the file nor on the command line.
    #[error("missing value: {0}")]
    Missing(&'static str),

    #[error("{0}")]
    ProvingSystem(#[from] ParseProvingSystemError),

    #[error("invalid reconnect settings: {0}")]
    InvalidReconnect(String),
}
