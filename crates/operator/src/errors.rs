use alloy::primitives::Address;
use avs_chainio::ChainIoError;
use avs_verifier::{DispatchError, VerifierError};
use thiserror::Error;

/// Failure to process a single task. Always local to that task.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("task {task_index}: no verifier for proving system code {proving_system_id}")]
    UnknownProvingSystem {
        task_index: u32,
        proving_system_id: u16,
    },

    #[error("task {task_index}: {source}")]
    MalformedTaskData {
        task_index: u32,
        #[source]
        source: VerifierError,
    },

    #[error("task {task_index}: verifier crashed: {reason}")]
    VerifierCrashed { task_index: u32, reason: String },
}

impl TaskError {
    pub(crate) fn from_dispatch(task_index: u32, err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownProvingSystem(proving_system_id) => {
                TaskError::UnknownProvingSystem {
                    task_index,
                    proving_system_id,
                }
            }
            DispatchError::MalformedTaskData(source) => TaskError::MalformedTaskData {
                task_index,
                source,
            },
        }
    }

    /// Stable label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::UnknownProvingSystem { .. } => "unknown_proving_system",
            TaskError::MalformedTaskData { .. } => "malformed_task_data",
            TaskError::VerifierCrashed { .. } => "verifier_crashed",
        }
    }

    pub fn task_index(&self) -> u32 {
        match self {
            TaskError::UnknownProvingSystem { task_index, .. }
            | TaskError::MalformedTaskData { task_index, .. }
            | TaskError::VerifierCrashed { task_index, .. } => *task_index,
        }
    }
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid BLS secret key: {0}")]
    InvalidBlsKey(String),

    #[error("invalid ECDSA private key: {0}")]
    InvalidEcdsaKey(String),

    #[error("configured operator address {configured} does not match ECDSA key address {signer}")]
    AddressMismatch { configured: Address, signer: Address },
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("response receiver closed")]
    Closed,

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("initial task subscription failed: {0}")]
    InitialSubscription(#[from] ChainIoError),
}
