use avs_primitives::ProvingSystemId;
use thiserror::Error;

/// Failure to interpret the task-supplied statement of a proof.
///
/// Malformed proof bytes are never reported here: those are a negative verification result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifierError {
    #[error("malformed public input: {0}")]
    MalformedPublicInput(String),

    #[error("malformed verification key: {0}")]
    MalformedVerificationKey(String),
}

/// Why a task could not be turned into a verification outcome.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DispatchError {
    /// The task names a proving system code with no registered verifier.
    #[error("no verifier registered for proving system code {0}")]
    UnknownProvingSystem(u16),

    #[error(transparent)]
    MalformedTaskData(#[from] VerifierError),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("no built-in verifier for proving system {0}")]
    NoBuiltinVerifier(ProvingSystemId),
}
