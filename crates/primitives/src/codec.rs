//! Canonical encoding of task responses.
//!
//! The encoding must match what the service manager contract hashes, so it is the standard
//! ABI encoding of `(uint32 taskIndex, bool proofIsCorrect)`: two 32-byte words.

use alloy_primitives::{keccak256, B256};
use alloy_sol_types::{sol, SolValue};

use crate::{errors::CodecError, task::VerificationOutcome};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct TaskResponse {
        uint32 taskIndex;
        bool proofIsCorrect;
    }
}

/// Keccak-256 of an [`EncodedResponse`], the message the operator signs.
pub type ResponseDigest = B256;

/// ABI encoded task response bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedResponse(Vec<u8>);

impl EncodedResponse {
    pub const LEN: usize = 64;

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for EncodedResponse {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<VerificationOutcome> for TaskResponse {
    fn from(outcome: VerificationOutcome) -> Self {
        TaskResponse {
            taskIndex: outcome.task_index,
            proofIsCorrect: outcome.is_valid,
        }
    }
}

impl From<TaskResponse> for VerificationOutcome {
    fn from(response: TaskResponse) -> Self {
        VerificationOutcome::new(response.taskIndex, response.proofIsCorrect)
    }
}

pub fn encode_response(outcome: &VerificationOutcome) -> EncodedResponse {
    EncodedResponse(TaskResponse::from(*outcome).abi_encode())
}

pub fn decode_response(bytes: &[u8]) -> Result<VerificationOutcome, CodecError> {
    let response = <TaskResponse as SolValue>::abi_decode(bytes)?;
    Ok(response.into())
}

pub fn response_digest(encoded: &EncodedResponse) -> ResponseDigest {
    keccak256(encoded.as_bytes())
}
