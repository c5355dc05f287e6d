use std::fmt;

use alloy_primitives::{keccak256, Bytes, B256};
use serde::{Deserialize, Serialize};

use crate::proving_system::ProvingSystemId;

/// A verification request as published by the service manager contract.
///
/// The proving system is kept as the raw on-chain code so that tasks naming a code the
/// operator does not know about can still be observed and logged.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub index: u32,
    pub proving_system_id: u16,
    pub proof: Bytes,
    pub public_input: Bytes,
    pub verification_key: Bytes,
    pub created_at_block: u32,
}

impl Task {
    /// Resolves the declared proving system, `None` if the code is not one the contract defines.
    pub fn proving_system(&self) -> Option<ProvingSystemId> {
        ProvingSystemId::from_code(self.proving_system_id)
    }

    pub fn proof_summary(&self) -> ByteSummary<'_> {
        ByteSummary(&self.proof)
    }
}

/// Result of checking one task's proof.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub task_index: u32,
    pub is_valid: bool,
}

impl VerificationOutcome {
    pub fn new(task_index: u32, is_valid: bool) -> Self {
        Self {
            task_index,
            is_valid,
        }
    }
}

/// Commitment a contract would index a verification key by.
pub fn verification_key_commitment(verification_key: &[u8]) -> B256 {
    keccak256(verification_key)
}

/// Log-friendly view of a byte blob: its length and at most 8 bytes from each end.
#[derive(Copy, Clone, Debug)]
pub struct ByteSummary<'a>(pub &'a [u8]);

impl ByteSummary<'_> {
    const EDGE: usize = 8;
}

impl fmt::Display for ByteSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = self.0;
        if bytes.len() <= 2 * Self::EDGE {
            return write!(f, "{} bytes [{}]", bytes.len(), hex::encode(bytes));
        }
        let head = &bytes[..Self::EDGE];
        let tail = &bytes[bytes.len() - Self::EDGE..];
        write!(
            f,
            "{} bytes [{}..{}]",
            bytes.len(),
            hex::encode(head),
            hex::encode(tail)
        )
    }
}
