use alloy_primitives::{Address, FixedBytes};
use serde::{Deserialize, Serialize};

use crate::{codec::ResponseDigest, task::VerificationOutcome};

/// Uncompressed BN254 G1 signature length, `x || y`.
pub const BLS_SIGNATURE_LEN: usize = 64;

/// Uncompressed BN254 G2 public key length, two coordinates in the quadratic extension.
pub const BLS_PUBLIC_KEY_LEN: usize = 128;

/// Who produced a [`SignedResponse`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignerIdentity {
    /// Operator address registered with the service.
    pub address: Address,
    pub bls_public_key: FixedBytes<BLS_PUBLIC_KEY_LEN>,
}

/// A verification outcome together with the operator's BLS signature over its digest.
///
/// This is what the operator hands to the aggregator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedResponse {
    pub outcome: VerificationOutcome,
    pub digest: ResponseDigest,
    pub signature: FixedBytes<BLS_SIGNATURE_LEN>,
    pub signer: SignerIdentity,
}

impl SignedResponse {
    pub fn task_index(&self) -> u32 {
        self.outcome.task_index
    }
}
