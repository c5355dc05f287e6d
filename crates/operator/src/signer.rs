use std::sync::Arc;

use avs_primitives::{encode_response, response_digest, SignedResponse, VerificationOutcome};

use crate::identity::OperatorIdentity;

/// Encodes, hashes and BLS-signs verification outcomes under the operator's identity.
#[derive(Debug, Clone)]
pub struct ResponseSigner {
    identity: Arc<OperatorIdentity>,
}

impl ResponseSigner {
    pub fn new(identity: Arc<OperatorIdentity>) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &OperatorIdentity {
        &self.identity
    }

    pub fn sign(&self, outcome: VerificationOutcome) -> SignedResponse {
        let encoded = encode_response(&outcome);
        let digest = response_digest(&encoded);
        let signature = self.identity.bls().sign_digest(&digest);

        SignedResponse {
            outcome,
            digest,
            signature,
            signer: self.identity.signer_identity(),
        }
    }
}
