use std::{any::Any, sync::Arc};

use avs_primitives::{verification_key_commitment, SignedResponse, Task};
use avs_verifier::VerifierRegistry;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, info};

use crate::{errors::TaskError, signer::ResponseSigner};

/// Runs one task through verification and signing.
#[derive(Debug, Clone)]
pub struct TaskProcessor {
    registry: Arc<VerifierRegistry>,
    signer: ResponseSigner,
}

impl TaskProcessor {
    pub fn new(registry: Arc<VerifierRegistry>, signer: ResponseSigner) -> Self {
        Self { registry, signer }
    }

    /// Verifies `task` on the blocking pool and signs the outcome.
    ///
    /// The verification is always awaited to completion. A panicking verifier fails this task
    /// only.
    pub async fn process(&self, task: Task) -> Result<SignedResponse, TaskError> {
        let task_index = task.index;
        info!(
            task_index,
            proving_system_id = task.proving_system_id,
            created_at_block = task.created_at_block,
            proof = %task.proof_summary(),
            public_input_len = task.public_input.len(),
            vk_commitment = %verification_key_commitment(&task.verification_key),
            "received new task"
        );

        let registry = self.registry.clone();
        let outcome = spawn_blocking(move || registry.dispatch(&task))
            .await
            .map_err(|e| TaskError::VerifierCrashed {
                task_index,
                reason: join_failure_reason(e),
            })?
            .map_err(|e| TaskError::from_dispatch(task_index, e))?;

        let response = self.signer.sign(outcome);
        debug!(
            task_index,
            is_valid = outcome.is_valid,
            digest = %response.digest,
            "signed task response"
        );
        Ok(response)
    }
}

fn join_failure_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    panic_message(err.into_panic())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(msg) => *msg,
        Err(payload) => match payload.downcast_ref::<&str>() {
            Some(msg) => (*msg).to_owned(),
            None => "unknown panic".to_owned(),
        },
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::Bytes;
    use avs_primitives::{ProvingSystemId, VerificationOutcome};
    use avs_verifier::{MockProofVerifier, ProofVerifier, VerifierError};

    use super::*;
    use crate::identity::{test_utils::test_identity, verify_signature};

    fn task(index: u32, proving_system: ProvingSystemId) -> Task {
        Task {
            index,
            proving_system_id: proving_system.code(),
            proof: Bytes::from_static(b"proof"),
            public_input: Bytes::new(),
            verification_key: Bytes::from_static(b"vk"),
            created_at_block: 1,
        }
    }

    struct PanickingVerifier;

    impl ProofVerifier for PanickingVerifier {
        fn proving_system(&self) -> ProvingSystemId {
            ProvingSystemId::PlonkBls12_381
        }

        fn verify(&self, _: &[u8], _: &[u8], _: &[u8]) -> Result<bool, VerifierError> {
            panic!("pairing blew up")
        }
    }

    fn processor_with(verifier: impl ProofVerifier) -> TaskProcessor {
        let mut registry = VerifierRegistry::new();
        registry.register(Arc::new(verifier));
        TaskProcessor::new(
            Arc::new(registry),
            ResponseSigner::new(Arc::new(test_identity())),
        )
    }

    fn mock_returning(
        result: impl Fn() -> Result<bool, VerifierError> + Send + 'static,
    ) -> MockProofVerifier {
        let mut mock = MockProofVerifier::new();
        mock.expect_proving_system()
            .return_const(ProvingSystemId::PlonkBls12_381);
        mock.expect_verify().returning(move |_, _, _| result());
        mock
    }

    #[tokio::test]
    async fn test_valid_and_invalid_proofs_are_both_signed() {
        for verdict in [true, false] {
            let processor = processor_with(mock_returning(move || Ok(verdict)));
            let response = processor
                .process(task(11, ProvingSystemId::PlonkBls12_381))
                .await
                .unwrap();
            assert_eq!(response.outcome, VerificationOutcome::new(11, verdict));
            assert!(verify_signature(
                response.signer.bls_public_key.as_slice(),
                &response.digest,
                response.signature.as_slice(),
            ));
        }
    }

    #[tokio::test]
    async fn test_unknown_proving_system_produces_no_response() {
        let mut mock = MockProofVerifier::new();
        mock.expect_proving_system()
            .return_const(ProvingSystemId::PlonkBls12_381);
        mock.expect_verify().never();

        let processor = processor_with(mock);
        let err = processor
            .process(task(2, ProvingSystemId::Halo2Ipa))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "unknown_proving_system");
        assert_eq!(err.task_index(), 2);
    }

    #[tokio::test]
    async fn test_malformed_task_data_is_a_task_error() {
        let processor = processor_with(mock_returning(|| {
            Err(VerifierError::MalformedVerificationKey("truncated".to_owned()))
        }));
        let err = processor
            .process(task(3, ProvingSystemId::PlonkBls12_381))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_task_data");
    }

    #[tokio::test]
    async fn test_panicking_verifier_is_contained() {
        let processor = processor_with(PanickingVerifier);
        let err = processor
            .process(task(4, ProvingSystemId::PlonkBls12_381))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "verifier_crashed");
        assert!(err.to_string().contains("pairing blew up"));
    }
}
