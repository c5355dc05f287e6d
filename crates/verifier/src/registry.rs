use std::{collections::HashMap, fmt, sync::Arc};

use avs_primitives::{ProvingSystemId, Task, VerificationOutcome};
use tracing::debug;

use crate::{
    errors::{DispatchError, RegistryError, VerifierError},
    plonk::PlonkBls12_381Verifier,
};

/// Checks proofs of a single proving system.
///
/// Implementations are synchronous and may be CPU heavy; callers are expected to run them off
/// the async executor.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
pub trait ProofVerifier: Send + Sync + 'static {
    /// The proving system this verifier understands.
    fn proving_system(&self) -> ProvingSystemId;

    /// Checks `proof` against `public_input` under `verification_key`.
    ///
    /// Returns `Ok(false)` for a proof that does not verify, including one that cannot be
    /// parsed. Errors are reserved for a public input or verification key that cannot be parsed.
    fn verify(
        &self,
        proof: &[u8],
        public_input: &[u8],
        verification_key: &[u8],
    ) -> Result<bool, VerifierError>;
}

/// Routes tasks to the verifier of their declared proving system.
#[derive(Clone, Default)]
pub struct VerifierRegistry {
    verifiers: HashMap<ProvingSystemId, Arc<dyn ProofVerifier>>,
}

impl fmt::Debug for VerifierRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierRegistry")
            .field("supported", &self.supported())
            .finish()
    }
}

impl VerifierRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Proving systems this crate ships a verifier for.
    pub fn builtin_systems() -> &'static [ProvingSystemId] {
        &[ProvingSystemId::PlonkBls12_381]
    }

    fn builtin(id: ProvingSystemId) -> Option<Arc<dyn ProofVerifier>> {
        match id {
            ProvingSystemId::PlonkBls12_381 => Some(Arc::new(PlonkBls12_381Verifier)),
            _ => None,
        }
    }

    /// Registry with every built-in verifier.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for id in Self::builtin_systems() {
            if let Some(verifier) = Self::builtin(*id) {
                registry.register(verifier);
            }
        }
        registry
    }

    /// Registry with the built-in verifiers for `enabled` only.
    pub fn with_enabled(enabled: &[ProvingSystemId]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for id in enabled {
            let verifier = Self::builtin(*id).ok_or(RegistryError::NoBuiltinVerifier(*id))?;
            registry.register(verifier);
        }
        Ok(registry)
    }

    /// Registers a verifier under the proving system it reports, returning the one it replaces.
    pub fn register(
        &mut self,
        verifier: Arc<dyn ProofVerifier>,
    ) -> Option<Arc<dyn ProofVerifier>> {
        self.verifiers.insert(verifier.proving_system(), verifier)
    }

    pub fn get(&self, id: ProvingSystemId) -> Option<&Arc<dyn ProofVerifier>> {
        self.verifiers.get(&id)
    }

    /// Registered proving systems, in code order.
    pub fn supported(&self) -> Vec<ProvingSystemId> {
        let mut ids: Vec<_> = self.verifiers.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn is_empty(&self) -> bool {
        self.verifiers.is_empty()
    }

    /// Verifies `task` with the verifier matching its proving system.
    pub fn dispatch(&self, task: &Task) -> Result<VerificationOutcome, DispatchError> {
        let verifier = task
            .proving_system()
            .and_then(|id| self.get(id))
            .ok_or(DispatchError::UnknownProvingSystem(task.proving_system_id))?;

        let is_valid = verifier.verify(&task.proof, &task.public_input, &task.verification_key)?;
        debug!(task_index = task.index, %is_valid, "proof checked");

        Ok(VerificationOutcome::new(task.index, is_valid))
    }
}
