//! Proof verification for the proving systems a task can name.
//!
//! Each proving system the operator can check has one [`ProofVerifier`] implementation. The
//! [`VerifierRegistry`] routes a task to the verifier matching its declared proving system.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod errors;
mod plonk;
mod registry;

pub use errors::{DispatchError, RegistryError, VerifierError};
pub use plonk::{PlonkBls12_381Verifier, MAX_CIRCUIT_SIZE};
pub use registry::{ProofVerifier, VerifierRegistry};
#[cfg(any(test, feature = "test-utils"))]
pub use registry::MockProofVerifier;
