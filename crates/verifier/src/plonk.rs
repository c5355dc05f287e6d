use avs_primitives::ProvingSystemId;
use dusk_bytes::{DeserializableSlice, Serializable};
use dusk_plonk::prelude::{BlsScalar, Proof, Verifier};
use tracing::debug;

use crate::{errors::VerifierError, registry::ProofVerifier};

/// Length of the big-endian `u64` header of an encoded [`Verifier`]: label, verifier key,
/// opening key and public input index lengths, then circuit size and constraint count.
const VK_HEADER_LEN: usize = 48;

/// Largest circuit size (and verifier key domain) accepted from a task.
pub const MAX_CIRCUIT_SIZE: u64 = 1 << 22;

/// PLONK verifier over BLS12-381.
///
/// External encodings:
/// - proof: [`Proof::to_bytes`], exactly [`Proof::SIZE`] bytes
/// - public input: concatenated canonical little-endian scalars, 32 bytes each
/// - verification key: [`Verifier::to_bytes`], circuit size at most [`MAX_CIRCUIT_SIZE`]
///
/// These are dusk-plonk encodings. Proofs and keys serialized by gnark are not accepted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlonkBls12_381Verifier;

impl PlonkBls12_381Verifier {
    fn parse_proof(bytes: &[u8]) -> Option<Proof> {
        if bytes.len() != Proof::SIZE {
            return None;
        }
        Proof::from_slice(bytes).ok()
    }

    fn parse_public_input(bytes: &[u8]) -> Result<Vec<BlsScalar>, VerifierError> {
        if bytes.len() % BlsScalar::SIZE != 0 {
            return Err(VerifierError::MalformedPublicInput(format!(
                "length {} is not a multiple of {}",
                bytes.len(),
                BlsScalar::SIZE
            )));
        }

        bytes
            .chunks_exact(BlsScalar::SIZE)
            .enumerate()
            .map(|(i, chunk)| {
                BlsScalar::from_slice(chunk).map_err(|e| {
                    VerifierError::MalformedPublicInput(format!("scalar {i}: {e:?}"))
                })
            })
            .collect()
    }

    fn parse_verification_key(bytes: &[u8]) -> Result<Verifier, VerifierError> {
        check_verification_key_layout(bytes)?;
        Verifier::try_from_bytes(bytes)
            .map_err(|e| VerifierError::MalformedVerificationKey(format!("{e:?}")))
    }
}

impl ProofVerifier for PlonkBls12_381Verifier {
    fn proving_system(&self) -> ProvingSystemId {
        ProvingSystemId::PlonkBls12_381
    }

    fn verify(
        &self,
        proof: &[u8],
        public_input: &[u8],
        verification_key: &[u8],
    ) -> Result<bool, VerifierError> {
        let Some(proof) = Self::parse_proof(proof) else {
            debug!(len = proof.len(), "unparseable proof");
            return Ok(false);
        };
        let public_input = Self::parse_public_input(public_input)?;
        let verifier = Self::parse_verification_key(verification_key)?;

        match verifier.verify(&proof, &public_input) {
            Ok(()) => Ok(true),
            Err(e) => {
                debug!(err = ?e, "proof rejected");
                Ok(false)
            }
        }
    }
}

/// Checks the length prefixes, circuit size and public input indexes of an encoded
/// [`Verifier`], none of which [`Verifier::try_from_bytes`] bounds itself.
fn check_verification_key_layout(bytes: &[u8]) -> Result<(), VerifierError> {
    let malformed = VerifierError::MalformedVerificationKey;
    if bytes.len() < VK_HEADER_LEN {
        return Err(malformed(format!(
            "{} bytes is shorter than the {VK_HEADER_LEN} byte header",
            bytes.len()
        )));
    }

    let label_len = be_u64_at(bytes, 0);
    let verifier_key_len = be_u64_at(bytes, 8);
    let opening_key_len = be_u64_at(bytes, 16);
    let index_count = be_u64_at(bytes, 24);
    let size = be_u64_at(bytes, 32);

    let keys_len = label_len
        .checked_add(verifier_key_len)
        .and_then(|n| n.checked_add(opening_key_len));
    let body_len = index_count
        .checked_mul(8)
        .zip(keys_len)
        .and_then(|(indexes, keys)| indexes.checked_add(keys))
        .ok_or_else(|| malformed("section lengths overflow".to_owned()))?;
    let available = (bytes.len() - VK_HEADER_LEN) as u64;
    if body_len > available {
        return Err(malformed(format!(
            "sections need {body_len} bytes, {available} present"
        )));
    }

    if size > MAX_CIRCUIT_SIZE {
        return Err(malformed(format!(
            "circuit size {size} exceeds {MAX_CIRCUIT_SIZE}"
        )));
    }

    // All section offsets below are within `bytes` after the length check.
    let verifier_key_start = VK_HEADER_LEN + label_len as usize;
    if verifier_key_len >= 8 {
        let mut domain = [0u8; 8];
        domain.copy_from_slice(&bytes[verifier_key_start..verifier_key_start + 8]);
        let domain = u64::from_le_bytes(domain);
        if domain > MAX_CIRCUIT_SIZE {
            return Err(malformed(format!(
                "verifier key domain {domain} exceeds {MAX_CIRCUIT_SIZE}"
            )));
        }
    }

    let indexes_start = verifier_key_start + (verifier_key_len + opening_key_len) as usize;
    for i in 0..index_count as usize {
        let index = be_u64_at(bytes, indexes_start + 8 * i);
        if index >= size {
            return Err(malformed(format!(
                "public input index {index} outside circuit size {size}"
            )));
        }
    }

    Ok(())
}

fn be_u64_at(bytes: &[u8], at: usize) -> u64 {
    let mut word = [0u8; 8];
    word.copy_from_slice(&bytes[at..at + 8]);
    u64::from_be_bytes(word)
}
