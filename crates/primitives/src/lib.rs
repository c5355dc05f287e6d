//! Data model shared by the operator crates: tasks as observed on chain, verification outcomes,
//! the canonical response encoding and the signed artifact handed to the aggregator.

pub mod codec;
pub mod errors;
mod proving_system;
mod response;
mod task;

pub use codec::{decode_response, encode_response, response_digest, EncodedResponse, ResponseDigest};
pub use errors::{CodecError, ParseProvingSystemError};
pub use proving_system::ProvingSystemId;
pub use response::{SignedResponse, SignerIdentity, BLS_PUBLIC_KEY_LEN, BLS_SIGNATURE_LEN};
pub use task::{verification_key_commitment, ByteSummary, Task, VerificationOutcome};
