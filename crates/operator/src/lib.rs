//! The operator proper: turns observed tasks into signed verification responses.
//!
//! [`OperatorLoop`] keeps a task subscription alive, hands each task to the [`TaskProcessor`]
//! (verify, encode, digest, sign) and passes the result to a [`ResponseSink`].

mod errors;
mod identity;
mod operator;
mod policy;
mod processor;
mod signer;
mod sink;

pub use errors::{IdentityError, OperatorError, SinkError, TaskError};
pub use identity::{verify_signature, BlsKeyPair, OperatorIdentity};
pub use operator::{LoopState, LoopStats, OperatorLoop};
pub use policy::ReconnectPolicy;
pub use processor::TaskProcessor;
pub use signer::ResponseSigner;
#[cfg(any(test, feature = "test-utils"))]
pub use sink::MockResponseSink;
pub use sink::{LoggingSink, ResponseSink};
