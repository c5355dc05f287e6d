//! Chain side of the operator: contract event bindings and the task subscription.
//!
//! [`ChainEventSource`] is the seam the operator loop subscribes through. A subscription is a
//! [`TaskSubscription`]: a stream of tasks plus a single terminal error, after which the
//! subscription is dead and must be replaced.

mod bindings;
mod errors;
mod source;
mod subscription;
mod ws;

pub use bindings::{ContractTask, NewTaskCreated};
pub use errors::{ChainIoError, FeedClosed, SubscriptionError};
#[cfg(any(test, feature = "test-utils"))]
pub use source::MockChainEventSource;
pub use source::ChainEventSource;
pub use subscription::{SubscriptionEvent, TaskFeed, TaskSubscription};
pub use ws::WsTaskEventSource;
