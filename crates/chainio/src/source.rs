use async_trait::async_trait;

use crate::{errors::ChainIoError, subscription::TaskSubscription};

/// Something the operator can open task subscriptions against.
///
/// Each call yields an independent subscription; a subscription that has reported an error is
/// never revived, the caller subscribes again instead.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ChainEventSource: Send + Sync {
    async fn subscribe(&self) -> Result<TaskSubscription, ChainIoError>;
}
