use async_trait::async_trait;
use avs_primitives::SignedResponse;
use tokio::sync::mpsc;
use tracing::info;

use crate::errors::SinkError;

/// Destination for signed responses, standing in for the aggregator client.
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait ResponseSink: Send + Sync {
    async fn submit(&self, response: SignedResponse) -> Result<(), SinkError>;
}

/// Logs each response. Used when no aggregator is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

#[async_trait]
impl ResponseSink for LoggingSink {
    async fn submit(&self, response: SignedResponse) -> Result<(), SinkError> {
        info!(
            task_index = response.task_index(),
            is_valid = response.outcome.is_valid,
            digest = %response.digest,
            signature = %response.signature,
            operator = %response.signer.address,
            "signed task response"
        );
        Ok(())
    }
}

#[async_trait]
impl ResponseSink for mpsc::Sender<SignedResponse> {
    async fn submit(&self, response: SignedResponse) -> Result<(), SinkError> {
        self.send(response).await.map_err(|_| SinkError::Closed)
    }
}
