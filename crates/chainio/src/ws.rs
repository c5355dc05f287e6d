use std::fmt;

use alloy::{
    primitives::Address,
    providers::{DynProvider, Provider, ProviderBuilder, WsConnect},
    pubsub::Subscription,
    rpc::types::{Filter, Log},
    signers::local::PrivateKeySigner,
    sol_types::SolEvent,
};
use async_trait::async_trait;
use avs_primitives::Task;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::{
    bindings::NewTaskCreated,
    errors::{ChainIoError, SubscriptionError},
    source::ChainEventSource,
    subscription::{TaskFeed, TaskSubscription},
};

/// Task event source backed by a websocket connection to an execution node.
///
/// Each subscription spawns a driver that forwards decoded `NewTaskCreated` logs emitted by the
/// service manager into a bounded channel. While the channel is full the driver stops reading,
/// and the node side buffer can overflow; overflow is reported as a lag warning with the number
/// of events lost.
#[derive(Clone)]
pub struct WsTaskEventSource {
    provider: DynProvider,
    service_manager: Address,
    buffer: usize,
}

impl fmt::Debug for WsTaskEventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsTaskEventSource")
            .field("service_manager", &self.service_manager)
            .field("buffer", &self.buffer)
            .finish_non_exhaustive()
    }
}

impl WsTaskEventSource {
    /// Connects with `tx_signer` as the provider wallet, so transactions sent through this
    /// connection are signed by the operator.
    pub async fn connect(
        ws_url: &str,
        service_manager: Address,
        buffer: usize,
        tx_signer: PrivateKeySigner,
    ) -> Result<Self, ChainIoError> {
        let provider = ProviderBuilder::new()
            .wallet(tx_signer)
            .connect_ws(WsConnect::new(ws_url))
            .await
            .map_err(|source| ChainIoError::Connect {
                url: ws_url.to_owned(),
                source,
            })?;
        info!(%ws_url, %service_manager, "connected to chain");

        Ok(Self {
            provider: provider.erased(),
            service_manager,
            buffer,
        })
    }

    fn filter(&self) -> Filter {
        Filter::new()
            .address(self.service_manager)
            .event_signature(NewTaskCreated::SIGNATURE_HASH)
    }
}

#[async_trait]
impl ChainEventSource for WsTaskEventSource {
    async fn subscribe(&self) -> Result<TaskSubscription, ChainIoError> {
        let logs = self
            .provider
            .subscribe_logs(&self.filter())
            .await
            .map_err(ChainIoError::Subscribe)?;
        debug!(service_manager = %self.service_manager, "subscribed to task events");

        let (feed, sub) = TaskSubscription::channel(self.buffer);
        let driver = tokio::spawn(forward_logs(logs, feed));
        Ok(sub.with_driver(driver.abort_handle()))
    }
}

async fn forward_logs(mut logs: Subscription<Log>, feed: TaskFeed) {
    loop {
        match logs.recv().await {
            Ok(log) => match decode_task(&log) {
                Ok(task) => {
                    if feed.deliver(task).await.is_err() {
                        debug!("task subscription dropped, stopping log forwarder");
                        return;
                    }
                }
                Err(err) => {
                    warn!(%err, tx_hash = ?log.transaction_hash, "failed to decode task event");
                    feed.fail(err);
                    return;
                }
            },
            Err(RecvError::Lagged(missed)) => {
                warn!(%missed, "task event stream lagged, events were lost");
            }
            Err(RecvError::Closed) => {
                feed.fail(SubscriptionError::Closed);
                return;
            }
        }
    }
}

fn decode_task(log: &Log) -> Result<Task, SubscriptionError> {
    let decoded = log
        .log_decode::<NewTaskCreated>()
        .map_err(|e| SubscriptionError::Decode(e.to_string()))?;
    Ok(decoded.inner.data.into())
}
