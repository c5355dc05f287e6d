use avs_chainio::{ChainEventSource, SubscriptionEvent, TaskSubscription};
use avs_common::ShutdownSignal;
use avs_primitives::Task;
use tokio::{select, time::sleep};
use tracing::{debug, error, info, warn};

use crate::{
    errors::OperatorError, policy::ReconnectPolicy, processor::TaskProcessor, sink::ResponseSink,
};

/// Where the loop stands between iterations.
#[derive(Debug)]
pub enum LoopState {
    /// No live subscription; `attempt` consecutive tries have failed so far.
    Resubscribing { attempt: u32 },
    /// Consuming a live subscription. `failures` is the attempt count to resume from if it dies
    /// before delivering anything.
    Subscribed {
        subscription: TaskSubscription,
        failures: u32,
    },
}

/// Counters reported when the loop stops.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoopStats {
    pub responses: u64,
    pub abandoned: u64,
    pub resubscriptions: u64,
}

/// Single worker consuming task events strictly in delivery order.
///
/// A slow task holds up every task behind it. The subscription channel is bounded, so a backlog
/// pushes back onto the event source, which may drop events it cannot buffer.
#[derive(Debug)]
pub struct OperatorLoop<S, R> {
    source: S,
    processor: TaskProcessor,
    sink: R,
    policy: ReconnectPolicy,
    stats: LoopStats,
}

impl<S, R> OperatorLoop<S, R>
where
    S: ChainEventSource,
    R: ResponseSink,
{
    pub fn new(source: S, processor: TaskProcessor, sink: R, policy: ReconnectPolicy) -> Self {
        Self {
            source,
            processor,
            sink,
            policy,
            stats: LoopStats::default(),
        }
    }

    /// Runs until `shutdown` fires.
    ///
    /// Only the first subscription is allowed to fail the loop. Later failures are retried under
    /// the reconnect policy indefinitely.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> Result<LoopStats, OperatorError> {
        let subscription = self.source.subscribe().await?;
        info!("subscribed to new task events");

        let mut state = LoopState::Subscribed {
            subscription,
            failures: 0,
        };
        loop {
            let next = match state {
                LoopState::Resubscribing { attempt } => {
                    self.resubscribe(attempt, &mut shutdown).await
                }
                LoopState::Subscribed {
                    subscription,
                    failures,
                } => self.consume(subscription, failures, &mut shutdown).await,
            };
            match next {
                Some(next) => state = next,
                None => break,
            }
        }

        info!(
            responses = self.stats.responses,
            abandoned = self.stats.abandoned,
            resubscriptions = self.stats.resubscriptions,
            "operator loop stopped"
        );
        Ok(self.stats)
    }

    async fn resubscribe(
        &mut self,
        attempt: u32,
        shutdown: &mut ShutdownSignal,
    ) -> Option<LoopState> {
        let delay = self.policy.delay_for(attempt);
        if !delay.is_zero() {
            debug!(attempt, ?delay, "backing off before resubscribing");
            select! {
                biased;
                _ = shutdown.wait() => return None,
                _ = sleep(delay) => {}
            }
        }

        let result = select! {
            biased;
            _ = shutdown.wait() => return None,
            result = self.source.subscribe() => result,
        };

        match result {
            Ok(subscription) => {
                self.stats.resubscriptions += 1;
                info!(attempt, "resubscribed to new task events");
                Some(LoopState::Subscribed {
                    subscription,
                    failures: attempt + 1,
                })
            }
            Err(err) => {
                warn!(attempt, %err, "failed to resubscribe to new task events");
                Some(LoopState::Resubscribing {
                    attempt: attempt + 1,
                })
            }
        }
    }

    async fn consume(
        &mut self,
        mut subscription: TaskSubscription,
        mut failures: u32,
        shutdown: &mut ShutdownSignal,
    ) -> Option<LoopState> {
        loop {
            let event = select! {
                biased;
                _ = shutdown.wait() => None,
                event = subscription.next_event() => Some(event),
            };
            let Some(event) = event else {
                subscription.unsubscribe();
                return None;
            };

            match event {
                SubscriptionEvent::Task(task) => {
                    failures = 0;
                    self.handle_task(task).await;
                }
                SubscriptionEvent::Failed(err) => {
                    warn!(%err, "task subscription failed, resubscribing");
                    let buffered = subscription.drain_buffered();
                    subscription.unsubscribe();
                    if !buffered.is_empty() {
                        failures = 0;
                        debug!(count = buffered.len(), "processing tasks buffered before failure");
                    }
                    for task in buffered {
                        if shutdown.is_triggered() {
                            return None;
                        }
                        self.handle_task(task).await;
                    }
                    return Some(LoopState::Resubscribing { attempt: failures });
                }
            }
        }
    }

    async fn handle_task(&mut self, task: Task) {
        let task_index = task.index;
        let proving_system_id = task.proving_system_id;
        match self.processor.process(task).await {
            Ok(response) => {
                self.stats.responses += 1;
                if let Err(err) = self.sink.submit(response).await {
                    error!(task_index, %err, "failed to submit task response");
                }
            }
            Err(err) => {
                self.stats.abandoned += 1;
                warn!(
                    task_index,
                    proving_system_id,
                    error_kind = err.kind(),
                    %err,
                    "task abandoned"
                );
            }
        }
    }
}
