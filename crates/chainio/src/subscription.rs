use std::future;

use avs_primitives::Task;
use tokio::{
    select,
    sync::{mpsc, oneshot},
    task::AbortHandle,
};
use tracing::debug;

use crate::errors::{FeedClosed, SubscriptionError};

/// What a live subscription produced next.
#[derive(Debug)]
pub enum SubscriptionEvent {
    Task(Task),
    Failed(SubscriptionError),
}

/// Consumer half of a task subscription.
///
/// Tasks arrive in delivery order over a bounded channel. The subscription fails at most once;
/// after [`TaskSubscription::next_error`] has resolved the subscription is dead. Tasks the feed
/// delivered before failing stay available through [`TaskSubscription::drain_buffered`].
///
/// Dropping the subscription stops the task driving the feed, if one is attached.
#[derive(Debug)]
pub struct TaskSubscription {
    tasks: mpsc::Receiver<Task>,
    error: Option<oneshot::Receiver<SubscriptionError>>,
    driver: Option<AbortHandle>,
}

/// Producer half of a task subscription, held by whatever drives the underlying event stream.
#[derive(Debug)]
pub struct TaskFeed {
    tasks: mpsc::Sender<Task>,
    error: oneshot::Sender<SubscriptionError>,
}

impl TaskFeed {
    /// Hands a task to the subscriber, waiting for buffer space.
    pub async fn deliver(&self, task: Task) -> Result<(), FeedClosed> {
        self.tasks.send(task).await.map_err(|_| FeedClosed)
    }

    /// Reports the terminal error and ends the feed.
    pub fn fail(self, error: SubscriptionError) {
        // Subscriber may already be gone.
        let _ = self.error.send(error);
    }

    pub fn is_closed(&self) -> bool {
        self.tasks.is_closed()
    }
}

impl TaskSubscription {
    /// Creates a connected feed/subscription pair with room for `capacity` undelivered tasks.
    ///
    /// Dropping the feed without calling [`TaskFeed::fail`] fails the subscription with
    /// [`SubscriptionError::Closed`].
    pub fn channel(capacity: usize) -> (TaskFeed, TaskSubscription) {
        let (task_tx, task_rx) = mpsc::channel(capacity.max(1));
        let (err_tx, err_rx) = oneshot::channel();
        let feed = TaskFeed {
            tasks: task_tx,
            error: err_tx,
        };
        let sub = TaskSubscription {
            tasks: task_rx,
            error: Some(err_rx),
            driver: None,
        };
        (feed, sub)
    }

    /// Attaches the task that drives the feed so it is stopped with the subscription.
    pub fn with_driver(mut self, driver: AbortHandle) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Next delivered task. Never resolves once the feed is gone and the buffer is empty.
    pub async fn next_task(&mut self) -> Task {
        recv_task(&mut self.tasks).await
    }

    /// Resolves once, with the subscription's terminal error. Pends forever afterwards.
    pub async fn next_error(&mut self) -> SubscriptionError {
        recv_error(&mut self.error).await
    }

    /// Next task or the terminal error, whichever is ready first. An error wins a tie.
    pub async fn next_event(&mut self) -> SubscriptionEvent {
        let Self { tasks, error, .. } = self;
        select! {
            biased;
            err = recv_error(error) => SubscriptionEvent::Failed(err),
            task = recv_task(tasks) => SubscriptionEvent::Task(task),
        }
    }

    /// Closes the task channel and returns everything still buffered in it, in delivery order.
    pub fn drain_buffered(&mut self) -> Vec<Task> {
        self.tasks.close();
        let mut buffered = Vec::new();
        while let Ok(task) = self.tasks.try_recv() {
            buffered.push(task);
        }
        buffered
    }

    /// Releases the subscription and stops its driver.
    pub fn unsubscribe(self) {
        debug!("unsubscribing from task events");
    }
}

impl Drop for TaskSubscription {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

async fn recv_task(tasks: &mut mpsc::Receiver<Task>) -> Task {
    match tasks.recv().await {
        Some(task) => task,
        None => future::pending().await,
    }
}

async fn recv_error(slot: &mut Option<oneshot::Receiver<SubscriptionError>>) -> SubscriptionError {
    let Some(rx) = slot.as_mut() else {
        return future::pending().await;
    };
    let err = rx.await.unwrap_or(SubscriptionError::Closed);
    *slot = None;
    err
}
