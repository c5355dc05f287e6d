use alloy::transports::TransportError;
use thiserror::Error;

/// Failure to reach the chain or to open a subscription.
#[derive(Debug, Error)]
pub enum ChainIoError {
    #[error("failed to connect to {url}: {source}")]
    Connect {
        url: String,
        #[source]
        source: TransportError,
    },

    #[error("failed to subscribe to task events: {0}")]
    Subscribe(#[source] TransportError),
}

/// Terminal failure of a live subscription.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The event stream ended, typically because the connection dropped.
    #[error("task event stream closed")]
    Closed,

    #[error("undecodable task event: {0}")]
    Decode(String),
}

/// The consuming side of a subscription has gone away.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("task subscription dropped")]
pub struct FeedClosed;
