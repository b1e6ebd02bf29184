use std::time::Duration;

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{trace, warn};

use super::SearchId;
use crate::error::HostError;

const EVENT_CAPACITY: usize = 16;

/// How a find operation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindOutcome {
    Found,
    NotFound,
    Failed,
}

/// Published by a find engine when a search finishes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FindDone {
    pub search_id: SearchId,
    pub outcome: FindOutcome,
    pub cancelled: bool,
}

/// Completion event stream of a find engine.
#[derive(Debug, Clone)]
pub struct FindEvents {
    sender: broadcast::Sender<FindDone>,
}

impl Default for FindEvents {
    fn default() -> Self {
        Self::new()
    }
}

impl FindEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Subscribes to completion events. Dropping the subscription unsubscribes.
    pub fn subscribe(&self) -> FindDoneSubscription {
        trace!("subscribed to find completion events");
        FindDoneSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    /// Publishes `done`; returns how many subscribers received it.
    pub fn notify(&self, done: FindDone) -> usize {
        self.sender.send(done).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// An active subscription to [`FindEvents`].
pub struct FindDoneSubscription {
    receiver: broadcast::Receiver<FindDone>,
}

impl FindDoneSubscription {
    /// Waits for the completion event of `search_id`, ignoring events that
    /// belong to other searches.
    pub async fn wait_for(
        &mut self,
        search_id: SearchId,
        timeout: Duration,
    ) -> Result<FindDone, HostError> {
        let receiver = &mut self.receiver;
        let wait = async move {
            loop {
                match receiver.recv().await {
                    Ok(done) if done.search_id == search_id => return Ok(done),
                    Ok(other) => {
                        trace!(search = other.search_id.0, "ignoring completion of another search");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "find completion events were dropped");
                    }
                    Err(RecvError::Closed) => return Err(HostError::Unavailable("find engine")),
                }
            }
        };

        tokio::time::timeout(timeout, wait).await.map_err(|_| {
            HostError::failed(
                "find engine",
                format!("search {} did not complete within {:?}", search_id.0, timeout),
            )
        })?
    }
}

impl Drop for FindDoneSubscription {
    fn drop(&mut self) {
        trace!("unsubscribed from find completion events");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn done(id: u64) -> FindDone {
        FindDone {
            search_id: SearchId(id),
            outcome: FindOutcome::Found,
            cancelled: false,
        }
    }

    #[tokio::test]
    async fn test_wait_for_skips_other_searches() {
        let events = FindEvents::new();
        let mut subscription = events.subscribe();
        events.notify(done(1));
        events.notify(done(2));

        let received = subscription
            .wait_for(SearchId(2), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(received.search_id, SearchId(2));
    }

    #[tokio::test]
    async fn test_wait_for_times_out() {
        let events = FindEvents::new();
        let mut subscription = events.subscribe();
        let err = subscription
            .wait_for(SearchId(7), Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("did not complete"));
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let events = FindEvents::new();
        let subscription = events.subscribe();
        assert_eq!(events.subscriber_count(), 1);
        drop(subscription);
        assert_eq!(events.subscriber_count(), 0);
        assert_eq!(events.notify(done(1)), 0);
    }
}
