//! Typed channel carrying selections from embedded scenes to host pages

use shared::SceneMessage;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::error::SelectionError;

const DEFAULT_CAPACITY: usize = 64;

/// Fan-out of [`SceneMessage`]s to every live [`Subscription`]
#[derive(Debug, Clone)]
pub struct SelectionChannel {
    tx: broadcast::Sender<SceneMessage>,
}

impl Default for SelectionChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SelectionChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Deliver `msg` to all current subscribers; returns how many received it.
    pub fn publish(&self, msg: SceneMessage) -> Result<usize, SelectionError> {
        if msg.object_id().is_empty() {
            return Err(SelectionError::EmptyObjectId);
        }
        tracing::debug!("Selection published: {}", msg.object_id());
        // send only fails when there are no receivers
        Ok(self.tx.send(msg).unwrap_or(0))
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// A live subscription. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<SceneMessage>,
}

impl Subscription {
    /// Next message, or `None` once the channel is gone.
    /// Messages missed by a slow subscriber are skipped.
    pub async fn recv(&mut self) -> Option<SceneMessage> {
        loop {
            match self.rx.recv().await {
                Ok(msg) => return Some(msg),
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!("Selection subscriber lagged, skipped {n} messages");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next message if one is already queued
    pub fn try_recv(&mut self) -> Option<SceneMessage> {
        loop {
            match self.rx.try_recv() {
                Ok(msg) => return Some(msg),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_without_subscribers() {
        let channel = SelectionChannel::default();
        assert_eq!(channel.publish(SceneMessage::selection("box")), Ok(0));
    }

    #[test]
    fn test_empty_object_id_rejected() {
        let channel = SelectionChannel::default();
        let mut sub = channel.subscribe();
        assert_eq!(
            channel.publish(SceneMessage::selection("")),
            Err(SelectionError::EmptyObjectId)
        );
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_fan_out_to_all_subscribers() {
        let channel = SelectionChannel::default();
        let mut a = channel.subscribe();
        let mut b = channel.subscribe();

        assert_eq!(channel.publish(SceneMessage::selection("sphere")), Ok(2));
        assert_eq!(a.recv().await, Some(SceneMessage::selection("sphere")));
        assert_eq!(b.recv().await, Some(SceneMessage::selection("sphere")));
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let channel = SelectionChannel::default();
        let a = channel.subscribe();
        let mut b = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);

        a.unsubscribe();
        assert_eq!(channel.subscriber_count(), 1);
        assert_eq!(channel.publish(SceneMessage::selection("box")), Ok(1));
        assert_eq!(b.try_recv(), Some(SceneMessage::selection("box")));
    }

    #[test]
    fn test_late_subscriber_misses_earlier_messages() {
        let channel = SelectionChannel::default();
        let _early = channel.subscribe();
        channel.publish(SceneMessage::selection("first")).unwrap();

        let mut late = channel.subscribe();
        assert_eq!(late.try_recv(), None);
    }

    #[test]
    fn test_lagging_subscriber_skips_to_newest() {
        let channel = SelectionChannel::new(2);
        let mut sub = channel.subscribe();
        for id in ["a", "b", "c", "d"] {
            channel.publish(SceneMessage::selection(id)).unwrap();
        }
        assert_eq!(sub.try_recv(), Some(SceneMessage::selection("c")));
        assert_eq!(sub.try_recv(), Some(SceneMessage::selection("d")));
        assert_eq!(sub.try_recv(), None);
    }
}
