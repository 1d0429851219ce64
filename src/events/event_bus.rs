use super::types::{Notification, NotificationEvent};
use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::trace;

/// Notification subscriber handle
pub struct NotificationSubscriber {
    receiver: broadcast::Receiver<NotificationEvent>,
}

impl NotificationSubscriber {
    pub fn new(receiver: broadcast::Receiver<NotificationEvent>) -> Self {
        Self { receiver }
    }

    /// Receive the next notification. Lagging is reported as an error so the
    /// caller can decide whether to keep going.
    pub async fn recv(&mut self) -> Result<NotificationEvent, broadcast::error::RecvError> {
        self.receiver.recv().await
    }
}

/// Broadcast bus carrying host notifications to the router
#[derive(Debug)]
pub struct NotificationBus {
    sender: broadcast::Sender<NotificationEvent>,
    stats: Arc<RwLock<NotificationBusStats>>,
    history: Arc<RwLock<Vec<NotificationEvent>>>,
    max_history_size: usize,
}

#[derive(Debug, Default, Clone)]
pub struct NotificationBusStats {
    pub total_events: u64,
    pub events_by_kind: HashMap<String, u64>,
    pub subscriber_count: usize,
    pub dropped_events: u64,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);

        Self {
            sender,
            stats: Arc::new(RwLock::new(NotificationBusStats::default())),
            history: Arc::new(RwLock::new(Vec::new())),
            max_history_size: 100, // Keep last 100 notifications for debugging
        }
    }

    pub async fn publish(&self, notification: Notification) -> Result<()> {
        let event = NotificationEvent::new(notification);
        trace!("Publishing notification: {}", event.notification.as_str());

        {
            let mut stats = self.stats.write().await;
            stats.total_events += 1;
            *stats
                .events_by_kind
                .entry(event.notification.as_str().to_string())
                .or_insert(0) += 1;
        }

        {
            let mut history = self.history.write().await;
            history.push(event.clone());

            if history.len() > self.max_history_size {
                let excess = history.len() - self.max_history_size;
                history.drain(0..excess);
            }
        }

        if self.sender.send(event).is_err() {
            // No subscribers is normal, don't log
            self.stats.write().await.dropped_events += 1;
        }
        Ok(())
    }

    pub fn subscribe(&self) -> NotificationSubscriber {
        NotificationSubscriber::new(self.sender.subscribe())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub async fn get_stats(&self) -> NotificationBusStats {
        let stats = self.stats.read().await;
        NotificationBusStats {
            subscriber_count: self.subscriber_count(),
            ..stats.clone()
        }
    }

    pub async fn get_history(&self) -> Vec<NotificationEvent> {
        self.history.read().await.clone()
    }
}
