//! Queue adapter that keeps messages in memory.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{JobDispatchError, QueueBridge};
use crate::domain::{ChannelName, MessageId};

/// Message accepted by [`InMemoryQueueBridge`].
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedMessage {
    /// Identifier handed back to the sender.
    pub id: MessageId,
    /// Message body.
    pub payload: Value,
}

/// Records dispatched messages per channel, in arrival order.
#[derive(Debug, Default)]
pub struct InMemoryQueueBridge {
    channels: DashMap<ChannelName, Vec<QueuedMessage>>,
}

impl InMemoryQueueBridge {
    /// Empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent on `channel` so far.
    #[must_use]
    pub fn messages(&self, channel: &ChannelName) -> Vec<QueuedMessage> {
        self.channels
            .get(channel)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Remove and return the messages sent on `channel`.
    pub fn drain(&self, channel: &ChannelName) -> Vec<QueuedMessage> {
        self.channels
            .remove(channel)
            .map(|(_, messages)| messages)
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueueBridge for InMemoryQueueBridge {
    async fn dispatch(
        &self,
        channel: &ChannelName,
        payload: &Value,
    ) -> Result<Option<MessageId>, JobDispatchError> {
        let id = MessageId::new(Uuid::new_v4().to_string());
        self.channels
            .entry(channel.clone())
            .or_default()
            .push(QueuedMessage {
                id: id.clone(),
                payload: payload.clone(),
            });
        Ok(Some(id))
    }
}
