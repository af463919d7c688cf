//! Redis list-backed queue adapter.

use async_trait::async_trait;
use bb8_redis::redis::AsyncCommands;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::ports::{JobDispatchError, QueueBridge};
use crate::domain::{ChannelName, MessageId};
use crate::outbound::redis::{RedisPool, RedisPoolError};

/// Pushes `{id, payload}` envelopes onto the Redis list `queue:<channel>`.
///
/// Consumers `BRPOP` the list, so messages are processed in send order.
#[derive(Clone)]
pub struct RedisQueueBridge {
    pool: RedisPool,
}

impl RedisQueueBridge {
    /// Dispatch through `pool`.
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    fn list_key(channel: &ChannelName) -> String {
        format!("queue:{channel}")
    }
}

impl From<RedisPoolError> for JobDispatchError {
    fn from(err: RedisPoolError) -> Self {
        Self::unavailable(err.to_string())
    }
}

#[async_trait]
impl QueueBridge for RedisQueueBridge {
    async fn dispatch(
        &self,
        channel: &ChannelName,
        payload: &Value,
    ) -> Result<Option<MessageId>, JobDispatchError> {
        let id = Uuid::new_v4().to_string();
        let envelope = serde_json::json!({ "id": id, "payload": payload });
        let mut conn = self.pool.get().await?;
        let _: u64 = conn
            .lpush(Self::list_key(channel), envelope.to_string())
            .await
            .map_err(|err| JobDispatchError::rejected(err.to_string()))?;
        Ok(Some(MessageId::new(id)))
    }
}
