//! Queue adapter used when no transport is configured.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use crate::domain::ports::{JobDispatchError, QueueBridge};
use crate::domain::{ChannelName, MessageId};

/// Reports every message as undeliverable.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubQueueBridge;

#[async_trait]
impl QueueBridge for StubQueueBridge {
    async fn dispatch(
        &self,
        channel: &ChannelName,
        _payload: &Value,
    ) -> Result<Option<MessageId>, JobDispatchError> {
        warn!(%channel, "no queue transport configured; message dropped");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    //! Undeliverable stub behaviour.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[tokio::test]
    async fn stub_never_delivers() {
        let channel = ChannelName::new("prices").expect("valid channel");
        let id = StubQueueBridge
            .dispatch(&channel, &json!({}))
            .await
            .expect("dispatch");
        assert!(id.is_none());
    }
}
