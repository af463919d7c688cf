//! Domain port describing message dispatch to other systems.
use async_trait::async_trait;
use serde_json::Value;

use super::define_port_error;
use crate::domain::{ChannelName, MessageId};

define_port_error! {
    /// Errors surfaced by queue adapters.
    pub enum JobDispatchError {
        /// Queue infrastructure is unavailable.
        Unavailable { message: String } => "queue is unavailable: {message}",
        /// The message could not be acknowledged or persisted.
        Rejected { message: String } => "message was rejected: {message}",
    }
}

/// Transport accepting JSON messages on named channels.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueBridge: Send + Sync {
    /// Hand `payload` to the transport.
    ///
    /// Returns the transport's message identifier, or `Ok(None)` when the
    /// message was accepted but cannot be delivered anywhere.
    async fn dispatch(
        &self,
        channel: &ChannelName,
        payload: &Value,
    ) -> Result<Option<MessageId>, JobDispatchError>;
}
