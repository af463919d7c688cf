//! Port receiving domain events once their unit of work has committed.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::DomainEvent;

define_port_error! {
    /// Errors surfaced by event dispatchers.
    pub enum EventDispatchError {
        /// Some events could not be handed on.
        Undelivered { count: usize } => "{count} domain event(s) were not delivered",
    }
}

/// Consumer of committed domain events.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DomainEventDispatcher: Send + Sync {
    /// Deliver events in the order they were raised.
    async fn dispatch(&self, events: Vec<DomainEvent>) -> Result<(), EventDispatchError>;
}
