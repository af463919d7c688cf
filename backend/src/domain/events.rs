//! Consumers of committed domain events.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::ports::{DomainEventDispatcher, EventDispatchError};
use super::{ChannelName, DomainEvent, ExchangePayload, IntegrationGateway, SystemTag};

/// Channel carrying published domain events.
pub const DOMAIN_EVENTS_CHANNEL: &str = "domain-events";

/// Publishes each event as an [`ExchangePayload`] through the gateway,
/// normally on [`DOMAIN_EVENTS_CHANNEL`].
///
/// The payload type is the event name; `data` holds the entity id, the
/// occurrence time and the event payload.
pub struct GatewayEventDispatcher {
    gateway: IntegrationGateway,
    source: SystemTag,
    channel: ChannelName,
    clock: Arc<dyn Clock>,
}

impl GatewayEventDispatcher {
    /// Publish events sent by `source` on `channel`.
    pub fn new(
        gateway: IntegrationGateway,
        source: SystemTag,
        channel: ChannelName,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gateway,
            source,
            channel,
            clock,
        }
    }

    fn payload_for(&self, event: &DomainEvent) -> ExchangePayload {
        ExchangePayload::builder(self.source.clone(), event.name())
            .data("entityId", json!(event.entity_id().to_string()))
            .data("occurredAt", json!(event.occurred_at().to_rfc3339()))
            .data("payload", Value::Object(event.payload().clone()))
            .build(self.clock.as_ref())
    }
}

#[async_trait]
impl DomainEventDispatcher for GatewayEventDispatcher {
    async fn dispatch(&self, events: Vec<DomainEvent>) -> Result<(), EventDispatchError> {
        let mut undelivered = 0_usize;
        for event in &events {
            let payload = self.payload_for(event);
            if self.gateway.exchange(&payload, &self.channel).await.is_none() {
                undelivered += 1;
            }
        }
        if undelivered == 0 {
            Ok(())
        } else {
            Err(EventDispatchError::undelivered(undelivered))
        }
    }
}

/// Logs every event and drops it.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventDispatcher;

#[async_trait]
impl DomainEventDispatcher for TracingEventDispatcher {
    async fn dispatch(&self, events: Vec<DomainEvent>) -> Result<(), EventDispatchError> {
        for event in events {
            info!(
                event = event.name(),
                entity_id = %event.entity_id(),
                occurred_at = %event.occurred_at(),
                "domain event"
            );
        }
        Ok(())
    }
}

/// Hand `events` to `dispatcher`, logging rather than failing on errors.
///
/// Used after a commit: the write already happened, so a delivery failure
/// must not be reported as a failed write.
pub async fn publish_committed(dispatcher: &dyn DomainEventDispatcher, events: Vec<DomainEvent>) {
    if events.is_empty() {
        return;
    }
    if let Err(error) = dispatcher.dispatch(events).await {
        warn!(%error, "domain events were not fully published");
    }
}

#[cfg(test)]
mod tests {
    //! Event publication through the gateway.
    use super::*;
    use crate::domain::ports::{JobDispatchError, MockAuthBridge, MockQueueBridge};
    use crate::domain::{EntityId, MessageId};
    use chrono::{TimeZone, Utc};
    use mockable::MockClock;
    use rstest::{fixture, rstest};
    use serde_json::Map;

    #[fixture]
    fn clock() -> Arc<dyn Clock> {
        let mut clock = MockClock::new();
        let at = Utc
            .with_ymd_and_hms(2026, 3, 1, 9, 30, 0)
            .single()
            .expect("valid time");
        clock.expect_utc().return_const(at);
        Arc::new(clock)
    }

    fn event(clock: &dyn Clock, name: &str) -> DomainEvent {
        DomainEvent::new(name, EntityId::generate(), clock.utc(), Map::new())
    }

    fn dispatcher(queue: MockQueueBridge, clock: Arc<dyn Clock>) -> GatewayEventDispatcher {
        let gateway = IntegrationGateway::new(Arc::new(MockAuthBridge::new()), Arc::new(queue));
        let source = SystemTag::new("card-tracker").expect("valid tag");
        let channel = ChannelName::new(DOMAIN_EVENTS_CHANNEL).expect("valid channel");
        GatewayEventDispatcher::new(gateway, source, channel, clock)
    }

    #[rstest]
    #[tokio::test]
    async fn events_are_published_on_the_domain_channel(clock: Arc<dyn Clock>) {
        let mut queue = MockQueueBridge::new();
        queue
            .expect_dispatch()
            .withf(|channel, payload| {
                channel.as_str() == DOMAIN_EVENTS_CHANNEL
                    && payload["type"] == "collection_item.added"
                    && payload["source"] == "card-tracker"
            })
            .times(1)
            .returning(|_, _| Ok(Some(MessageId::new("1"))));
        let sut = dispatcher(queue, Arc::clone(&clock));

        let result = sut
            .dispatch(vec![event(clock.as_ref(), "collection_item.added")])
            .await;
        assert!(result.is_ok());
    }

    #[rstest]
    #[tokio::test]
    async fn undelivered_events_are_counted(clock: Arc<dyn Clock>) {
        let mut queue = MockQueueBridge::new();
        queue
            .expect_dispatch()
            .times(2)
            .returning(|_, _| Err(JobDispatchError::unavailable("down")));
        let sut = dispatcher(queue, Arc::clone(&clock));
        let events = vec![event(clock.as_ref(), "a"), event(clock.as_ref(), "b")];

        let err = sut.dispatch(events).await.expect_err("nothing delivered");
        assert_eq!(err, EventDispatchError::undelivered(2_usize));
    }

    #[rstest]
    #[tokio::test]
    async fn publishing_nothing_skips_the_dispatcher() {
        let dispatcher = crate::domain::ports::MockDomainEventDispatcher::new();
        publish_committed(&dispatcher, Vec::new()).await;
    }
}
