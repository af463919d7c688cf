//! Cross-system messaging and identity seam.
//!
//! Any layer that needs to publish a payload to another subsystem, or to
//! learn who the current caller is, goes through [`IntegrationGateway`]. The
//! gateway only knows the [`AuthBridge`] and [`QueueBridge`] ports, never the
//! concrete transport or identity scheme behind them.

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error as ThisError;
use tracing::{debug, warn};

use super::ports::{AuthBridge, QueueBridge};
use super::value_object::{
    ValueObject, ValueObjectError, require_max_chars, require_trimmed, value_object,
};
use super::{AuthenticatedUser, BearerToken, Error};

const NAME_MAX: usize = 64;
const CREATED_AT_KEY: &str = "created_at";

fn require_slug(kind: &'static str, raw: &str) -> Result<(), ValueObjectError> {
    require_trimmed(kind, raw)?;
    require_max_chars(kind, raw, NAME_MAX)?;
    let allowed = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.');
    if raw.chars().all(allowed) {
        Ok(())
    } else {
        Err(ValueObjectError::Invalid {
            kind,
            reason: "may only contain lower-case letters, digits and - _ .",
        })
    }
}

value_object! {
    /// Queue channel such as `domain-events`.
    pub struct ChannelName;
}

impl ValueObject for ChannelName {
    const KIND: &'static str = "channel name";

    fn validate(raw: &str) -> Result<(), ValueObjectError> {
        require_slug(Self::KIND, raw)
    }
}

value_object! {
    /// Name of a participating system such as `card-tracker`.
    pub struct SystemTag;
}

impl ValueObject for SystemTag {
    const KIND: &'static str = "system tag";

    fn validate(raw: &str) -> Result<(), ValueObjectError> {
        require_slug(Self::KIND, raw)
    }
}

/// Identifier returned by a queue transport for an accepted message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    /// Wrap a transport-issued identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reasons a serialised exchange payload could not be read back.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum ExchangePayloadError {
    /// Document is not a JSON object of the expected shape.
    #[error("malformed exchange payload: {message}")]
    Malformed {
        /// Decoder message.
        message: String,
    },
    /// A tag failed validation.
    #[error(transparent)]
    InvalidTag(#[from] ValueObjectError),
}

#[derive(Deserialize)]
struct WirePayload {
    source: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Map<String, Value>,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    metadata: Map<String, Value>,
}

/// Message exchanged with another system. Immutable once built.
///
/// # Examples
/// ```
/// use card_tracker::domain::{ExchangePayload, SystemTag};
/// use mockable::DefaultClock;
/// use serde_json::json;
///
/// let source = SystemTag::new("card-tracker").expect("valid tag");
/// let payload = ExchangePayload::builder(source, "price.requested")
///     .data("setCode", json!("LEA"))
///     .build(&DefaultClock);
/// assert!(payload.metadata().contains_key("created_at"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangePayload {
    source: SystemTag,
    kind: String,
    data: Map<String, Value>,
    target: Option<SystemTag>,
    metadata: Map<String, Value>,
}

/// Builder for [`ExchangePayload`].
#[derive(Debug, Clone)]
pub struct ExchangePayloadBuilder {
    source: SystemTag,
    kind: String,
    data: Map<String, Value>,
    target: Option<SystemTag>,
    metadata: Map<String, Value>,
}

impl ExchangePayloadBuilder {
    /// Set one data attribute.
    #[must_use]
    pub fn data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }

    /// Replace every data attribute.
    #[must_use]
    pub fn data_map(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }

    /// Address the payload to one system.
    #[must_use]
    pub fn target(mut self, target: SystemTag) -> Self {
        self.target = Some(target);
        self
    }

    /// Set one metadata attribute.
    #[must_use]
    pub fn metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Freeze the payload, stamping `created_at` unless already present.
    pub fn build(self, clock: &dyn Clock) -> ExchangePayload {
        let mut metadata = self.metadata;
        if !metadata.contains_key(CREATED_AT_KEY) {
            metadata.insert(
                CREATED_AT_KEY.to_owned(),
                Value::String(timestamp(clock.utc())),
            );
        }
        ExchangePayload {
            source: self.source,
            kind: self.kind,
            data: self.data,
            target: self.target,
            metadata,
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl ExchangePayload {
    /// Start a payload of type `kind` sent by `source`.
    pub fn builder(source: SystemTag, kind: impl Into<String>) -> ExchangePayloadBuilder {
        ExchangePayloadBuilder {
            source,
            kind: kind.into(),
            data: Map::new(),
            target: None,
            metadata: Map::new(),
        }
    }

    /// Sending system.
    #[must_use]
    pub const fn source(&self) -> &SystemTag {
        &self.source
    }

    /// Message type.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Message body.
    #[must_use]
    pub const fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Addressed system, if any.
    #[must_use]
    pub const fn target(&self) -> Option<&SystemTag> {
        self.target.as_ref()
    }

    /// Envelope metadata, always including `created_at`.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Wire document `{source, type, data, target?, metadata}`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert("source".to_owned(), Value::String(self.source.to_string()));
        object.insert("type".to_owned(), Value::String(self.kind.clone()));
        object.insert("data".to_owned(), Value::Object(self.data.clone()));
        if let Some(target) = &self.target {
            object.insert("target".to_owned(), Value::String(target.to_string()));
        }
        object.insert("metadata".to_owned(), Value::Object(self.metadata.clone()));
        Value::Object(object)
    }

    /// Read a wire document back, stamping `created_at` if it is missing.
    ///
    /// # Errors
    /// Returns [`ExchangePayloadError`] for malformed documents or invalid tags.
    pub fn from_json(value: Value, clock: &dyn Clock) -> Result<Self, ExchangePayloadError> {
        let wire: WirePayload =
            serde_json::from_value(value).map_err(|err| ExchangePayloadError::Malformed {
                message: err.to_string(),
            })?;
        let mut builder = Self::builder(SystemTag::new(wire.source)?, wire.kind).data_map(wire.data);
        if let Some(target) = wire.target {
            builder = builder.target(SystemTag::new(target)?);
        }
        for (key, value) in wire.metadata {
            builder = builder.metadata(key, value);
        }
        Ok(builder.build(clock))
    }
}

/// Facade over the identity and queue bridges.
///
/// Queue failures are logged and reported as "not dispatched" so callers
/// never fail because a downstream system is unavailable. Identity failures
/// surface as [`Error`]s: answering "who is calling" wrongly is not an
/// acceptable degradation.
#[derive(Clone)]
pub struct IntegrationGateway {
    auth: Arc<dyn AuthBridge>,
    queue: Arc<dyn QueueBridge>,
}

impl IntegrationGateway {
    /// Compose a gateway from its two bridges.
    pub fn new(auth: Arc<dyn AuthBridge>, queue: Arc<dyn QueueBridge>) -> Self {
        Self { auth, queue }
    }

    /// Identity bridge.
    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthBridge> {
        &self.auth
    }

    /// Queue bridge.
    #[must_use]
    pub fn queue(&self) -> &Arc<dyn QueueBridge> {
        &self.queue
    }

    /// Replace the identity bridge, keeping the queue.
    #[must_use]
    pub fn with_auth(&self, auth: Arc<dyn AuthBridge>) -> Self {
        Self {
            auth,
            queue: Arc::clone(&self.queue),
        }
    }

    /// Caller bound to the ambient context.
    ///
    /// # Errors
    /// Propagates identity provider failures.
    pub async fn current_user(&self) -> Result<Option<AuthenticatedUser>, Error> {
        Ok(self.auth.current_user().await?)
    }

    /// Resolve a bearer token.
    ///
    /// # Errors
    /// Propagates identity provider failures.
    pub async fn validate_token(
        &self,
        token: &BearerToken,
    ) -> Result<Option<AuthenticatedUser>, Error> {
        Ok(self.auth.validate_token(token).await?)
    }

    /// Whether a caller is bound to the ambient context.
    ///
    /// # Errors
    /// Propagates identity provider failures.
    pub async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(self.auth.is_authenticated().await?)
    }

    /// Send a raw JSON document; `None` when it was not dispatched.
    pub async fn dispatch(&self, channel: &ChannelName, payload: &Value) -> Option<MessageId> {
        match self.queue.dispatch(channel, payload).await {
            Ok(Some(id)) => {
                debug!(channel = %channel, message_id = %id, "message dispatched");
                Some(id)
            }
            Ok(None) => {
                warn!(channel = %channel, "message accepted but not deliverable");
                None
            }
            Err(error) => {
                warn!(channel = %channel, %error, "message dispatch failed");
                None
            }
        }
    }

    /// Serialise `payload` and dispatch it on `channel`.
    pub async fn exchange(
        &self,
        payload: &ExchangePayload,
        channel: &ChannelName,
    ) -> Option<MessageId> {
        self.dispatch(channel, &payload.to_json()).await
    }
}

#[cfg(test)]
mod tests {
    //! Payload shape and gateway degradation.
    use super::*;
    use crate::domain::ports::{AuthBridgeError, JobDispatchError, MockAuthBridge, MockQueueBridge};
    use chrono::TimeZone;
    use mockable::MockClock;
    use rstest::{fixture, rstest};
    use serde_json::json;

    #[fixture]
    fn clock() -> MockClock {
        let mut clock = MockClock::new();
        let at = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .expect("valid time");
        clock.expect_utc().return_const(at);
        clock
    }

    fn tag(raw: &str) -> SystemTag {
        SystemTag::new(raw).expect("valid tag")
    }

    fn channel(raw: &str) -> ChannelName {
        ChannelName::new(raw).expect("valid channel")
    }

    fn gateway(auth: MockAuthBridge, queue: MockQueueBridge) -> IntegrationGateway {
        IntegrationGateway::new(Arc::new(auth), Arc::new(queue))
    }

    #[rstest]
    fn build_stamps_created_at(clock: MockClock) {
        let payload = ExchangePayload::builder(tag("card-tracker"), "ping").build(&clock);
        assert_eq!(
            payload.metadata().get("created_at"),
            Some(&json!("2026-03-01T12:00:00.000Z"))
        );
    }

    #[rstest]
    fn build_keeps_supplied_created_at(clock: MockClock) {
        let payload = ExchangePayload::builder(tag("card-tracker"), "ping")
            .metadata("created_at", json!("earlier"))
            .build(&clock);
        assert_eq!(payload.metadata().get("created_at"), Some(&json!("earlier")));
    }

    #[rstest]
    fn json_shape_uses_type_key(clock: MockClock) {
        let payload = ExchangePayload::builder(tag("card-tracker"), "price.requested")
            .data("setCode", json!("LEA"))
            .target(tag("pricing"))
            .build(&clock);
        let value = payload.to_json();
        assert_eq!(value["type"], json!("price.requested"));
        assert_eq!(value["source"], json!("card-tracker"));
        assert_eq!(value["target"], json!("pricing"));
        assert_eq!(value["data"], json!({"setCode": "LEA"}));

        let restored = ExchangePayload::from_json(value, &clock).expect("decode");
        assert_eq!(restored, payload);
    }

    #[rstest]
    fn untargeted_payloads_omit_target(clock: MockClock) {
        let value = ExchangePayload::builder(tag("card-tracker"), "ping")
            .build(&clock)
            .to_json();
        assert!(value.get("target").is_none());
    }

    #[rstest]
    #[case(json!({"type": "x"}))]
    #[case(json!({"source": "Bad Tag", "type": "x"}))]
    fn malformed_documents_are_rejected(clock: MockClock, #[case] value: Value) {
        assert!(ExchangePayload::from_json(value, &clock).is_err());
    }

    #[rstest]
    #[case("domain-events", true)]
    #[case("Prices", false)]
    #[case("two words", false)]
    fn channel_names_are_slugs(#[case] raw: &str, #[case] ok: bool) {
        assert_eq!(ChannelName::new(raw).is_ok(), ok);
    }

    #[rstest]
    #[tokio::test]
    async fn exchange_returns_transport_id(clock: MockClock) {
        let mut queue = MockQueueBridge::new();
        queue
            .expect_dispatch()
            .withf(|channel, payload| channel.as_str() == "prices" && payload["type"] == "ping")
            .times(1)
            .returning(|_, _| Ok(Some(MessageId::new("m-1"))));
        let gateway = gateway(MockAuthBridge::new(), queue);
        let payload = ExchangePayload::builder(tag("card-tracker"), "ping").build(&clock);

        let id = gateway.exchange(&payload, &channel("prices")).await;
        assert_eq!(id, Some(MessageId::new("m-1")));
    }

    #[rstest]
    #[tokio::test]
    async fn queue_failures_degrade_to_none() {
        let mut queue = MockQueueBridge::new();
        queue
            .expect_dispatch()
            .returning(|_, _| Err(JobDispatchError::unavailable("redis down")));
        let gateway = gateway(MockAuthBridge::new(), queue);

        assert!(gateway.dispatch(&channel("prices"), &json!({})).await.is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn identity_failures_surface_as_errors() {
        let mut auth = MockAuthBridge::new();
        auth.expect_current_user()
            .returning(|| Err(AuthBridgeError::unavailable("idp down")));
        let gateway = gateway(auth, MockQueueBridge::new());

        let err = gateway.current_user().await.expect_err("provider failure");
        assert_eq!(err.code(), crate::domain::ErrorCode::ServiceUnavailable);
    }
}
