//! Outbound messaging for signed-in callers.
//!
//! ```text
//! POST /api/v1/exchange/{channel} {"type":"price.requested","data":{"setCode":"LEA"}}
//! ```
//!
//! The caller comes from the session cookie or, failing that, an
//! `Authorization: Bearer` header.

use std::sync::Arc;

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, post, web};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use crate::domain::{
    AuthenticatedUser, BearerToken, ChannelName, Error, ExchangePayload, FieldErrors, Failure,
    IntegrationGateway, SystemTag,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::controller::validate_required;
use crate::inbound::http::response::ApiResponse;
use crate::inbound::http::schemas::{ExchangeEnvelope, FailureEnvelope};
use crate::inbound::http::session::{SessionAuthBridge, SessionContext};
use crate::inbound::http::state::HttpState;

/// Metadata key naming the user who submitted a payload.
pub const SUBMITTED_BY_KEY: &str = "submitted_by";

/// Body of `POST /exchange/{channel}`, documentation only.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ExchangeRequest {
    /// Message type, e.g. `price.requested`.
    #[serde(rename = "type")]
    #[schema(rename = "type", example = "price.requested")]
    pub kind: String,
    /// Message body.
    #[schema(value_type = Object)]
    pub data: Option<Map<String, Value>>,
    /// Receiving system, when addressed to one.
    #[schema(example = "price-service")]
    pub target: Option<String>,
    /// Extra metadata; `created_at` and `submitted_by` are filled in.
    #[schema(value_type = Object)]
    pub metadata: Option<Map<String, Value>>,
}

async fn caller(
    state: &HttpState,
    session: &SessionContext,
    req: &HttpRequest,
) -> Result<(IntegrationGateway, AuthenticatedUser), Error> {
    let bridge = SessionAuthBridge::from_session(session, Arc::clone(state.gateway.auth()))?;
    let gateway = state.gateway.with_auth(Arc::new(bridge));
    if let Some(user) = gateway.current_user().await? {
        return Ok((gateway, user));
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(BearerToken::from_authorization_header);
    let user = match token {
        Some(token) => gateway.validate_token(&token).await?,
        None => None,
    };
    user.map(|user| (gateway, user))
        .ok_or_else(|| Error::unauthorized("login required"))
}

fn object(payload: &Value, field: &str, errors: &mut FieldErrors) -> Map<String, Value> {
    match payload.get(field) {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            errors.insert(field.to_owned(), "must be an object".to_owned());
            Map::new()
        }
    }
}

fn build_payload(
    state: &HttpState,
    user: &AuthenticatedUser,
    body: &Value,
) -> Result<ExchangePayload, Failure> {
    validate_required(body, &["type"])?;

    let mut errors = FieldErrors::new();
    let kind = match body.get("type") {
        Some(Value::String(kind)) => kind.clone(),
        _ => {
            errors.insert("type".to_owned(), "must be a string".to_owned());
            String::new()
        }
    };
    let data = object(body, "data", &mut errors);
    let metadata = object(body, "metadata", &mut errors);
    let target = match body.get("target") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => SystemTag::new(raw.as_str())
            .map_err(|err| errors.insert("target".to_owned(), err.to_string()))
            .ok(),
        Some(_) => {
            errors.insert("target".to_owned(), "must be a string".to_owned());
            None
        }
    };
    if !errors.is_empty() {
        return Err(Failure::validation("Validation failed", errors));
    }

    let mut builder = ExchangePayload::builder(state.source.clone(), kind).data_map(data);
    if let Some(target) = target {
        builder = builder.target(target);
    }
    for (key, value) in metadata {
        builder = builder.metadata(key, value);
    }
    Ok(builder
        .metadata(SUBMITTED_BY_KEY, json!(user.id().as_str()))
        .build(state.clock.as_ref()))
}

/// Dispatch an exchange payload on `channel`.
///
/// `202` carries the transport's message id; `503` means the message could
/// not be delivered and may be retried.
#[utoipa::path(
    post,
    path = "/api/v1/exchange/{channel}",
    params(("channel" = String, Path, description = "Queue channel, e.g. `price-requests`")),
    request_body = ExchangeRequest,
    responses(
        (status = 202, description = "Message accepted", body = ExchangeEnvelope),
        (status = 400, description = "Malformed channel or body", body = FailureEnvelope),
        (status = 401, description = "No session or bearer token", body = FailureEnvelope),
        (status = 422, description = "Invalid payload fields", body = FailureEnvelope),
        (status = 503, description = "Message could not be delivered", body = FailureEnvelope)
    ),
    tags = ["exchange"],
    operation_id = "dispatchExchange"
)]
#[post("/exchange/{channel}")]
pub async fn dispatch_exchange(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<Value>,
) -> ApiResult<ApiResponse> {
    let channel = ChannelName::new(path.as_str())
        .map_err(|err| Error::invalid_request(format!("invalid channel: {err}")))?;
    let (gateway, user) = caller(&state, &session, &req).await?;
    let payload = match build_payload(&state, &user, &body) {
        Ok(payload) => payload,
        Err(failure) => return Ok(ApiResponse::from_error(&failure)),
    };

    let message_id = gateway
        .exchange(&payload, &channel)
        .await
        .ok_or_else(|| Error::service_unavailable("message could not be delivered"))?;
    info!(channel = %channel, message_id = %message_id, kind = payload.kind(), "exchange accepted");
    ApiResponse::success(
        &json!({ "messageId": message_id.as_str() }),
        Some("Message accepted"),
        StatusCode::ACCEPTED,
    )
}

#[cfg(test)]
mod tests {
    //! Exchange dispatch handler.
    use super::*;
    use crate::domain::ports::{JobDispatchError, MockQueueBridge};
    use crate::inbound::http::auth::sign_in;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use crate::test_support::{InMemoryHarness, TEST_TOKEN};
    use actix_web::{App, test as actix_test};
    use rstest::rstest;

    macro_rules! app {
        ($state:expr) => {
            actix_test::init_service(
                App::new().app_data(web::Data::new($state)).service(
                    web::scope("/api/v1")
                        .wrap(test_session_middleware())
                        .service(sign_in)
                        .service(dispatch_exchange),
                ),
            )
            .await
        };
    }

    fn channel(raw: &str) -> ChannelName {
        ChannelName::new(raw).expect("channel")
    }

    #[actix_web::test]
    async fn bearer_callers_can_dispatch() {
        let harness = InMemoryHarness::new();
        let app = app!(harness.state.clone());

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/exchange/price-requests")
                .insert_header((header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}")))
                .set_json(json!({
                    "type": "price.requested",
                    "data": { "setCode": "LEA" },
                    "target": "price-service",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::ACCEPTED);
        let body: Value = actix_test::read_body_json(res).await;

        let sent = harness.queue.messages(&channel("price-requests"));
        assert_eq!(sent.len(), 1);
        let message = sent.first().expect("message");
        assert_eq!(body["data"]["messageId"], message.id.as_str());
        assert_eq!(message.payload["source"], "card-tracker");
        assert_eq!(message.payload["target"], "price-service");
        assert_eq!(message.payload["metadata"][SUBMITTED_BY_KEY], "collector-1");
    }

    #[actix_web::test]
    async fn session_callers_can_dispatch() {
        let harness = InMemoryHarness::new();
        let app = app!(harness.state.clone());

        let signed_in = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/session")
                .set_json(json!({ "token": TEST_TOKEN }))
                .to_request(),
        )
        .await;
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/exchange/price-requests")
                .cookie(session_cookie(&signed_in))
                .set_json(json!({ "type": "price.requested" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::ACCEPTED);
    }

    #[rstest]
    #[case(None, json!({ "type": "ping" }), StatusCode::UNAUTHORIZED)]
    #[case(Some("Bearer unknown-token-0123456789"), json!({ "type": "ping" }), StatusCode::UNAUTHORIZED)]
    #[case(Some("Bearer test-token-0123456789abcdef"), json!({}), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(Some("Bearer test-token-0123456789abcdef"), json!({ "type": "ping", "data": [1] }), StatusCode::UNPROCESSABLE_ENTITY)]
    #[actix_web::test]
    async fn rejected_dispatches(
        #[case] authorization: Option<&str>,
        #[case] body: Value,
        #[case] expected: StatusCode,
    ) {
        let harness = InMemoryHarness::new();
        let app = app!(harness.state.clone());
        let mut request = actix_test::TestRequest::post()
            .uri("/api/v1/exchange/pings")
            .set_json(body);
        if let Some(value) = authorization {
            request = request.insert_header((header::AUTHORIZATION, value));
        }
        let res = actix_test::call_service(&app, request.to_request()).await;
        assert_eq!(res.status(), expected);
        assert!(harness.queue.messages(&channel("pings")).is_empty());
    }

    #[actix_web::test]
    async fn undeliverable_messages_are_service_unavailable() {
        let harness = InMemoryHarness::new();
        let mut queue = MockQueueBridge::new();
        queue
            .expect_dispatch()
            .returning(|_, _| Err(JobDispatchError::unavailable("broker down")));
        let mut state = harness.state.clone();
        state.gateway = IntegrationGateway::new(Arc::clone(&harness.tokens) as _, Arc::new(queue));
        let app = app!(state);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/exchange/pings")
                .insert_header((header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}")))
                .set_json(json!({ "type": "ping" }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["meta"]["code"], "service_unavailable");
    }
}
