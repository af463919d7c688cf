//! Session endpoints: trade a bearer token for a cookie session.
//!
//! ```text
//! POST   /api/v1/session {"token":"..."}
//! GET    /api/v1/session
//! DELETE /api/v1/session
//! ```

use actix_web::http::StatusCode;
use actix_web::{delete, get, post, web};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::domain::{BearerToken, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::controller::validate_required;
use crate::inbound::http::response::ApiResponse;
use crate::inbound::http::schemas::{FailureEnvelope, MessageEnvelope, UserEnvelope};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Body of `POST /session`, documentation only.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SessionRequest {
    /// API token issued to the caller.
    pub token: String,
}

fn rejected() -> Error {
    Error::unauthorized("invalid credentials")
}

/// Resolve a bearer token and bind the caller to the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/session",
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Signed in", body = UserEnvelope,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 401, description = "Unknown or malformed token", body = FailureEnvelope),
        (status = 422, description = "Token missing", body = FailureEnvelope)
    ),
    tags = ["session"],
    operation_id = "signIn",
    security([])
)]
#[post("/session")]
pub async fn sign_in(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<Value>,
) -> ApiResult<ApiResponse> {
    if let Err(failure) = validate_required(&payload, &["token"]) {
        return Ok(ApiResponse::from_error(&failure));
    }
    let token = payload
        .get("token")
        .and_then(Value::as_str)
        .and_then(|raw| BearerToken::new(raw).ok())
        .ok_or_else(rejected)?;
    let user = state.gateway.validate_token(&token).await?.ok_or_else(rejected)?;
    session.persist_user(&user)?;
    info!(user_id = %user.id(), "session started");
    ApiResponse::success(&user, Some("Signed in"), StatusCode::OK)
}

/// The signed-in caller.
#[utoipa::path(
    get,
    path = "/api/v1/session",
    responses(
        (status = 200, description = "Signed-in user", body = UserEnvelope),
        (status = 401, description = "No session", body = FailureEnvelope)
    ),
    tags = ["session"],
    operation_id = "currentSession"
)]
#[get("/session")]
pub async fn current_session(session: SessionContext) -> ApiResult<ApiResponse> {
    let user = session.require_user()?;
    ApiResponse::ok(&user)
}

/// End the session and expire the cookie.
#[utoipa::path(
    delete,
    path = "/api/v1/session",
    responses((status = 200, description = "Signed out", body = MessageEnvelope)),
    tags = ["session"],
    operation_id = "signOut"
)]
#[delete("/session")]
pub async fn sign_out(session: SessionContext) -> ApiResult<ApiResponse> {
    session.end();
    ApiResponse::success(&Value::Null, Some("Signed out"), StatusCode::OK)
}

#[cfg(test)]
mod tests {
    //! Session sign-in and sign-out handlers.
    use super::*;
    use crate::inbound::http::test_utils::{session_cookie, test_session_middleware};
    use crate::test_support::{InMemoryHarness, TEST_TOKEN};
    use actix_web::{App, test as actix_test};
    use rstest::rstest;
    use serde_json::json;

    macro_rules! app {
        ($harness:expr) => {
            actix_test::init_service(
                App::new()
                    .app_data(web::Data::new($harness.state.clone()))
                    .service(
                        web::scope("/api/v1")
                            .wrap(test_session_middleware())
                            .service(sign_in)
                            .service(current_session)
                            .service(sign_out),
                    ),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn token_sign_in_round_trip() {
        let harness = InMemoryHarness::new();
        let app = app!(harness);

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/session")
                .set_json(json!({ "token": TEST_TOKEN }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_cookie(&res);

        let me: Value = actix_test::call_and_read_body_json(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/session")
                .cookie(cookie.clone())
                .to_request(),
        )
        .await;
        assert_eq!(me["data"]["displayName"], "Ada Lovelace");

        let out = actix_test::call_service(
            &app,
            actix_test::TestRequest::delete()
                .uri("/api/v1/session")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(out.status(), StatusCode::OK);
    }

    #[rstest]
    #[case(json!({}), StatusCode::UNPROCESSABLE_ENTITY)]
    #[case(json!({ "token": "short" }), StatusCode::UNAUTHORIZED)]
    #[case(json!({ "token": "unknown-token-0123456789" }), StatusCode::UNAUTHORIZED)]
    #[actix_web::test]
    async fn rejected_sign_ins(#[case] body: Value, #[case] expected: StatusCode) {
        let harness = InMemoryHarness::new();
        let app = app!(harness);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/session")
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
        assert!(res.response().cookies().next().is_none());
    }

    #[actix_web::test]
    async fn no_session_is_unauthorised() {
        let harness = InMemoryHarness::new();
        let app = app!(harness);
        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/session").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        let body: Value = actix_test::read_body_json(res).await;
        assert_eq!(body["meta"]["code"], "unauthorized");
    }
}
