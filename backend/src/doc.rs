//! OpenAPI document for the REST API.
//!
//! Served by Swagger UI in debug builds and printed by the `openapi-dump`
//! binary.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{AuthenticatedUser, CardCondition, Error, ErrorCode};
use crate::inbound::http::auth::SessionRequest;
use crate::inbound::http::exchange::ExchangeRequest;
use crate::inbound::http::items_dto::{CreateItemRequest, ItemResponse, UpdateItemRequest};
use crate::inbound::http::schemas::{
    ExchangeAccepted, ExchangeEnvelope, FailureEnvelope, ItemEnvelope, ItemPageEnvelope,
    MessageEnvelope, PaginationMeta, UserEnvelope,
};

/// Adds the session cookie and bearer token security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/session.",
            ))),
        );
        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .description(Some("API token; accepted by the exchange endpoint."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Card tracker API",
        description = "Card collection management, cookie sessions and cross-system messaging."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::items::list_items,
        crate::inbound::http::items::add_item,
        crate::inbound::http::items::get_item,
        crate::inbound::http::items::update_item,
        crate::inbound::http::items::remove_item,
        crate::inbound::http::auth::sign_in,
        crate::inbound::http::auth::current_session,
        crate::inbound::http::auth::sign_out,
        crate::inbound::http::exchange::dispatch_exchange,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ItemResponse,
        CardCondition,
        CreateItemRequest,
        UpdateItemRequest,
        SessionRequest,
        ExchangeRequest,
        AuthenticatedUser,
        Error,
        ErrorCode,
        PaginationMeta,
        ItemEnvelope,
        ItemPageEnvelope,
        UserEnvelope,
        ExchangeAccepted,
        ExchangeEnvelope,
        MessageEnvelope,
        FailureEnvelope,
    )),
    tags(
        (name = "items", description = "Cards held in the collection"),
        (name = "session", description = "Cookie sessions backed by API tokens"),
        (name = "exchange", description = "Messages sent to other systems"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
