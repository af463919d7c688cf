//! OpenAPI shapes for the response envelope.
//!
//! [`ApiResponse`](super::response::ApiResponse) serialises by hand, so the
//! documented shapes live here as mirror structs. They are never built.

use serde_json::Value;
use utoipa::ToSchema;

use crate::domain::AuthenticatedUser;
use crate::inbound::http::items_dto::ItemResponse;

/// Navigation block placed in `meta` by paginated responses.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct PaginationMeta {
    #[schema(example = 12)]
    total: u64,
    #[schema(example = 2)]
    current_page: u32,
    #[schema(example = 5)]
    per_page: u32,
    #[schema(example = 3)]
    total_pages: u64,
    has_next_page: bool,
    has_previous_page: bool,
}

/// Successful envelope holding one item.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ItemEnvelope {
    #[schema(example = true)]
    success: bool,
    message: Option<String>,
    data: ItemResponse,
    meta: Option<Value>,
}

/// Successful envelope holding one page of items.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ItemPageEnvelope {
    #[schema(example = true)]
    success: bool,
    message: Option<String>,
    data: Vec<ItemResponse>,
    meta: PaginationMeta,
}

/// Successful envelope holding the signed-in user.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct UserEnvelope {
    #[schema(example = true)]
    success: bool,
    message: Option<String>,
    data: AuthenticatedUser,
}

/// Identifier handed out for an accepted exchange message.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ExchangeAccepted {
    #[schema(example = "6f1c2e1a-8d7b-4f0e-9a51-2b9d1c3e4f50")]
    message_id: String,
}

/// Successful envelope for an accepted exchange message.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ExchangeEnvelope {
    #[schema(example = true)]
    success: bool,
    #[schema(example = "Message accepted")]
    message: Option<String>,
    data: ExchangeAccepted,
}

/// Successful envelope carrying only a message.
#[derive(ToSchema)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct MessageEnvelope {
    #[schema(example = true)]
    success: bool,
    #[schema(example = "Item removed")]
    message: Option<String>,
    data: Option<Value>,
}

/// Failure envelope.
///
/// `errors` maps field names to messages for validation failures and
/// carries failure metadata otherwise. `meta.code` is the stable error code
/// and `meta.traceId` correlates the response with server logs.
#[derive(ToSchema)]
#[schema(example = json!({
    "success": false,
    "message": "Missing required fields",
    "errors": {"name": "This field is required."},
    "meta": {"code": "validation_failed", "traceId": "00000000-0000-0000-0000-000000000000"}
}))]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct FailureEnvelope {
    success: bool,
    message: String,
    errors: Value,
    meta: Value,
}
