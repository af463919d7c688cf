//! Collection item endpoints.
//!
//! ```text
//! GET    /api/v1/items?name=&set_code=&condition=&page=&per_page=
//! POST   /api/v1/items        {"name":"Black Lotus","setCode":"LEA","quantity":1}
//! GET    /api/v1/items/{id}
//! PATCH  /api/v1/items/{id}   {"quantity":2}
//! DELETE /api/v1/items/{id}
//! ```

use actix_web::http::StatusCode;
use actix_web::{delete, get, patch, post, web};
use serde_json::Value;

use crate::domain::ItemFilter;
use crate::inbound::http::ApiResult;
use crate::inbound::http::controller::{PageQuery, parse_entity_id};
use crate::inbound::http::items_dto::{
    CreateItemRequest, ItemListQuery, ItemResponse, UpdateItemRequest,
};
use crate::inbound::http::response::ApiResponse;
use crate::inbound::http::schemas::{
    FailureEnvelope, ItemEnvelope, ItemPageEnvelope, MessageEnvelope,
};
use crate::inbound::http::state::HttpState;

/// List items, filtered and paginated.
#[utoipa::path(
    get,
    path = "/api/v1/items",
    params(
        ItemListQuery,
        ("page" = Option<u32>, Query, description = "One-based page number"),
        ("per_page" = Option<u32>, Query, description = "Items per page, 1 to 100; `perPage` is also accepted"),
    ),
    responses(
        (status = 200, description = "One page of items", body = ItemPageEnvelope),
        (status = 400, description = "Query string could not be decoded", body = FailureEnvelope),
        (status = 422, description = "Invalid filter value", body = FailureEnvelope),
        (status = 500, description = "Internal server error", body = FailureEnvelope)
    ),
    tags = ["items"],
    operation_id = "listItems"
)]
#[get("/items")]
pub async fn list_items(
    state: web::Data<HttpState>,
    filter: web::Query<ItemListQuery>,
    PageQuery(window): PageQuery,
) -> ApiResult<ApiResponse> {
    let filter = ItemFilter::from(filter.into_inner());
    match state.items.list(&filter, window).await?.into_result() {
        Ok(page) => ApiResponse::paginated(page.map(ItemResponse::from), None),
        Err(failure) => Ok(ApiResponse::from_error(&failure)),
    }
}

/// Fetch one item.
#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "The item", body = ItemEnvelope),
        (status = 400, description = "Malformed identifier", body = FailureEnvelope),
        (status = 404, description = "No such item", body = FailureEnvelope)
    ),
    tags = ["items"],
    operation_id = "getItem"
)]
#[get("/items/{id}")]
pub async fn get_item(state: web::Data<HttpState>, path: web::Path<String>) -> ApiResult<ApiResponse> {
    let id = parse_entity_id(&path)?;
    let outcome = state.items.get(&id).await?.map(ItemResponse::from);
    ApiResponse::from_outcome(outcome, None, StatusCode::OK)
}

/// Add an item to the collection.
#[utoipa::path(
    post,
    path = "/api/v1/items",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item added", body = ItemEnvelope),
        (status = 400, description = "Body is not valid JSON", body = FailureEnvelope),
        (status = 409, description = "Card and set already held", body = FailureEnvelope),
        (status = 422, description = "Missing or invalid fields", body = FailureEnvelope)
    ),
    tags = ["items"],
    operation_id = "addItem"
)]
#[post("/items")]
pub async fn add_item(
    state: web::Data<HttpState>,
    payload: web::Json<Value>,
) -> ApiResult<ApiResponse> {
    let input = match CreateItemRequest::from_payload(&payload) {
        Ok(input) => input,
        Err(failure) => return Ok(ApiResponse::from_error(&failure)),
    };
    let outcome = state.items.add(input).await?.map(ItemResponse::from);
    ApiResponse::from_outcome(outcome, Some("Item added"), StatusCode::CREATED)
}

/// Change quantity or condition.
#[utoipa::path(
    patch,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemEnvelope),
        (status = 404, description = "No such item", body = FailureEnvelope),
        (status = 422, description = "Invalid fields", body = FailureEnvelope)
    ),
    tags = ["items"],
    operation_id = "updateItem"
)]
#[patch("/items/{id}")]
pub async fn update_item(
    state: web::Data<HttpState>,
    path: web::Path<String>,
    payload: web::Json<Value>,
) -> ApiResult<ApiResponse> {
    let id = parse_entity_id(&path)?;
    let changes = match UpdateItemRequest::from_payload(&payload) {
        Ok(changes) => changes,
        Err(failure) => return Ok(ApiResponse::from_error(&failure)),
    };
    let outcome = state.items.update(&id, changes).await?.map(ItemResponse::from);
    ApiResponse::from_outcome(outcome, Some("Item updated"), StatusCode::OK)
}

/// Remove an item.
#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item identifier")),
    responses(
        (status = 200, description = "Item removed", body = MessageEnvelope),
        (status = 404, description = "No such item", body = FailureEnvelope)
    ),
    tags = ["items"],
    operation_id = "removeItem"
)]
#[delete("/items/{id}")]
pub async fn remove_item(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<ApiResponse> {
    let id = parse_entity_id(&path)?;
    let outcome = state.items.remove(&id).await?.map(|()| Value::Null);
    ApiResponse::from_outcome(outcome, Some("Item removed"), StatusCode::OK)
}
