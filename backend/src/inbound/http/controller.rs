//! Helpers shared by the `/api/v1` handlers: required-field checks, JSON and
//! query extractor configuration, and the pagination extractor.

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::{Ready, ready};
use pagination::Pagination;
use serde_json::Value;
use tracing::debug;

use crate::domain::{EntityId, Error, Failure, FieldErrors};

/// Message attached to each missing field.
pub const REQUIRED_MESSAGE: &str = "This field is required.";

const JSON_LIMIT_BYTES: usize = 64 * 1024;

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.is_empty(),
        Some(_) => false,
    }
}

/// Check that every field in `fields` is present, non-null and not `""`.
///
/// All missing fields are reported together. A payload that is not a JSON
/// object is missing every field.
///
/// # Errors
/// A validation [`Failure`] keyed by each missing field.
///
/// # Examples
/// ```
/// use card_tracker::inbound::http::controller::validate_required;
/// use serde_json::json;
///
/// let failure = validate_required(&json!({}), &["name", "email"]).expect_err("both missing");
/// assert_eq!(failure.errors().len(), 2);
/// ```
pub fn validate_required(payload: &Value, fields: &[&str]) -> Result<(), Failure> {
    let errors: FieldErrors = fields
        .iter()
        .filter(|field| is_blank(payload.get(**field)))
        .map(|field| ((*field).to_owned(), REQUIRED_MESSAGE.to_owned()))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(Failure::validation("Missing required fields", errors))
    }
}

/// JSON body configuration rendering malformed bodies as `400`.
#[must_use]
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(JSON_LIMIT_BYTES)
        .error_handler(|err, _req| {
            debug!(error = %err, "rejected request body");
            Error::invalid_request("Request body must be a valid JSON document").into()
        })
}

/// Query string configuration rendering undecodable queries as `400`.
#[must_use]
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "rejected query string");
        Error::invalid_request("Query string could not be decoded").into()
    })
}

/// Parse a path segment as an entity identifier.
///
/// # Errors
/// [`Error::invalid_request`] when `raw` is not a UUID.
pub fn parse_entity_id(raw: &str) -> Result<EntityId, Error> {
    raw.parse()
        .map_err(|_| Error::invalid_request(format!("'{raw}' is not a valid identifier")))
}

/// Page window read from `page` and `per_page`/`perPage`.
///
/// Never rejects a request: unreadable values fall back to the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery(pub Pagination);

impl FromRequest for PageQuery {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(Self(Pagination::from_query_string(req.query_string()))))
    }
}
