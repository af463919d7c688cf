//! Response envelope shared by every `/api/v1` endpoint.
//!
//! ```json
//! { "success": true, "message": null, "data": { }, "meta": { } }
//! { "success": false, "message": "Validation failed", "errors": { }, "meta": { } }
//! ```
//!
//! Exactly one of `data` and `errors` is present, chosen by `success`.
//! `meta` is omitted when empty.

use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder};
use pagination::PaginatedResult;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::domain::{Error, Failure, Outcome};
use crate::inbound::http::error::status_for;

#[derive(Debug, Clone, PartialEq)]
enum Payload {
    Data(Value),
    Errors(Value),
}

/// JSON envelope plus the HTTP status it is sent with.
///
/// # Examples
/// ```
/// use actix_web::http::StatusCode;
/// use card_tracker::inbound::http::response::ApiResponse;
/// use serde_json::json;
///
/// let response = ApiResponse::error("Not found", StatusCode::NOT_FOUND, json!({}));
/// let body = serde_json::to_value(&response).expect("serialise");
/// assert_eq!(body["success"], json!(false));
/// assert!(body.get("data").is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    status: StatusCode,
    message: Option<String>,
    payload: Payload,
    meta: Map<String, Value>,
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value)
        .map_err(|err| Error::internal(format!("failed to encode response: {err}")))
}

impl ApiResponse {
    /// Successful envelope carrying `data`.
    ///
    /// # Errors
    /// [`Error::internal`] when `data` cannot be encoded as JSON.
    pub fn success<T: Serialize + ?Sized>(
        data: &T,
        message: Option<&str>,
        status: StatusCode,
    ) -> Result<Self, Error> {
        Ok(Self {
            status,
            message: message.map(str::to_owned),
            payload: Payload::Data(to_json(data)?),
            meta: Map::new(),
        })
    }

    /// `200 OK` with `data` and no message.
    ///
    /// # Errors
    /// [`Error::internal`] when `data` cannot be encoded as JSON.
    pub fn ok<T: Serialize + ?Sized>(data: &T) -> Result<Self, Error> {
        Self::success(data, None, StatusCode::OK)
    }

    /// Failure envelope.
    pub fn error(message: impl Into<String>, status: StatusCode, errors: Value) -> Self {
        Self {
            status,
            message: Some(message.into()),
            payload: Payload::Errors(errors),
            meta: Map::new(),
        }
    }

    /// One page of items: items become `data`, the navigation block becomes
    /// `meta`.
    ///
    /// # Errors
    /// [`Error::internal`] when the items cannot be encoded as JSON.
    pub fn paginated<T: Serialize>(
        page: PaginatedResult<T>,
        message: Option<&str>,
    ) -> Result<Self, Error> {
        let (items, block) = page.into_parts();
        let mut response = Self::success(&items, message, StatusCode::OK)?;
        if let Value::Object(meta) = to_json(&block)? {
            response.meta.extend(meta);
        }
        Ok(response)
    }

    /// Envelope for an expected failure.
    ///
    /// Validation failures become `422` listing the offending fields; any
    /// other failure uses the status of its code and carries its metadata as
    /// `errors`.
    #[must_use]
    pub fn from_error(failure: &Failure) -> Self {
        let (status, errors) = if failure.is_validation() {
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!(failure.errors()),
            )
        } else {
            (
                status_for(failure.code()),
                Value::Object(failure.metadata().clone()),
            )
        };
        Self::error(failure.message(), status, errors)
            .with_meta("code", Value::from(failure.code().as_str()))
    }

    /// Resolve an outcome: success becomes `data` with its metadata merged
    /// into `meta`, failure goes through [`ApiResponse::from_error`].
    ///
    /// # Errors
    /// [`Error::internal`] when the value cannot be encoded as JSON.
    pub fn from_outcome<T: Serialize>(
        outcome: Outcome<T>,
        message: Option<&str>,
        status: StatusCode,
    ) -> Result<Self, Error> {
        match outcome {
            Outcome::Success { value, metadata } => {
                let mut response = Self::success(&value, message, status)?;
                response.meta.extend(metadata);
                Ok(response)
            }
            Outcome::Failure(failure) => Ok(Self::from_error(&failure)),
        }
    }

    /// Add an entry to `meta`.
    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    /// Status the envelope is sent with.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Whether this is a success envelope.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.payload, Payload::Data(_))
    }

    /// Optional human-readable message.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// `data`, present on success.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Data(data) => Some(data),
            Payload::Errors(_) => None,
        }
    }

    /// `errors`, present on failure.
    #[must_use]
    pub const fn errors(&self) -> Option<&Value> {
        match &self.payload {
            Payload::Errors(errors) => Some(errors),
            Payload::Data(_) => None,
        }
    }

    /// Envelope metadata.
    #[must_use]
    pub const fn meta(&self) -> &Map<String, Value> {
        &self.meta
    }
}

impl Serialize for ApiResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.meta.is_empty() { 3 } else { 4 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("success", &self.is_success())?;
        map.serialize_entry("message", &self.message)?;
        match &self.payload {
            Payload::Data(data) => map.serialize_entry("data", data)?,
            Payload::Errors(errors) => map.serialize_entry("errors", errors)?,
        }
        if !self.meta.is_empty() {
            map.serialize_entry("meta", &self.meta)?;
        }
        map.end()
    }
}

impl Responder for ApiResponse {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        HttpResponse::build(self.status).json(&self)
    }
}
