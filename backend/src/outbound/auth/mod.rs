//! [`AuthBridge`](crate::domain::ports::AuthBridge) adapters.

mod api_token;

pub use api_token::{ApiTokenAuthBridge, ApiTokenRecord, TokenFileError};
