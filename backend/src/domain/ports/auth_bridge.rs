//! Domain port resolving callers and bearer tokens to user identities.
use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{AuthenticatedUser, BearerToken};

define_port_error! {
    /// Errors surfaced by identity adapters.
    pub enum AuthBridgeError {
        /// Identity provider could not be reached.
        Unavailable { message: String } => "identity provider unavailable: {message}",
        /// Caller context was present but unreadable.
        Context { message: String } => "caller context unreadable: {message}",
    }
}

impl From<AuthBridgeError> for crate::domain::Error {
    fn from(err: AuthBridgeError) -> Self {
        match err {
            AuthBridgeError::Unavailable { .. } => Self::service_unavailable(err.to_string()),
            AuthBridgeError::Context { .. } => Self::internal(err.to_string()),
        }
    }
}

/// Identity capability set.
///
/// An unknown or revoked token is `Ok(None)`, not an error; errors are
/// reserved for failures of the identity provider itself.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthBridge: Send + Sync {
    /// Caller bound to the ambient request context, if any.
    async fn current_user(&self) -> Result<Option<AuthenticatedUser>, AuthBridgeError>;

    /// Resolve a bearer token to the user it was issued to.
    async fn validate_token(
        &self,
        token: &BearerToken,
    ) -> Result<Option<AuthenticatedUser>, AuthBridgeError>;

    /// Whether a caller is bound to the ambient request context.
    async fn is_authenticated(&self) -> Result<bool, AuthBridgeError> {
        Ok(self.current_user().await?.is_some())
    }
}
