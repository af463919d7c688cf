//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! [`SessionContext`] wraps the Actix cookie session so handlers only persist
//! or read the signed-in [`AuthenticatedUser`]. [`SessionAuthBridge`] exposes
//! that caller to the domain through the [`AuthBridge`] port.

use std::sync::Arc;

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use async_trait::async_trait;
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::ports::{AuthBridge, AuthBridgeError};
use crate::domain::{AuthenticatedUser, BearerToken, Error};

pub(crate) const USER_KEY: &str = "user";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind `user` to the session, rotating the session identifier.
    ///
    /// # Errors
    /// [`Error::internal`] when the session cannot be written.
    pub fn persist_user(&self, user: &AuthenticatedUser) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_KEY, user)
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// Signed-in user, if any. A cookie that no longer decodes is ignored.
    ///
    /// # Errors
    /// [`Error::internal`] when the session store cannot be read.
    pub fn user(&self) -> Result<Option<AuthenticatedUser>, Error> {
        match self.0.get::<AuthenticatedUser>(USER_KEY) {
            Ok(user) => Ok(user),
            Err(error) => {
                warn!(%error, "discarding unreadable session user");
                self.0.remove(USER_KEY);
                Ok(None)
            }
        }
    }

    /// Require a signed-in user or return `401 Unauthorized`.
    ///
    /// # Errors
    /// [`Error::unauthorized`] when nobody is signed in.
    pub fn require_user(&self) -> Result<AuthenticatedUser, Error> {
        self.user()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop every session entry and expire the cookie.
    pub fn end(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

/// Request-scoped [`AuthBridge`] whose ambient caller is the session user.
///
/// Actix sessions are tied to the worker thread, so the caller is read once
/// when the bridge is built. Token validation goes to the wrapped bridge.
pub struct SessionAuthBridge {
    caller: Option<AuthenticatedUser>,
    tokens: Arc<dyn AuthBridge>,
}

impl SessionAuthBridge {
    /// Snapshot the caller from `session`.
    ///
    /// # Errors
    /// [`Error::internal`] when the session store cannot be read.
    pub fn from_session(
        session: &SessionContext,
        tokens: Arc<dyn AuthBridge>,
    ) -> Result<Self, Error> {
        Ok(Self::new(session.user()?, tokens))
    }

    /// Bridge with an explicit caller.
    pub fn new(caller: Option<AuthenticatedUser>, tokens: Arc<dyn AuthBridge>) -> Self {
        Self { caller, tokens }
    }
}

#[async_trait]
impl AuthBridge for SessionAuthBridge {
    async fn current_user(&self) -> Result<Option<AuthenticatedUser>, AuthBridgeError> {
        Ok(self.caller.clone())
    }

    async fn validate_token(
        &self,
        token: &BearerToken,
    ) -> Result<Option<AuthenticatedUser>, AuthBridgeError> {
        self.tokens.validate_token(token).await
    }
}
