//! Static API token registry.
//!
//! Tokens are issued out of band and listed in a JSON file:
//!
//! ```json
//! [{ "token": "tok_...", "id": "collector-42", "displayName": "Ada", "roles": ["exchange"] }]
//! ```
//!
//! Only SHA-256 fingerprints are kept in memory after loading.

use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use tracing::info;
use zeroize::Zeroize;

use crate::domain::ports::{AuthBridge, AuthBridgeError};
use crate::domain::{AuthenticatedUser, BearerToken, DisplayName, UserId, ValueObjectError};

/// One entry of the token file.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTokenRecord {
    /// Raw bearer secret.
    pub token: String,
    /// User the token was issued to.
    pub id: String,
    /// Name shown for that user.
    pub display_name: String,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<String>,
}

impl Drop for ApiTokenRecord {
    fn drop(&mut self) {
        self.token.zeroize();
    }
}

/// Failure to load a token file.
#[derive(Debug, thiserror::Error)]
pub enum TokenFileError {
    /// The file could not be read.
    #[error("failed to read token file {path}: {source}")]
    Io {
        /// Offending path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file is not a JSON list of token records.
    #[error("token file {path} is malformed: {source}")]
    Parse {
        /// Offending path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
    /// An entry failed validation.
    #[error("token entry {index} is invalid: {source}")]
    Entry {
        /// Zero-based position in the list.
        index: usize,
        /// Validation failure.
        #[source]
        source: ValueObjectError,
    },
}

/// Resolves bearer tokens against an in-memory registry.
///
/// There is no ambient caller for this adapter; [`AuthBridge::current_user`]
/// always answers `None`. Session-bound callers are resolved by the HTTP
/// layer's session bridge.
#[derive(Debug, Default)]
pub struct ApiTokenAuthBridge {
    users_by_fingerprint: DashMap<String, AuthenticatedUser>,
}

impl ApiTokenAuthBridge {
    /// Empty registry; every token is unknown.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a registry from a JSON token file.
    ///
    /// # Errors
    /// [`TokenFileError`] when the file is unreadable, malformed, or holds an
    /// invalid entry.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TokenFileError> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let bytes = std::fs::read(path).map_err(|source| TokenFileError::Io {
            path: shown.clone(),
            source,
        })?;
        let records: Vec<ApiTokenRecord> =
            serde_json::from_slice(&bytes).map_err(|source| TokenFileError::Parse {
                path: shown.clone(),
                source,
            })?;

        let bridge = Self::new();
        for (index, record) in records.iter().enumerate() {
            bridge
                .register(record)
                .map_err(|source| TokenFileError::Entry { index, source })?;
        }
        info!(path = %shown, tokens = bridge.len(), "loaded api tokens");
        Ok(bridge)
    }

    /// Register a validated record.
    ///
    /// # Errors
    /// [`ValueObjectError`] when the token, id, or display name is invalid.
    pub fn register(&self, record: &ApiTokenRecord) -> Result<(), ValueObjectError> {
        let token = BearerToken::new(record.token.clone())?;
        let user = AuthenticatedUser::new(
            UserId::new(record.id.clone())?,
            DisplayName::new(record.display_name.clone())?,
            record.roles.clone(),
        );
        self.insert(&token, user);
        Ok(())
    }

    /// Issue `token` to `user`, replacing any previous holder.
    pub fn insert(&self, token: &BearerToken, user: AuthenticatedUser) {
        self.users_by_fingerprint.insert(token.fingerprint(), user);
    }

    /// Number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users_by_fingerprint.len()
    }

    /// Whether no tokens are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users_by_fingerprint.is_empty()
    }
}

#[async_trait]
impl AuthBridge for ApiTokenAuthBridge {
    async fn current_user(&self) -> Result<Option<AuthenticatedUser>, AuthBridgeError> {
        Ok(None)
    }

    async fn validate_token(
        &self,
        token: &BearerToken,
    ) -> Result<Option<AuthenticatedUser>, AuthBridgeError> {
        Ok(self
            .users_by_fingerprint
            .get(&token.fingerprint())
            .map(|entry| entry.value().clone()))
    }
}

#[cfg(test)]
mod tests {
    //! Token file loading and lookup.
    use super::*;
    use rstest::rstest;
    use std::io::Write as _;

    const TOKEN: &str = "tok_0123456789abcdef";

    fn write_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write tokens");
        file
    }

    #[rstest]
    #[tokio::test]
    async fn tokens_from_file_resolve_to_users() {
        let file = write_file(&format!(
            r#"[{{"token":"{TOKEN}","id":"collector-42","displayName":"Ada","roles":["exchange"]}}]"#
        ));
        let bridge = ApiTokenAuthBridge::from_file(file.path()).expect("load tokens");

        let token = BearerToken::new(TOKEN).expect("token");
        let user = bridge
            .validate_token(&token)
            .await
            .expect("validate")
            .expect("known user");

        assert_eq!(user.id().as_ref(), "collector-42");
        assert!(user.has_role("exchange"));
        assert!(!bridge.is_authenticated().await.expect("ambient"));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_tokens_resolve_to_none() {
        let bridge = ApiTokenAuthBridge::new();
        let token = BearerToken::new("tok_fedcba9876543210").expect("token");
        assert!(bridge.validate_token(&token).await.expect("validate").is_none());
    }

    #[rstest]
    #[case("not json", "malformed")]
    #[case(r#"[{"token":"short","id":"u1","displayName":"Ada"}]"#, "entry 0")]
    fn bad_files_are_rejected(#[case] contents: &str, #[case] needle: &str) {
        let file = write_file(contents);
        let err = ApiTokenAuthBridge::from_file(file.path()).expect_err("rejected");
        assert!(err.to_string().contains(needle), "{err}");
    }
}
