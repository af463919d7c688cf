//! Caller identity types resolved by the auth bridge.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;
use zeroize::Zeroize;

use super::value_object::{
    ValueObject, ValueObjectError, require_max_chars, require_trimmed, value_object,
};

const USER_ID_MAX: usize = 128;
const DISPLAY_NAME_MAX: usize = 64;
const TOKEN_MIN: usize = 16;
const TOKEN_MAX: usize = 512;

value_object! {
    /// Stable identifier issued by the identity provider.
    pub struct UserId;
}

impl ValueObject for UserId {
    const KIND: &'static str = "user id";

    fn validate(raw: &str) -> Result<(), ValueObjectError> {
        require_trimmed(Self::KIND, raw)?;
        require_max_chars(Self::KIND, raw, USER_ID_MAX)?;
        let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':' | '@');
        if !raw.chars().all(allowed) {
            return Err(ValueObjectError::Invalid {
                kind: Self::KIND,
                reason: "may only contain letters, digits and - _ . : @",
            });
        }
        Ok(())
    }
}

value_object! {
    /// Name shown for a user.
    pub struct DisplayName;
}

impl ValueObject for DisplayName {
    const KIND: &'static str = "display name";

    fn validate(raw: &str) -> Result<(), ValueObjectError> {
        require_trimmed(Self::KIND, raw)?;
        require_max_chars(Self::KIND, raw, DISPLAY_NAME_MAX)
    }
}

/// Caller resolved by an [`AuthBridge`](super::ports::AuthBridge).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedUser {
    #[schema(value_type = String, example = "collector-42")]
    id: UserId,
    #[schema(value_type = String, example = "Ada Lovelace")]
    display_name: DisplayName,
    #[serde(default)]
    roles: Vec<String>,
}

impl AuthenticatedUser {
    /// Build a user with the given roles.
    #[must_use]
    pub const fn new(id: UserId, display_name: DisplayName, roles: Vec<String>) -> Self {
        Self {
            id,
            display_name,
            roles,
        }
    }

    /// Identifier.
    #[must_use]
    pub const fn id(&self) -> &UserId {
        &self.id
    }

    /// Display name.
    #[must_use]
    pub const fn display_name(&self) -> &DisplayName {
        &self.display_name
    }

    /// Granted roles.
    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    /// Whether `role` was granted.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|granted| granted == role)
    }
}

/// Opaque bearer credential presented by a caller.
///
/// The secret is wiped from memory on drop and never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Validate a raw token.
    ///
    /// # Errors
    /// Rejects blank, padded, too short or too long tokens, and tokens
    /// containing whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let mut raw = value.into();
        match Self::validate(&raw) {
            Ok(()) => Ok(Self(raw)),
            Err(err) => {
                raw.zeroize();
                Err(err)
            }
        }
    }

    /// Parse an `Authorization: Bearer <token>` header value.
    #[must_use]
    pub fn from_authorization_header(header: &str) -> Option<Self> {
        let (scheme, token) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }
        Self::new(token.trim()).ok()
    }

    /// Borrow the secret for comparison or transport.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Hex SHA-256 digest of the token, safe to log and to use as a lookup key.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        hex::encode(Sha256::digest(self.0.as_bytes()))
    }
}

impl ValueObject for BearerToken {
    const KIND: &'static str = "bearer token";

    fn validate(raw: &str) -> Result<(), ValueObjectError> {
        require_trimmed(Self::KIND, raw)?;
        require_max_chars(Self::KIND, raw, TOKEN_MAX)?;
        if raw.chars().count() < TOKEN_MIN {
            return Err(ValueObjectError::Invalid {
                kind: Self::KIND,
                reason: "is too short",
            });
        }
        if raw.chars().any(char::is_whitespace) {
            return Err(ValueObjectError::Invalid {
                kind: Self::KIND,
                reason: "must not contain whitespace",
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

impl Drop for BearerToken {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
