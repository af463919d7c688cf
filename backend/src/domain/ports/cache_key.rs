//! Cache key type shared by cache adapters and the cache manager.
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Validated cache key.
///
/// Keys are non-empty and carry no surrounding whitespace. Adapters may add
/// their own namespace prefix when talking to the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Validate and wrap a key.
    ///
    /// # Errors
    /// Returns [`CacheKeyValidationError`] for blank or padded keys.
    pub fn new(value: impl Into<String>) -> Result<Self, CacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(CacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(CacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Derive a stable key `prefix:<sha256>` from arbitrary parts.
    ///
    /// Parts are length-prefixed before hashing so `["ab", "c"]` and
    /// `["a", "bc"]` never collide.
    ///
    /// # Errors
    /// Returns [`CacheKeyValidationError`] when `prefix` is blank or padded.
    ///
    /// # Examples
    /// ```
    /// use card_tracker::domain::ports::CacheKey;
    ///
    /// let a = CacheKey::hashed("items:count", ["v1", "{}"]).expect("valid prefix");
    /// let b = CacheKey::hashed("items:count", ["v1", "{}"]).expect("valid prefix");
    /// assert_eq!(a, b);
    /// assert!(a.as_str().starts_with("items:count:"));
    /// ```
    pub fn hashed<I, P>(prefix: &str, parts: I) -> Result<Self, CacheKeyValidationError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        let mut hasher = Sha256::new();
        for part in parts {
            let bytes = part.as_ref();
            hasher.update((bytes.len() as u64).to_be_bytes());
            hasher.update(bytes);
        }
        Self::new(format!("{prefix}:{}", hex::encode(hasher.finalize())))
    }

    /// Borrow the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`CacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("cache key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
}
