//! Validated string wrappers compared by value.
//!
//! A value object runs [`ValueObject::validate`] before it is constructed, so
//! an invalid instance is never observable. The [`value_object!`] macro
//! generates the wrapper type and its conversions; each type supplies only
//! its validation rule.

use thiserror::Error;

/// Reasons a raw string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Value is empty after trimming whitespace.
    #[error("{kind} must not be empty")]
    Empty {
        /// Rejected value object kind.
        kind: &'static str,
    },
    /// Value has leading or trailing whitespace.
    #[error("{kind} must not contain surrounding whitespace")]
    Padded {
        /// Rejected value object kind.
        kind: &'static str,
    },
    /// Value is longer than allowed.
    #[error("{kind} must be at most {max} characters")]
    TooLong {
        /// Rejected value object kind.
        kind: &'static str,
        /// Maximum accepted length in characters.
        max: usize,
    },
    /// Value breaks a type-specific rule.
    #[error("{kind} {reason}")]
    Invalid {
        /// Rejected value object kind.
        kind: &'static str,
        /// Rule that was broken.
        reason: &'static str,
    },
}

/// Validation hook run before a value object is constructed.
pub trait ValueObject {
    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    /// Reject `raw` if it does not satisfy the type's rules.
    fn validate(raw: &str) -> Result<(), ValueObjectError>;
}

/// Reject blank or whitespace-padded input.
pub fn require_trimmed(kind: &'static str, raw: &str) -> Result<(), ValueObjectError> {
    if raw.trim().is_empty() {
        return Err(ValueObjectError::Empty { kind });
    }
    if raw.trim() != raw {
        return Err(ValueObjectError::Padded { kind });
    }
    Ok(())
}

/// Reject input longer than `max` characters.
pub fn require_max_chars(kind: &'static str, raw: &str, max: usize) -> Result<(), ValueObjectError> {
    if raw.chars().count() > max {
        return Err(ValueObjectError::TooLong { kind, max });
    }
    Ok(())
}

/// Generate a validated string wrapper.
///
/// The generated type derives value equality and hashing, (de)serialises as
/// a plain string, and can only be built through `new` or `TryFrom<String>`,
/// both of which run the type's [`ValueObject::validate`] hook.
macro_rules! value_object {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ::serde::Serialize, ::serde::Deserialize)]
        #[serde(try_from = "String", into = "String")]
        $vis struct $name(String);

        impl $name {
            /// Validate and wrap `value`.
            pub fn new(
                value: impl Into<String>,
            ) -> Result<Self, $crate::domain::value_object::ValueObjectError> {
                let raw = value.into();
                <Self as $crate::domain::value_object::ValueObject>::validate(&raw)?;
                Ok(Self(raw))
            }

            /// Borrow the wrapped string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::domain::value_object::ValueObjectError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

pub(crate) use value_object;
