//! Success-or-failure container for expected business outcomes.
//!
//! Validation problems, missing records and rule violations are ordinary
//! results, not faults. Services return them as [`Outcome::Failure`] and
//! reserve `Err(Error)` for infrastructure trouble.

use std::collections::BTreeMap;

use serde_json::{Map, Value, json};
use thiserror::Error as ThisError;

use super::{Error, ErrorCode};

/// Free-form metadata attached to an outcome.
pub type Metadata = Map<String, Value>;

/// Field name to message map describing invalid input.
pub type FieldErrors = BTreeMap<String, String>;

/// Raised when the value of a failed outcome is requested.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
#[error("outcome has no value: {message}")]
pub struct OutcomeStateError {
    message: String,
}

impl From<OutcomeStateError> for Error {
    fn from(err: OutcomeStateError) -> Self {
        Self::internal(err.to_string())
    }
}

/// Description of an expected failure.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    message: String,
    errors: FieldErrors,
    metadata: Metadata,
    code: ErrorCode,
}

impl Failure {
    /// Build a failure. Any field errors make it a validation failure.
    pub fn new(message: impl Into<String>, errors: FieldErrors, metadata: Metadata) -> Self {
        let code = if errors.is_empty() {
            ErrorCode::InvalidRequest
        } else {
            ErrorCode::ValidationFailed
        };
        Self {
            message: message.into(),
            errors,
            metadata,
            code,
        }
    }

    /// Validation failure built from collected field errors.
    pub fn validation(message: impl Into<String>, errors: FieldErrors) -> Self {
        Self::new(message, errors, Metadata::new()).with_code(ErrorCode::ValidationFailed)
    }

    /// The addressed resource does not exist.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(message, FieldErrors::new(), Metadata::new()).with_code(ErrorCode::NotFound)
    }

    /// The request clashes with existing state.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(message, FieldErrors::new(), Metadata::new()).with_code(ErrorCode::Conflict)
    }

    /// Override the failure category.
    #[must_use]
    pub const fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = code;
        self
    }

    /// Human-readable summary.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Per-field messages.
    #[must_use]
    pub const fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// Metadata attached by the producer.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Failure category.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Whether this failure reports invalid input fields.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.code == ErrorCode::ValidationFailed
    }
}

impl From<Failure> for Error {
    fn from(failure: Failure) -> Self {
        let Failure {
            message,
            errors,
            metadata,
            code,
        } = failure;
        let err = Self::new(code, message);
        match (errors.is_empty(), metadata.is_empty()) {
            (true, true) => err,
            (false, _) => err.with_details(json!(errors)),
            (true, false) => err.with_details(Value::Object(metadata)),
        }
    }
}

/// Either a value with metadata, or a [`Failure`].
///
/// # Examples
/// ```
/// use card_tracker::domain::{Failure, Outcome};
///
/// let doubled = Outcome::success(21).map(|n| n * 2);
/// assert_eq!(doubled.value_or(0), 42);
///
/// let missing: Outcome<i32> = Outcome::Failure(Failure::not_found("no such card"));
/// assert!(missing.map(|n| n * 2).is_failure());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The operation produced a value.
    Success {
        /// Produced value.
        value: T,
        /// Metadata attached by the producer.
        metadata: Metadata,
    },
    /// The operation failed for an expected reason.
    Failure(Failure),
}

impl<T> Outcome<T> {
    /// Success without metadata.
    pub fn success(value: T) -> Self {
        Self::success_with(value, Metadata::new())
    }

    /// Success carrying metadata.
    pub const fn success_with(value: T, metadata: Metadata) -> Self {
        Self::Success { value, metadata }
    }

    /// Failure with field errors and metadata.
    pub fn failure(message: impl Into<String>, errors: FieldErrors, metadata: Metadata) -> Self {
        Self::Failure(Failure::new(message, errors, metadata))
    }

    /// Whether a value is present.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Whether this is a failure.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrow the value.
    ///
    /// # Errors
    /// Returns [`OutcomeStateError`] when called on a failure.
    pub fn value(&self) -> Result<&T, OutcomeStateError> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Failure(failure) => Err(OutcomeStateError {
                message: failure.message.clone(),
            }),
        }
    }

    /// Take the value.
    ///
    /// # Errors
    /// Returns [`OutcomeStateError`] when called on a failure.
    pub fn into_value(self) -> Result<T, OutcomeStateError> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Failure(failure) => Err(OutcomeStateError {
                message: failure.message,
            }),
        }
    }

    /// Take the value, or `default` on failure.
    pub fn value_or(self, default: T) -> T {
        match self {
            Self::Success { value, .. } => value,
            Self::Failure(_) => default,
        }
    }

    /// Metadata of either variant.
    #[must_use]
    pub const fn metadata(&self) -> &Metadata {
        match self {
            Self::Success { metadata, .. } => metadata,
            Self::Failure(failure) => &failure.metadata,
        }
    }

    /// Borrow the failure, if any.
    #[must_use]
    pub const fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Success { .. } => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    /// Run `f` on the value, if present, and return `self` unchanged.
    #[must_use]
    pub fn on_success(self, f: impl FnOnce(&T)) -> Self {
        if let Self::Success { value, .. } = &self {
            f(value);
        }
        self
    }

    /// Run `f` on the failure, if any, and return `self` unchanged.
    #[must_use]
    pub fn on_failure(self, f: impl FnOnce(&Failure)) -> Self {
        if let Self::Failure(failure) = &self {
            f(failure);
        }
        self
    }

    /// Transform the value, keeping metadata. Failures pass through.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Success { value, metadata } => Outcome::Success {
                value: f(value),
                metadata,
            },
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Chain another fallible step. Metadata from both steps is merged, the
    /// later step winning on key clashes.
    pub fn and_then<U>(self, f: impl FnOnce(T) -> Outcome<U>) -> Outcome<U> {
        match self {
            Self::Success { value, mut metadata } => match f(value) {
                Outcome::Success {
                    value,
                    metadata: next,
                } => {
                    metadata.extend(next);
                    Outcome::Success { value, metadata }
                }
                failure @ Outcome::Failure(_) => failure,
            },
            Self::Failure(failure) => Outcome::Failure(failure),
        }
    }

    /// Convert into a standard `Result`, dropping success metadata.
    ///
    /// # Errors
    /// Returns the [`Failure`] when this outcome failed.
    pub fn into_result(self) -> Result<T, Failure> {
        match self {
            Self::Success { value, .. } => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl<T> From<Failure> for Outcome<T> {
    fn from(failure: Failure) -> Self {
        Self::Failure(failure)
    }
}

#[cfg(test)]
mod tests {
    //! Laws and accessors of the outcome container.
    use super::*;
    use rstest::{fixture, rstest};
    use std::cell::Cell;

    #[fixture]
    fn tagged() -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_owned(), json!("cache"));
        metadata
    }

    #[fixture]
    fn invalid() -> Failure {
        Failure::new(
            "invalid payload",
            FieldErrors::from([("name".to_owned(), "is required".to_owned())]),
            Metadata::new(),
        )
    }

    #[rstest]
    fn map_on_success_keeps_metadata(tagged: Metadata) {
        let outcome = Outcome::success_with(2, tagged.clone()).map(|n| n + 1);
        assert_eq!(outcome, Outcome::success_with(3, tagged));
    }

    #[rstest]
    fn map_on_failure_is_identity(invalid: Failure) {
        let outcome: Outcome<i32> = Outcome::Failure(invalid.clone());
        assert_eq!(outcome.map(|n| n * 10), Outcome::<i32>::Failure(invalid));
    }

    #[rstest]
    fn value_on_failure_is_an_error(invalid: Failure) {
        let outcome: Outcome<i32> = invalid.into();
        let err = outcome.value().expect_err("no value");
        assert!(err.to_string().contains("invalid payload"));
        assert!(outcome.into_value().is_err());
    }

    #[rstest]
    fn value_or_never_fails(invalid: Failure) {
        assert_eq!(Outcome::<u8>::Failure(invalid).value_or(7), 7);
        assert_eq!(Outcome::success(1_u8).value_or(7), 1);
    }

    #[rstest]
    fn callbacks_only_fire_for_their_variant(invalid: Failure) {
        let successes = Cell::new(0);
        let failures = Cell::new(0);

        let _ok = Outcome::success(1)
            .on_success(|_| successes.set(successes.get() + 1))
            .on_failure(|_| failures.set(failures.get() + 1));
        let _err = Outcome::<i32>::Failure(invalid)
            .on_success(|_| successes.set(successes.get() + 1))
            .on_failure(|_| failures.set(failures.get() + 1));

        assert_eq!((successes.get(), failures.get()), (1, 1));
    }

    #[rstest]
    fn and_then_merges_metadata(tagged: Metadata) {
        let mut later = Metadata::new();
        later.insert("page".to_owned(), json!(2));
        let outcome = Outcome::success_with(1, tagged)
            .and_then(|n| Outcome::success_with(n + 1, later));
        assert_eq!(outcome.metadata().len(), 2);
        assert_eq!(outcome.value_or(0), 2);
    }

    #[rstest]
    #[case(FieldErrors::new(), ErrorCode::InvalidRequest)]
    #[case(FieldErrors::from([("quantity".to_owned(), "too big".to_owned())]), ErrorCode::ValidationFailed)]
    fn failure_code_follows_field_errors(#[case] errors: FieldErrors, #[case] code: ErrorCode) {
        assert_eq!(Failure::new("bad", errors, Metadata::new()).code(), code);
    }

    #[rstest]
    fn failures_convert_into_errors(invalid: Failure) {
        let err = Error::from(invalid);
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
        assert_eq!(err.details(), Some(&json!({"name": "is required"})));

        let missing = Error::from(Failure::not_found("gone"));
        assert_eq!(missing.code(), ErrorCode::NotFound);
        assert!(missing.details().is_none());
    }

    #[rstest]
    fn into_result_exposes_failure(invalid: Failure) {
        let result = Outcome::<()>::Failure(invalid.clone()).into_result();
        assert_eq!(result, Err(invalid));
    }
}
