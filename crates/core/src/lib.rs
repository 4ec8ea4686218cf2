//! Shared primitives for all Rust crates in Bandstand.

#![forbid(unsafe_code)]

/// Generated document identifiers.
pub mod id;
/// Localizable messages and structured rejection bodies.
pub mod message;
/// URL-safe code generation.
pub mod slug;

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use id::EntityId;
pub use message::{FieldViolation, InvalidKind, Message, MessageKey, Rejection};
pub use slug::slugify;

/// Result type used across Bandstand crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated, trimmed, non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string, trimming surrounding whitespace.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation(Message::new(MessageKey::BlankValue)));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

impl Display for NonEmptyString {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

/// Common application error categories.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// Malformed input or violated invariant.
    #[error("validation error: {0}")]
    Validation(Rejection),

    /// Requested resource, or one of its ancestors, does not exist or does not match.
    #[error("not found: {0}")]
    NotFound(Rejection),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(Rejection),

    /// Internal unexpected error, usually raised by a storage collaborator.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a validation error carrying a single summary message.
    #[must_use]
    pub fn validation(message: Message) -> Self {
        Self::Validation(Rejection::new(message))
    }

    /// Builds a not-found error carrying a single summary message.
    #[must_use]
    pub fn not_found(message: Message) -> Self {
        Self::NotFound(Rejection::new(message))
    }

    /// Builds a conflict error carrying a single summary message.
    #[must_use]
    pub fn conflict(message: Message) -> Self {
        Self::Conflict(Rejection::new(message))
    }

    /// Returns the structured rejection, when the error carries one.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Validation(rejection) | Self::NotFound(rejection) | Self::Conflict(rejection) => {
                Some(rejection)
            }
            Self::Internal(_) => None,
        }
    }
}
