//! Error types for the wallet account platform
//!
//! This module provides a unified error handling system for the account
//! service and its collaborators. It defines standard error types that can be
//! used across service boundaries and classifies them into the small set of
//! kinds callers are expected to react to.

use std::fmt::Display;
use thiserror::Error;

use crate::model::account::IdentifierClass;

/// Account platform error type
#[derive(Debug, Error)]
pub enum Error {
    /// Error when an account cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// Error when the owning user cannot be found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Error when a request collides with existing state (e.g. user already owns an account)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Error when no free identifier could be generated within the retry budget
    #[error("Could not generate a unique {0}")]
    GenerationExhausted(IdentifierClass),

    /// Error when the store rejects an identifier that is already assigned
    #[error("Duplicate {0}: {1}")]
    DuplicateIdentifier(IdentifierClass, String),

    /// Error when a gateway or reference lookup failed or timed out
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Generic validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Decimal conversion error
    #[error("Decimal conversion error: {0}")]
    DecimalError(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-facing classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Account or user does not exist
    NotFound,
    /// The request collides with existing state
    Conflict,
    /// Identifier generation ran out of attempts
    GenerationExhausted,
    /// A dependency failed or timed out
    UpstreamUnavailable,
    /// Malformed or missing input
    ValidationFailed,
    /// Anything else (store failures, configuration, serialization)
    Internal,
}

/// Message shown to callers for errors that are not their fault
pub const GENERIC_FAILURE_MESSAGE: &str = "service unavailable, please retry later";

impl Error {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AccountNotFound(_) | Error::UserNotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::GenerationExhausted(_) => ErrorKind::GenerationExhausted,
            Error::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Error::ValidationError(_) => ErrorKind::ValidationFailed,
            Error::DuplicateIdentifier(..)
            | Error::ConfigurationError(_)
            | Error::Internal(_)
            | Error::Database(_)
            | Error::Migration(_)
            | Error::Serialization(_)
            | Error::DecimalError(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller caused the error (as opposed to an internal or dependency problem)
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::NotFound | ErrorKind::Conflict | ErrorKind::ValidationFailed
        )
    }

    /// Text safe to show to the caller
    pub fn public_message(&self) -> String {
        if self.is_caller_error() {
            self.to_string()
        } else {
            GENERIC_FAILURE_MESSAGE.to_string()
        }
    }
}

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::UserNotFound(msg) => Error::UserNotFound(format!("{}: {}", context, msg)),
                Error::Conflict(msg) => Error::Conflict(format!("{}: {}", context, msg)),
                Error::UpstreamUnavailable(msg) => Error::UpstreamUnavailable(format!("{}: {}", context, msg)),
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::DecimalError(msg) => Error::DecimalError(format!("{}: {}", context, msg)),
                Error::GenerationExhausted(class) => Error::GenerationExhausted(class),
                Error::DuplicateIdentifier(class, value) => Error::DuplicateIdentifier(class, value),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

/// From rust_decimal::Error
impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::DecimalError(err.to_string())
    }
}
