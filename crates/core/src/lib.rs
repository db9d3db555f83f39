//! Shared primitives for all Ephemera crates.

#![forbid(unsafe_code)]

/// Session identity shared between the API layer and services.
pub mod auth;

use thiserror::Error;

pub use auth::SessionIdentity;

/// Result type used across Ephemera crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// User is not authenticated or not allowed to access a resource.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// User is authenticated but blocked by authorization policy.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A rate limit event exceeded its configured threshold.
    ///
    /// The increment that triggered the violation is already applied when
    /// this error is raised, so `count` reflects the over-limit value.
    #[error("rate limit exceeded for '{event}': {count} attempts")]
    RateLimited {
        /// The throttled event name.
        event: String,
        /// The subject identifier the counter is scoped to.
        identifier: String,
        /// The counter value that crossed the threshold.
        count: i64,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
