//! Domain-level error types.
//!
//! Every failure terminates the run. Variants record which phase failed so
//! the reporter can produce one descriptive message; none of them carry
//! passwords.

use std::fmt;

/// Validation errors raised while normalising caller input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent or blank.
    MissingField {
        /// Name of the missing input field.
        field: &'static str,
    },
    /// The `state` field held something other than `present` or `absent`.
    InvalidState {
        /// The rejected value.
        value: String,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing required field: {field}"),
            Self::InvalidState { value } => write!(
                f,
                "state must be one of \"present\" or \"absent\", got \"{value}\""
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Mutating call that failed after being issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// `DELETE /api/admin/users/{id}`.
    Delete,
    /// `POST /api/admin/users`.
    Create,
    /// `PUT /api/admin/users/{id}/password`.
    ResetPassword,
    /// `PUT /api/users/{id}`.
    UpdateAttributes,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Delete => "user deletion",
            Self::Create => "user creation",
            Self::ResetPassword => "password reset",
            Self::UpdateAttributes => "attribute update",
        };
        f.write_str(label)
    }
}

/// Fatal outcome of one reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReconcileError {
    /// Caller input was incomplete or malformed; no call was made.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    /// Grafana rejected the administrative credentials.
    #[error("administrative credentials rejected: {message}")]
    Auth {
        /// Message reported by Grafana.
        message: String,
    },
    /// Grafana could not be reached, or the base URL is unusable.
    #[error("wrong Grafana url: {message}")]
    Transport {
        /// Transport-level cause.
        message: String,
    },
    /// A mutating call failed; earlier mutations in the run stay applied.
    #[error("{operation} failed: {message}")]
    Mutation {
        /// Which call failed.
        operation: MutationKind,
        /// Cause captured from the failed call.
        message: String,
    },
    /// Grafana answered with a body none of the known shapes match.
    #[error("unexpected response from Grafana: {message}")]
    UnexpectedResponse {
        /// Description of the unrecognised response.
        message: String,
    },
}

impl ReconcileError {
    /// Construct a [`ReconcileError::Mutation`].
    #[must_use]
    pub fn mutation(operation: MutationKind, message: impl Into<String>) -> Self {
        Self::Mutation {
            operation,
            message: message.into(),
        }
    }
}
