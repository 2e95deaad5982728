//! Driven port for Grafana's user administration API.
//!
//! The adapter owns response classification: Grafana signals several
//! failures through JSON bodies rather than status codes, so callers receive
//! already-classified outcomes instead of raw HTTP responses.

use async_trait::async_trait;

use crate::domain::{RemoteUser, RemoteUserId, UserAttributes};

/// Result of looking a login up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    /// Grafana has no user matching the login.
    NotFound,
    /// Grafana returned a user record.
    Found(RemoteUser),
}

/// Result of authenticating as the managed user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordProbe {
    /// The candidate password authenticated.
    Accepted,
    /// Grafana reported "Invalid username or password".
    Rejected,
}

/// Errors surfaced while calling Grafana.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GrafanaApiError {
    /// The request could not be sent or the base URL is unusable.
    #[error("grafana transport failed: {message}")]
    Transport {
        /// Transport-level cause.
        message: String,
    },
    /// The request exceeded its timeout.
    #[error("grafana request timed out: {message}")]
    Timeout {
        /// Timeout detail.
        message: String,
    },
    /// Grafana rejected the credentials the request carried.
    #[error("{message}")]
    Unauthorized {
        /// Message reported by Grafana.
        message: String,
    },
    /// Grafana answered with a non-success status.
    #[error("grafana rejected the request with status {status}: {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Preview of the response body.
        message: String,
    },
    /// The response matched none of the recognised shapes.
    #[error("{message}")]
    UnexpectedResponse {
        /// Description of the response.
        message: String,
    },
}

impl GrafanaApiError {
    /// Request never completed at the network level.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Request ran past its deadline.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Grafana refused the credentials.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Grafana answered `status` with `message` as the body preview.
    #[must_use]
    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    /// Grafana answered with a body no classification recognises.
    #[must_use]
    pub fn unexpected_response(message: impl Into<String>) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }

}

/// Port for the Grafana user endpoints used by reconciliation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GrafanaUserApi: Send + Sync {
    /// Look a user up by login (`GET /api/users/lookup`).
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use grafana_user::domain::ports::{GrafanaUserApi, UserLookup};
    ///
    /// match api.lookup_user("test1").await? {
    ///     UserLookup::NotFound => println!("absent"),
    ///     UserLookup::Found(user) => println!("id {}", user.id),
    /// }
    /// # Ok::<(), grafana_user::domain::ports::GrafanaApiError>(())
    /// ```
    async fn lookup_user(&self, login: &str) -> Result<UserLookup, GrafanaApiError>;

    /// Delete a user (`DELETE /api/admin/users/{id}`).
    async fn delete_user(&self, id: RemoteUserId) -> Result<(), GrafanaApiError>;

    /// Create a user (`POST /api/admin/users`).
    async fn create_user(
        &self,
        attributes: &UserAttributes,
        password: &str,
    ) -> Result<(), GrafanaApiError>;

    /// Authenticate as `login` with `password` against `GET /api/org`.
    async fn probe_password(
        &self,
        login: &str,
        password: &str,
    ) -> Result<PasswordProbe, GrafanaApiError>;

    /// Force a password (`PUT /api/admin/users/{id}/password`).
    async fn reset_password(&self, id: RemoteUserId, password: &str)
    -> Result<(), GrafanaApiError>;

    /// Replace login, name, and email (`PUT /api/users/{id}`).
    async fn update_user(
        &self,
        id: RemoteUserId,
        attributes: &UserAttributes,
    ) -> Result<(), GrafanaApiError>;
}

#[cfg(test)]
mod tests {
    //! Rendering of adapter errors.

    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        GrafanaApiError::transport("connection refused"),
        "grafana transport failed: connection refused"
    )]
    #[case(
        GrafanaApiError::timeout("after 30s"),
        "grafana request timed out: after 30s"
    )]
    #[case(
        GrafanaApiError::unauthorized("Invalid username or password"),
        "Invalid username or password"
    )]
    #[case(
        GrafanaApiError::rejected(412_u16, "login taken"),
        "grafana rejected the request with status 412: login taken"
    )]
    #[case(GrafanaApiError::unexpected_response("empty body"), "empty body")]
    fn errors_render_their_detail(#[case] error: GrafanaApiError, #[case] expected: &str) {
        assert_eq!(error.to_string(), expected);
    }
}
