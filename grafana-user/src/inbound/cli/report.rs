//! Structured result written to the caller.
//!
//! Success renders as `{"changed": bool}`; failure as
//! `{"failed": true, "msg": "..."}` with every secret redacted.

use std::process::ExitCode;

use serde::Serialize;

use crate::domain::ports::ReconcileOutcome;

/// Replacement text for redacted secrets.
pub const REDACTED: &str = "********";

/// Terminal report of one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RunReport {
    /// The run converged.
    Success {
        /// Whether any mutation was applied.
        changed: bool,
    },
    /// The run halted.
    Failure {
        /// Always `true`.
        failed: bool,
        /// Redacted failure message.
        msg: String,
    },
}

impl RunReport {
    /// Report a successful run.
    #[must_use]
    pub const fn success(outcome: ReconcileOutcome) -> Self {
        Self::Success {
            changed: outcome.changed,
        }
    }

    /// Report a failed run, redacting `secrets` from `message`.
    ///
    /// # Examples
    /// ```
    /// use grafana_user::inbound::cli::RunReport;
    ///
    /// let report = RunReport::failure("login hunter2 refused", &["hunter2"]);
    /// assert_eq!(report.message(), Some("login ******** refused"));
    /// ```
    #[must_use]
    pub fn failure(message: impl AsRef<str>, secrets: &[&str]) -> Self {
        Self::Failure {
            failed: true,
            msg: redact(message.as_ref(), secrets),
        }
    }

    /// Failure message, if the run failed.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { msg, .. } => Some(msg.as_str()),
        }
    }

    /// Process exit code for this report.
    #[must_use]
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::Success { .. } => ExitCode::SUCCESS,
            Self::Failure { .. } => ExitCode::FAILURE,
        }
    }
}

/// Replace every occurrence of each non-empty secret with [`REDACTED`].
///
/// Longer secrets are replaced first so a secret containing another is
/// removed whole.
#[must_use]
pub fn redact(message: &str, secrets: &[&str]) -> String {
    let mut ordered: Vec<&str> = secrets
        .iter()
        .copied()
        .filter(|secret| !secret.is_empty())
        .collect();
    ordered.sort_by_key(|secret| std::cmp::Reverse(secret.len()));

    ordered
        .into_iter()
        .fold(message.to_owned(), |text, secret| text.replace(secret, REDACTED))
}
