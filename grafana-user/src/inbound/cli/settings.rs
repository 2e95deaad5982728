//! Invocation settings loaded via OrthoConfig.

use std::env;
use std::ffi::OsString;
use std::fmt;
use std::time::Duration;

use ortho_config::{OrthoConfig, OrthoError, is_display_request};
use serde::Deserialize;

use crate::domain::{AdminCredentials, DesiredUser, DesiredUserInput, ValidationError};

// The derive turns a field spelled `bool` into a presence switch whose implicit
// `false` outranks the environment. The alias keeps these as value-taking
// options (`--verify-tls false`) that stay unset unless supplied.
type Toggle = bool;

const SECRET_FLAGS: [(&str, &str); 2] = [("--password", "-p"), ("--admin-password", "-A")];
const SECRET_VARS: [&str; 2] = ["GRAFANA_USER_PASSWORD", "GRAFANA_USER_ADMIN_PASSWORD"];

/// Desired user state plus the Grafana instance and operator to use.
///
/// Every field may come from a `--kebab-case` flag, a `GRAFANA_USER_*`
/// environment variable, or a configuration file.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GRAFANA_USER")]
pub struct GrafanaUserSettings {
    /// Login of the managed user.
    pub login: Option<String>,
    /// Display name; empty when omitted.
    pub name: Option<String>,
    /// Email address; `no_email` when omitted.
    pub email: Option<String>,
    /// `present` (default) or `absent`.
    pub state: Option<String>,
    /// Password the managed user must end up with.
    #[ortho_config(cli_short = 'p')]
    pub password: Option<String>,
    /// Operator login for administrative calls.
    pub admin_login: Option<String>,
    /// Operator password for administrative calls.
    #[ortho_config(cli_short = 'A')]
    pub admin_password: Option<String>,
    /// Grafana base URL.
    pub base_url: Option<String>,
    /// Verify Grafana's TLS certificate; on unless set to `false`.
    pub verify_tls: Option<Toggle>,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 30)]
    pub timeout_secs: u64,
    /// Report what would change without mutating anything; off by default.
    pub check_mode: Option<Toggle>,
}

impl GrafanaUserSettings {
    /// Normalise the desired user fields.
    ///
    /// # Errors
    ///
    /// Propagates [`DesiredUser::try_from_input`] failures.
    pub fn desired_user(&self) -> Result<DesiredUser, ValidationError> {
        DesiredUser::try_from_input(DesiredUserInput {
            login: self.login.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            state: self.state.clone(),
            password: self.password.clone(),
        })
    }

    /// Operator credentials.
    ///
    /// # Errors
    ///
    /// Propagates [`AdminCredentials::try_from_parts`] failures.
    pub fn admin_credentials(&self) -> Result<AdminCredentials, ValidationError> {
        AdminCredentials::try_from_parts(
            self.admin_login.as_deref(),
            self.admin_password.as_deref(),
        )
    }

    /// Grafana base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when it is absent or blank.
    pub fn base_url(&self) -> Result<&str, ValidationError> {
        self.base_url
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(ValidationError::MissingField { field: "base_url" })
    }

    /// Whether Grafana's TLS certificate must be verified.
    #[must_use]
    pub fn verify_tls(&self) -> bool {
        self.verify_tls.unwrap_or(true)
    }

    /// Whether mutations are only predicted.
    #[must_use]
    pub fn check_mode(&self) -> bool {
        self.check_mode.unwrap_or(false)
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Secret values that must never reach output.
    #[must_use]
    pub fn secrets(&self) -> Vec<&str> {
        [self.password.as_deref(), self.admin_password.as_deref()]
            .into_iter()
            .flatten()
            .filter(|secret| !secret.is_empty())
            .collect()
    }

    /// Password values visible before settings have loaded.
    ///
    /// Collects the password environment variables and the values passed to
    /// `--password`/`-p` and `--admin-password`/`-A` in `args`, so a loading
    /// failure can be reported without echoing them.
    #[must_use]
    pub fn raw_secrets(args: &[OsString]) -> Vec<String> {
        let words: Vec<String> = args
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();

        let mut secrets: Vec<String> = SECRET_VARS
            .iter()
            .filter_map(|name| env::var(name).ok())
            .collect();
        for (position, word) in words.iter().enumerate() {
            for (long, short) in SECRET_FLAGS {
                if word == long || word == short {
                    secrets.extend(words.get(position + 1).cloned());
                } else if let Some(value) = word
                    .strip_prefix(long)
                    .and_then(|rest| rest.strip_prefix('='))
                {
                    secrets.push(value.to_owned());
                } else if let Some(value) =
                    word.strip_prefix(short).filter(|rest| !rest.is_empty())
                {
                    secrets.push(value.trim_start_matches('=').to_owned());
                }
            }
        }
        secrets.retain(|secret| !secret.is_empty());
        secrets
    }
}

/// The `--help` or `--version` output carried by a loading failure, if any.
///
/// These arrive as errors from the argument parser but are successful
/// invocations.
#[must_use]
pub fn display_request(error: &OrthoError) -> Option<&clap::Error> {
    match error {
        OrthoError::CliParsing(parse_error) if is_display_request(parse_error) => {
            Some(parse_error.as_ref())
        }
        OrthoError::Aggregate(errors) => errors.iter().find_map(display_request),
        _ => None,
    }
}

impl fmt::Debug for GrafanaUserSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("GrafanaUserSettings")
            .field("login", &self.login)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("state", &self.state)
            .field("password", &redacted(&self.password))
            .field("admin_login", &self.admin_login)
            .field("admin_password", &redacted(&self.admin_password))
            .field("base_url", &self.base_url)
            .field("verify_tls", &self.verify_tls)
            .field("timeout_secs", &self.timeout_secs)
            .field("check_mode", &self.check_mode)
            .finish()
    }
}
