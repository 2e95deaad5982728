//! Operator credentials for Grafana's administrative endpoints.

use std::fmt;

use zeroize::Zeroizing;

use super::error::ValidationError;

/// Login/password pair used for every call except the password probe.
///
/// # Examples
/// ```
/// use grafana_user::domain::AdminCredentials;
///
/// let creds = AdminCredentials::try_from_parts(Some("admin"), Some("secret"))?;
/// assert_eq!(creds.login(), "admin");
/// assert_eq!(creds.password(), "secret");
/// # Ok::<(), grafana_user::domain::ValidationError>(())
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AdminCredentials {
    login: String,
    password: Zeroizing<String>,
}

impl AdminCredentials {
    /// Construct credentials from optional raw inputs.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] naming `admin_login` or
    /// `admin_password` when either is absent or blank.
    pub fn try_from_parts(
        login: Option<&str>,
        password: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let login = login
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ValidationError::MissingField {
                field: "admin_login",
            })?;
        let password = password
            .filter(|value| !value.is_empty())
            .ok_or(ValidationError::MissingField {
                field: "admin_password",
            })?;

        Ok(Self {
            login: login.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Operator login.
    #[must_use]
    pub fn login(&self) -> &str {
        self.login.as_str()
    }

    /// Operator password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("login", &self.login)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some("pw"), "admin_login")]
    #[case(Some("  "), Some("pw"), "admin_login")]
    #[case(Some("admin"), None, "admin_password")]
    #[case(Some("admin"), Some(""), "admin_password")]
    fn incomplete_credentials_are_rejected(
        #[case] login: Option<&str>,
        #[case] password: Option<&str>,
        #[case] field: &'static str,
    ) {
        let error = AdminCredentials::try_from_parts(login, password)
            .expect_err("incomplete credentials must fail");
        assert_eq!(error, ValidationError::MissingField { field });
    }

    #[test]
    fn debug_output_redacts_the_password() {
        let creds =
            AdminCredentials::try_from_parts(Some("admin"), Some("hunter2")).expect("valid");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("admin"));
        assert!(!rendered.contains("hunter2"));
    }
}
