//! Desired and remote user models.
//!
//! [`DesiredUser`] is the caller's target state after normalisation;
//! [`RemoteUser`] is what Grafana reported for the same login. Both share
//! [`UserAttributes`], the fixed set of identity fields compared during
//! reconciliation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use super::error::ValidationError;

/// Email applied when the caller does not provide one.
pub const DEFAULT_EMAIL: &str = "no_email";

/// Whether the user should exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserState {
    /// The user must exist with the desired attributes and password.
    #[default]
    Present,
    /// The user must not exist.
    Absent,
}

impl FromStr for UserState {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "present" => Ok(Self::Present),
            "absent" => Ok(Self::Absent),
            other => Err(ValidationError::InvalidState {
                value: other.to_owned(),
            }),
        }
    }
}

/// One of the identity fields compared between desired and remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeField {
    /// The login.
    Login,
    /// The display name.
    Name,
    /// The email address.
    Email,
}

impl AttributeField {
    /// Comparison order used when diffing attributes.
    pub const ORDER: [Self; 3] = [Self::Login, Self::Name, Self::Email];
}

/// Identity attributes managed by reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAttributes {
    /// Unique login.
    pub login: String,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
}

impl UserAttributes {
    /// Borrow the value of one field.
    #[must_use]
    pub fn field(&self, field: AttributeField) -> &str {
        match field {
            AttributeField::Login => self.login.as_str(),
            AttributeField::Name => self.name.as_str(),
            AttributeField::Email => self.email.as_str(),
        }
    }

    /// Return the first field, in [`AttributeField::ORDER`], whose value
    /// differs from `other`.
    ///
    /// # Examples
    /// ```
    /// use grafana_user::domain::{AttributeField, UserAttributes};
    ///
    /// let desired = UserAttributes {
    ///     login: "test1".to_owned(),
    ///     name: "Test User".to_owned(),
    ///     email: "t@example.com".to_owned(),
    /// };
    /// let mut remote = desired.clone();
    /// remote.email = "old@example.com".to_owned();
    /// assert_eq!(desired.first_difference(&remote), Some(AttributeField::Email));
    /// ```
    #[must_use]
    pub fn first_difference(&self, other: &Self) -> Option<AttributeField> {
        AttributeField::ORDER
            .into_iter()
            .find(|field| self.field(*field) != other.field(*field))
    }
}

/// Raw caller-supplied fields before normalisation.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct DesiredUserInput {
    /// Login of the managed user.
    pub login: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// `present` or `absent`.
    pub state: Option<String>,
    /// Password the user must end up with.
    pub password: Option<String>,
}

impl fmt::Debug for DesiredUserInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredUserInput")
            .field("login", &self.login)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("state", &self.state)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Validated target state for one user.
///
/// ## Invariants
/// - `login` is not blank. It is kept exactly as supplied, surrounding
///   whitespace included.
/// - `password` is non-empty and only ever leaves this type through
///   [`DesiredUser::password`].
#[derive(Clone, PartialEq, Eq)]
pub struct DesiredUser {
    attributes: UserAttributes,
    password: Zeroizing<String>,
    state: UserState,
}

impl DesiredUser {
    /// Normalise raw input, applying defaults for optional fields.
    ///
    /// # Examples
    /// ```
    /// use grafana_user::domain::{DEFAULT_EMAIL, DesiredUser, DesiredUserInput, UserState};
    ///
    /// let user = DesiredUser::try_from_input(DesiredUserInput {
    ///     login: Some("test1".to_owned()),
    ///     password: Some("p".to_owned()),
    ///     ..DesiredUserInput::default()
    /// })?;
    /// assert_eq!(user.attributes().email, DEFAULT_EMAIL);
    /// assert_eq!(user.state(), UserState::Present);
    /// # Ok::<(), grafana_user::domain::ValidationError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MissingField`] when `login` or `password`
    /// is absent or blank, and [`ValidationError::InvalidState`] for any state
    /// other than `present`/`absent`.
    pub fn try_from_input(input: DesiredUserInput) -> Result<Self, ValidationError> {
        let DesiredUserInput {
            login: raw_login,
            name,
            email,
            state: raw_state,
            password: raw_password,
        } = input;

        let login = raw_login
            .filter(|value| !value.trim().is_empty())
            .ok_or(ValidationError::MissingField { field: "login" })?;
        let password = raw_password
            .filter(|value| !value.is_empty())
            .map(Zeroizing::new)
            .ok_or(ValidationError::MissingField { field: "password" })?;
        let state = raw_state
            .as_deref()
            .map(str::trim)
            .map(UserState::from_str)
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            attributes: UserAttributes {
                login,
                name: name.unwrap_or_default(),
                email: email.unwrap_or_else(|| DEFAULT_EMAIL.to_owned()),
            },
            password,
            state,
        })
    }

    /// Login of the managed user.
    #[must_use]
    pub fn login(&self) -> &str {
        self.attributes.login.as_str()
    }

    /// Desired identity attributes.
    #[must_use]
    pub const fn attributes(&self) -> &UserAttributes {
        &self.attributes
    }

    /// Desired password.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.as_str()
    }

    /// Whether the user should exist.
    #[must_use]
    pub const fn state(&self) -> UserState {
        self.state
    }
}

impl fmt::Debug for DesiredUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesiredUser")
            .field("attributes", &self.attributes)
            .field("password", &"<redacted>")
            .field("state", &self.state)
            .finish()
    }
}

/// Identifier Grafana assigned to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteUserId(i64);

impl RemoteUserId {
    /// Wrap a Grafana user id.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw numeric id.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RemoteUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User record as reported by Grafana.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUser {
    /// Grafana-assigned id.
    pub id: RemoteUserId,
    /// Attributes currently stored by Grafana.
    pub attributes: UserAttributes,
}
