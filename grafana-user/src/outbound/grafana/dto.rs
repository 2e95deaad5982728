//! DTOs for Grafana request and response bodies.
//!
//! Grafana reports several failures as a bare `{"message": ...}` body, so the
//! response DTOs keep every field optional and leave classification to the
//! adapter.

use serde::{Deserialize, Serialize};

use crate::domain::{RemoteUser, RemoteUserId, UserAttributes};

/// Body of `GET /api/users/lookup`, either a user record or a message.
#[derive(Debug, Deserialize)]
pub(super) struct LookupResponseDto {
    pub(super) id: Option<i64>,
    pub(super) login: Option<String>,
    pub(super) name: Option<String>,
    pub(super) email: Option<String>,
    pub(super) message: Option<String>,
}

impl LookupResponseDto {
    /// Convert into a domain record when Grafana returned a usable id.
    pub(super) fn into_remote_user(self) -> Option<RemoteUser> {
        let id = self.id.filter(|id| *id != 0)?;
        Some(RemoteUser {
            id: RemoteUserId::new(id),
            attributes: UserAttributes {
                login: self.login.unwrap_or_default(),
                name: self.name.unwrap_or_default(),
                email: self.email.unwrap_or_default(),
            },
        })
    }
}

/// Any body that may carry a `message` field.
#[derive(Debug, Default, Deserialize)]
pub(super) struct MessageDto {
    pub(super) message: Option<String>,
}

/// Body of `POST /api/admin/users`.
#[derive(Serialize)]
pub(super) struct CreateUserDto<'a> {
    pub(super) name: &'a str,
    pub(super) email: &'a str,
    pub(super) login: &'a str,
    pub(super) password: &'a str,
}

impl<'a> CreateUserDto<'a> {
    pub(super) fn new(attributes: &'a UserAttributes, password: &'a str) -> Self {
        Self {
            name: attributes.name.as_str(),
            email: attributes.email.as_str(),
            login: attributes.login.as_str(),
            password,
        }
    }
}

/// Body of `PUT /api/users/{id}`.
#[derive(Debug, Serialize)]
pub(super) struct UpdateUserDto<'a> {
    pub(super) login: &'a str,
    pub(super) name: &'a str,
    pub(super) email: &'a str,
}

impl<'a> From<&'a UserAttributes> for UpdateUserDto<'a> {
    fn from(attributes: &'a UserAttributes) -> Self {
        Self {
            login: attributes.login.as_str(),
            name: attributes.name.as_str(),
            email: attributes.email.as_str(),
        }
    }
}

/// Body of `PUT /api/admin/users/{id}/password`.
#[derive(Serialize)]
pub(super) struct PasswordResetDto<'a> {
    pub(super) password: &'a str,
}
