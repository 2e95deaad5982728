//! Test utilities for the grafana-user crate.
//!
//! This module provides an in-memory stand-in for Grafana's user API so unit
//! tests (in `src/`) and integration tests (in `tests/`) can exercise whole
//! reconciliation runs, including repeated runs against the same state. It
//! is only compiled for tests or with the `test-support` feature.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{GrafanaApiError, GrafanaUserApi, PasswordProbe, UserLookup};
use crate::domain::{RemoteUser, RemoteUserId, UserAttributes};

/// Mutating call observed by [`InMemoryGrafanaUserApi`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedMutation {
    /// A user was deleted.
    Delete(RemoteUserId),
    /// A user was created with the given attributes.
    Create(UserAttributes),
    /// A user's password was reset.
    ResetPassword(RemoteUserId),
    /// A user's attributes were replaced.
    Update(RemoteUserId, UserAttributes),
}

#[derive(Debug, Clone)]
struct StoredUser {
    attributes: UserAttributes,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    users: BTreeMap<RemoteUserId, StoredUser>,
    next_id: i64,
    mutations: Vec<RecordedMutation>,
    reject_admin: bool,
}

/// In-memory Grafana holding users, passwords, and a mutation log.
#[derive(Debug, Default)]
pub struct InMemoryGrafanaUserApi {
    state: Mutex<State>,
}

impl InMemoryGrafanaUserApi {
    /// Start with no users.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user and return the id Grafana would have assigned.
    #[must_use]
    pub fn insert_user(&self, attributes: UserAttributes, password: &str) -> RemoteUserId {
        let mut state = self.lock();
        let id = allocate_id(&mut state);
        state.users.insert(
            id,
            StoredUser {
                attributes,
                password: password.to_owned(),
            },
        );
        id
    }

    /// Make every administrative call fail as if the operator password were wrong.
    pub fn reject_admin_credentials(&self) {
        self.lock().reject_admin = true;
    }

    /// Mutations applied so far, in call order.
    #[must_use]
    pub fn mutations(&self) -> Vec<RecordedMutation> {
        self.lock().mutations.clone()
    }

    /// Attributes currently stored for `login`.
    #[must_use]
    pub fn user(&self, login: &str) -> Option<UserAttributes> {
        self.lock()
            .users
            .values()
            .find(|user| user.attributes.login == login)
            .map(|user| user.attributes.clone())
    }

    /// Whether `password` is the stored password for `login`.
    #[must_use]
    pub fn password_matches(&self, login: &str, password: &str) -> bool {
        self.lock()
            .users
            .values()
            .any(|user| user.attributes.login == login && user.password == password)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admin_state(&self) -> Result<MutexGuard<'_, State>, GrafanaApiError> {
        let state = self.lock();
        if state.reject_admin {
            return Err(GrafanaApiError::unauthorized("Invalid username or password"));
        }
        Ok(state)
    }
}

fn allocate_id(state: &mut State) -> RemoteUserId {
    state.next_id += 1;
    RemoteUserId::new(state.next_id)
}

fn missing_user(id: RemoteUserId) -> GrafanaApiError {
    GrafanaApiError::rejected(404_u16, format!("{{\"message\":\"user {id} not found\"}}"))
}

#[async_trait]
impl GrafanaUserApi for InMemoryGrafanaUserApi {
    async fn lookup_user(&self, login: &str) -> Result<UserLookup, GrafanaApiError> {
        let state = self.admin_state()?;
        let found = state.users.iter().find(|(_, user)| {
            user.attributes.login == login || user.attributes.email == login
        });
        Ok(found.map_or(UserLookup::NotFound, |(id, user)| {
            UserLookup::Found(RemoteUser {
                id: *id,
                attributes: user.attributes.clone(),
            })
        }))
    }

    async fn delete_user(&self, id: RemoteUserId) -> Result<(), GrafanaApiError> {
        let mut state = self.admin_state()?;
        state.users.remove(&id).ok_or_else(|| missing_user(id))?;
        state.mutations.push(RecordedMutation::Delete(id));
        Ok(())
    }

    async fn create_user(
        &self,
        attributes: &UserAttributes,
        password: &str,
    ) -> Result<(), GrafanaApiError> {
        let mut state = self.admin_state()?;
        let id = allocate_id(&mut state);
        state.users.insert(
            id,
            StoredUser {
                attributes: attributes.clone(),
                password: password.to_owned(),
            },
        );
        state
            .mutations
            .push(RecordedMutation::Create(attributes.clone()));
        Ok(())
    }

    async fn probe_password(
        &self,
        login: &str,
        password: &str,
    ) -> Result<PasswordProbe, GrafanaApiError> {
        if self.password_matches(login, password) {
            Ok(PasswordProbe::Accepted)
        } else {
            Ok(PasswordProbe::Rejected)
        }
    }

    async fn reset_password(
        &self,
        id: RemoteUserId,
        password: &str,
    ) -> Result<(), GrafanaApiError> {
        let mut state = self.admin_state()?;
        let user = state.users.get_mut(&id).ok_or_else(|| missing_user(id))?;
        password.clone_into(&mut user.password);
        state.mutations.push(RecordedMutation::ResetPassword(id));
        Ok(())
    }

    async fn update_user(
        &self,
        id: RemoteUserId,
        attributes: &UserAttributes,
    ) -> Result<(), GrafanaApiError> {
        let mut state = self.admin_state()?;
        let user = state.users.get_mut(&id).ok_or_else(|| missing_user(id))?;
        user.attributes = attributes.clone();
        state
            .mutations
            .push(RecordedMutation::Update(id, attributes.clone()));
        Ok(())
    }
}
