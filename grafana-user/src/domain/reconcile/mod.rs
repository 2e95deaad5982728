//! User reconciliation service.
//!
//! Converges Grafana onto one [`DesiredUser`] with the fewest calls:
//! - existence first (delete or create);
//! - then, for an existing user that should stay, the password;
//! - then the identity attributes, in a single update carrying all of them.
//!
//! Every failure halts the run. Mutations already applied are not rolled back.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    GrafanaApiError, GrafanaUserApi, PasswordProbe, ReconcileOutcome, UserLookup,
    UserReconciliation,
};
use crate::domain::{DesiredUser, MutationKind, ReconcileError, RemoteUser, UserState};

/// Domain service implementing [`UserReconciliation`].
#[derive(Clone)]
pub struct UserReconciliationService<A> {
    api: Arc<A>,
    check_mode: bool,
}

impl<A> UserReconciliationService<A> {
    /// Create a service that applies the mutations it decides on.
    #[must_use]
    pub const fn new(api: Arc<A>) -> Self {
        Self {
            api,
            check_mode: false,
        }
    }

    /// Report what would change without issuing any mutating call.
    ///
    /// Lookup and the password probe still run, since both are read-only.
    #[must_use]
    pub const fn with_check_mode(mut self, check_mode: bool) -> Self {
        self.check_mode = check_mode;
        self
    }
}

impl<A: GrafanaUserApi> UserReconciliationService<A> {
    async fn remove(&self, remote: &RemoteUser) -> Result<bool, ReconcileError> {
        if !self.check_mode {
            self.api
                .delete_user(remote.id)
                .await
                .map_err(|error| map_mutation_error(MutationKind::Delete, &error))?;
        }
        Ok(true)
    }

    async fn create(&self, desired: &DesiredUser) -> Result<bool, ReconcileError> {
        if !self.check_mode {
            self.api
                .create_user(desired.attributes(), desired.password())
                .await
                .map_err(|error| map_mutation_error(MutationKind::Create, &error))?;
        }
        Ok(true)
    }

    async fn converge_password(
        &self,
        desired: &DesiredUser,
        remote: &RemoteUser,
    ) -> Result<bool, ReconcileError> {
        let probe = self
            .api
            .probe_password(desired.login(), desired.password())
            .await
            .map_err(map_read_error)?;
        if probe == PasswordProbe::Accepted {
            return Ok(false);
        }

        if !self.check_mode {
            self.api
                .reset_password(remote.id, desired.password())
                .await
                .map_err(|error| map_mutation_error(MutationKind::ResetPassword, &error))?;
        }
        Ok(true)
    }

    async fn converge_attributes(
        &self,
        desired: &DesiredUser,
        remote: &RemoteUser,
    ) -> Result<bool, ReconcileError> {
        if desired
            .attributes()
            .first_difference(&remote.attributes)
            .is_none()
        {
            return Ok(false);
        }

        if !self.check_mode {
            self.api
                .update_user(remote.id, desired.attributes())
                .await
                .map_err(|error| map_mutation_error(MutationKind::UpdateAttributes, &error))?;
        }
        Ok(true)
    }
}

#[async_trait]
impl<A: GrafanaUserApi> UserReconciliation for UserReconciliationService<A> {
    async fn reconcile(&self, desired: &DesiredUser) -> Result<ReconcileOutcome, ReconcileError> {
        let current = self
            .api
            .lookup_user(desired.login())
            .await
            .map_err(map_read_error)?;

        let changed = match (desired.state(), current) {
            (UserState::Absent, UserLookup::NotFound) => false,
            (UserState::Absent, UserLookup::Found(remote)) => self.remove(&remote).await?,
            (UserState::Present, UserLookup::NotFound) => self.create(desired).await?,
            (UserState::Present, UserLookup::Found(remote)) => {
                // The password step runs to completion before attributes are diffed.
                let password_changed = self.converge_password(desired, &remote).await?;
                let attributes_changed = self.converge_attributes(desired, &remote).await?;
                password_changed || attributes_changed
            }
        };

        Ok(ReconcileOutcome { changed })
    }
}

fn map_read_error(error: GrafanaApiError) -> ReconcileError {
    match error {
        GrafanaApiError::Transport { message } | GrafanaApiError::Timeout { message } => {
            ReconcileError::Transport { message }
        }
        GrafanaApiError::Unauthorized { message } => ReconcileError::Auth { message },
        other @ (GrafanaApiError::Rejected { .. } | GrafanaApiError::UnexpectedResponse { .. }) => {
            ReconcileError::UnexpectedResponse {
                message: other.to_string(),
            }
        }
    }
}

fn map_mutation_error(operation: MutationKind, error: &GrafanaApiError) -> ReconcileError {
    ReconcileError::mutation(operation, error.to_string())
}

#[cfg(test)]
mod tests;
