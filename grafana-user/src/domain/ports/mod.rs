//! Domain ports and supporting types for the hexagonal boundary.

mod grafana_user_api;
mod user_reconciliation;

#[cfg(test)]
pub use grafana_user_api::MockGrafanaUserApi;
pub use grafana_user_api::{GrafanaApiError, GrafanaUserApi, PasswordProbe, UserLookup};
pub use user_reconciliation::{ReconcileOutcome, UserReconciliation};
