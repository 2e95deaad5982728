//! Driving port for reconciling one user.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{DesiredUser, ReconcileError};

/// Terminal output of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Whether any mutating call was applied (or, in check mode, would be).
    pub changed: bool,
}

/// Driving port for converging Grafana onto a desired user state.
#[async_trait]
pub trait UserReconciliation: Send + Sync {
    /// Run one reconciliation.
    async fn reconcile(&self, desired: &DesiredUser) -> Result<ReconcileOutcome, ReconcileError>;
}
