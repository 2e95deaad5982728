//! Composition root: wires settings, the Grafana adapter, and the
//! reconciliation service into one run.

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::ports::{GrafanaApiError, ReconcileOutcome, UserReconciliation};
use crate::domain::{ReconcileError, UserReconciliationService};
use crate::inbound::cli::{GrafanaUserSettings, RunReport};
use crate::outbound::grafana::{GrafanaEndpoint, GrafanaHttpApi};

/// Execute one reconciliation described by `settings`.
///
/// Never panics on remote or input failures; every outcome is folded into
/// the returned [`RunReport`].
pub async fn run(settings: &GrafanaUserSettings) -> RunReport {
    match reconcile(settings).await {
        Ok(outcome) => {
            info!(
                login = settings.login.as_deref().unwrap_or_default(),
                changed = outcome.changed,
                check_mode = settings.check_mode(),
                "reconciliation finished"
            );
            RunReport::success(outcome)
        }
        Err(failure) => {
            let report = RunReport::failure(failure.to_string(), &settings.secrets());
            error!(
                login = settings.login.as_deref().unwrap_or_default(),
                message = report.message().unwrap_or_default(),
                "reconciliation failed"
            );
            report
        }
    }
}

async fn reconcile(settings: &GrafanaUserSettings) -> Result<ReconcileOutcome, ReconcileError> {
    let desired = settings.desired_user()?;
    let admin = settings.admin_credentials()?;
    let endpoint = GrafanaEndpoint {
        base_url: settings.base_url()?.to_owned(),
        verify_tls: settings.verify_tls(),
        timeout: settings.timeout(),
    };

    let api = GrafanaHttpApi::new(endpoint, admin).map_err(|failure| match failure {
        GrafanaApiError::Transport { message } => ReconcileError::Transport { message },
        other => ReconcileError::Transport {
            message: other.to_string(),
        },
    })?;
    let service =
        UserReconciliationService::new(Arc::new(api)).with_check_mode(settings.check_mode());
    service.reconcile(&desired).await
}
