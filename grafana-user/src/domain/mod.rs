//! Domain model and reconciliation logic.
//!
//! Purpose: describe the user the caller wants, the user Grafana reports, and
//! the rules for converging one onto the other. Nothing in here knows about
//! HTTP; the remote service is reached only through [`ports::GrafanaUserApi`].
//!
//! Public surface:
//! - `DesiredUser` / `DesiredUserInput`: normalised caller intent.
//! - `RemoteUser` / `RemoteUserId`: Grafana's view of the user.
//! - `AdminCredentials`: operator login used for administrative calls.
//! - `ReconcileError` / `ValidationError`: failure taxonomy.
//! - `UserReconciliationService`: the reconciler.

pub mod credentials;
pub mod error;
pub mod ports;
pub mod reconcile;
pub mod user;

pub use self::credentials::AdminCredentials;
pub use self::error::{MutationKind, ReconcileError, ValidationError};
pub use self::reconcile::UserReconciliationService;
pub use self::user::{
    AttributeField, DEFAULT_EMAIL, DesiredUser, DesiredUserInput, RemoteUser, RemoteUserId,
    UserAttributes, UserState,
};
