//! Command-line adapter.
//!
//! Settings arrive from flags, environment, and configuration files via
//! OrthoConfig; the result leaves as a single JSON document on stdout.

mod report;
mod settings;

pub use report::{REDACTED, RunReport, redact};
pub use settings::{GrafanaUserSettings, display_request};
