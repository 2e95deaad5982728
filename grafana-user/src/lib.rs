//! Declarative reconciliation of one Grafana user.
//!
//! The crate is split along hexagonal lines:
//!
//! - [`domain`] holds the desired/remote user model, the error taxonomy, and
//!   the reconciliation service, plus the ports it drives.
//! - [`outbound`] implements the Grafana port over HTTP.
//! - [`inbound`] loads layered settings and renders the result.
//! - [`app`] wires the three together for one run.

pub mod app;
pub mod domain;
pub mod inbound;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
