//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **grafana**: reqwest-backed implementation of `GrafanaUserApi`
//!
//! Adapters are thin translators between domain types and the remote wire
//! format. The only decisions they make are response classifications that
//! depend on Grafana's body conventions.

pub mod grafana;
