//! Grafana outbound adapters.
//!
//! This module provides an HTTP implementation of the `GrafanaUserApi` port.

mod dto;
mod http_api;

pub use http_api::{DEFAULT_REQUEST_TIMEOUT, GrafanaEndpoint, GrafanaHttpApi};
