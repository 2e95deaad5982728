//! Inbound adapters that drive the domain.
//!
//! - **cli**: layered settings for one invocation and the structured result
//!   written back to the caller

pub mod cli;
