//! VesselHarbor configuration library
//!
//! Layered configuration resolution for the VesselHarbor command-line client,
//! exported for the binary and for integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod paths;
