//! # labtrack
//!
//! Binary-side library: HTTP API, CLI, settings, and the backend client.
//! Exposed as a library so integration tests can build the router.

pub mod api;
pub mod backend;
pub mod cli;
pub mod config;
