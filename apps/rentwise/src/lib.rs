//! # rentwise
//!
//! HTTP server, reminder scheduler and CLI for the Rentwise rental ledger.
//!
//! The binary in `main.rs` is a thin wrapper over [`cli::execute`]; the
//! library exists so integration tests can build the router directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod notify;
pub mod scheduler;
