//! # gtss
//!
//! Library half of the GTSS inventory binary: the HTTP API, the CLI and
//! configuration loading. `main.rs` is a thin entry point over these, and
//! the integration tests drive the router through `gtss::api`.

pub mod api;
pub mod cli;
pub mod config;
pub mod storage;
