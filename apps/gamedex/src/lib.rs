//! # gamedex
//!
//! The gamedex application: HTTP API, CLI and server configuration over
//! the synchronous catalog engine in `gamedex-core`.

pub mod api;
pub mod cli;
pub mod config;
