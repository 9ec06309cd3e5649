//! Integration test suite for jv
//!
//! End-to-end tests of the three pipelines against temp directories and a
//! local HTTP server, plus smoke tests of the `jv` binary.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **environment**: store rewrites through the shell profile store
//! - **install**: install, reinstall, discover and uninstall
//! - **self_update**: release lookup, update and rollback
//! - **cli**: the binary with an isolated configuration

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod environment;
mod install;
mod self_update;
