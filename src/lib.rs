//! jv - Java version switcher
//!
//! jv selects which installed JDK is active on a machine, installs new JDKs from
//! distributor catalogs, and keeps its own executable up to date. Every command
//! that mutates state runs through one of three pipelines built so that a failure
//! at any step leaves the previous state intact:
//!
//! - **Environment rewrite** ([`env`]): sets `JAVA_HOME` and rewrites the search
//!   path so it holds exactly one reference to `JAVA_HOME`'s `bin` directory.
//! - **Package install** ([`installer`]): download, verify, extract, validate,
//!   promote atomically, then record in the inventory.
//! - **Self-update** ([`upgrade`]): check, download, verify, back up, replace,
//!   and roll back when the replace step fails.
//!
//! # Core Modules
//!
//! - [`archive`] - zip and tar.gz extraction with traversal protection
//! - [`config`] - JSON configuration and inventory of installed JDKs
//! - [`core`] - error taxonomy and user-facing error formatting
//! - [`discovery`] - finding JDKs on disk and resolving version targets
//! - [`distributor`] - JDK catalogs (Eclipse Adoptium)
//! - [`doctor`] - environment diagnosis and repair
//! - [`download`] - streaming HTTP downloads with completeness checks
//! - [`verification`] - streaming checksum verification
//! - [`utils`] - filesystem, platform and progress helpers
//! - [`cli`] - command-line interface

pub mod archive;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod discovery;
pub mod distributor;
pub mod doctor;
pub mod download;
pub mod env;
pub mod installer;
pub mod upgrade;
pub mod utils;
pub mod verification;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
