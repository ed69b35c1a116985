//! macOS workstation provisioner.
//!
//! Drives Homebrew and a handful of install scripts to a desired end state:
//! core prerequisites, taps, formulas on a bounded worker pool, casks one at
//! a time, a postinstall pipeline for shell and editor setup, and a final
//! verification pass. Every step reports on a single progress channel and
//! lands in an ordered ledger.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: load and validate the package catalog and selections
//! - **[`resources`]**: idempotent primitives over brew, git, and the filesystem
//! - **[`tasks`]**: plan building, installers, postinstall, and the orchestrator
//! - **[`commands`]**: top-level subcommand handlers (`install`, `list`, …)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cancel;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod gate;
pub mod logging;
pub mod progress;
pub mod resources;
pub mod retry;
pub mod tasks;

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod testing;
