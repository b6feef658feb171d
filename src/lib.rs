//! filepath - Declarative management of directory hierarchies
//!
//! This library converges a directory path, and a configurable number of its
//! ancestors, towards a desired existence state, owner, group and mode.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Resource model and reconciliation logic
//! - [`infra`] - Infrastructure layer (filesystem syscalls, account databases)
//! - [`config`] - Configuration and constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
