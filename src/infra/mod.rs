//! Infrastructure layer
//!
//! Handles all I/O operations: directory syscalls, account lookups and
//! platform directories. This module is the only place where side effects occur.

pub mod accounts;
pub mod dirs;
pub mod filesystem;
