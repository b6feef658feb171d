//! Core business logic module
//!
//! This module contains the resource model and the reconciliation logic.
//! Syscalls and account lookups go through the seams in [`crate::infra`].
//!
//! # Submodules
//!
//! - [`resource`] - Desired state and validation
//! - [`mode`] - Numeric and symbolic permission modes
//! - [`identity`] - User/group name and id resolution
//! - [`chain`] - Ancestor chain computation
//! - [`snapshot`] - Per-cycle stat cache
//! - [`reconciler`] - Create, update and destroy of a managed hierarchy
//! - [`manifest`] - Manifest (filepath.toml) parsing
//! - [`apply`] - Applying many resources in one run
//! - [`global_config`] - Global configuration management

pub mod apply;
pub mod chain;
pub mod global_config;
pub mod identity;
pub mod manifest;
pub mod mode;
pub mod reconciler;
pub mod resource;
pub mod snapshot;
