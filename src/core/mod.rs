//! core
//!
//! Core domain types, path rules and configuration.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, StateStoreSpec, Workload, etc.
//! - [`paths`] - Path resolution and containment inside a working copy
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Paths are normalized once, in one place
//! - Nothing in here touches the network or a repository

pub mod config;
pub mod paths;
pub mod types;
