//! gitops-statestore - persist desired workload files into a git state store
//!
//! A writer owns one destination (a namespace and name inside a state store
//! repository) and keeps the files under it in line with what it is asked
//! to write. Every call clones the branch into a private temporary
//! directory, stages the changes, commits them as a fixed bot identity and
//! pushes. Nothing survives between calls.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`writer`] - Public entry point: `GitWriter` and the `StateStoreWriter` trait
//! - [`git`] - Single interface for all Git operations
//! - [`auth`] - Turns a credential set into SSH or basic auth
//! - [`secrets`] - Credential sources (mounted directory, JSON manifest)
//! - [`core`] - Domain types, path resolution, configuration
//!
//! # Correctness Invariants
//!
//! 1. No file is written, deleted or read outside the cloned working copy
//! 2. A rejected path aborts the update before anything is staged
//! 3. An update that changes nothing creates no commit
//! 4. Secret values never appear in logs, errors or `Debug` output

pub mod auth;
pub mod core;
pub mod git;
pub mod secrets;
pub mod writer;
