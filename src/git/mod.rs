//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **ONLY doorway** to Git. No other module imports
//! `git2`. The rest of the crate works against the [`VersionControl`]
//! trait, which [`Git`] implements on top of libgit2.
//!
//! # Responsibilities
//!
//! - Shallow, single-branch clones into ephemeral workspaces
//! - Working-copy status, staging, commit and push
//! - Remote callbacks: credentials, TLS policy, SSH host key checks
//!
//! # Invariants
//!
//! - Every workspace is owned by exactly one caller and removed on drop
//! - Paths handed to the working copy are [`RepoPath`](crate::core::paths::RepoPath)s
//! - Credentials are never logged
//!
//! # Example
//!
//! ```ignore
//! use gitops_statestore::git::{LocalWorkspace, Transport, VersionControl};
//!
//! let workspace = LocalWorkspace::checkout(url, &branch, &transport)?;
//! let status = workspace.git().status()?;
//! ```

mod interface;
mod transport;
mod workspace;

pub use interface::{Author, Git, GitError, Upstream, VersionControl, WorktreeStatus, REMOTE};
pub use transport::{is_local_url, redact_url, Transport};
pub use workspace::LocalWorkspace;
