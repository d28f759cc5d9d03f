//! git::interface
//!
//! Git interface implementation using git2.
//!
//! This module provides the **single doorway** to working-copy operations.
//! The reconciler and publisher only see the [`VersionControl`] trait;
//! [`Git`] is the git2-backed implementation of it.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::Clone`]: the remote could not be cloned
//! - [`GitError::Push`] / [`GitError::PushRejected`]: the push failed or a
//!   ref update was refused by the remote
//! - [`GitError::InvalidPath`]: a path escapes the working copy
//! - [`GitError::Io`]: filesystem failure inside the working copy

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::transport::Transport;
use crate::core::paths::{PathError, RepoPath};
use crate::core::types::{BranchName, Oid, TypeError};

/// Name of the remote every workspace clones from and pushes to.
pub const REMOTE: &str = "origin";

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was opened
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Cloning the remote failed (network, auth, or missing branch).
    #[error("could not clone {url} (branch {branch}): {message}")]
    Clone {
        /// Remote URL with any password removed
        url: String,
        /// Branch that was requested
        branch: String,
        /// Error reported by the transport
        message: String,
    },

    /// Pushing to the remote failed at the transport level.
    #[error("could not push {refspec}: {message}")]
    Push {
        /// The refspec that was pushed
        refspec: String,
        /// Error reported by the transport
        message: String,
    },

    /// The remote refused a ref update (e.g. non-fast-forward).
    #[error("remote rejected {refname}: {reason}")]
    PushRejected {
        /// The ref the remote refused
        refname: String,
        /// Reason given by the remote
        reason: String,
    },

    /// The repository has no upstream to push to.
    #[error("repository has no upstream configured")]
    NoUpstream,

    /// A path does not stay inside the working copy.
    #[error(transparent)]
    InvalidPath(#[from] PathError),

    /// Filesystem error inside the working copy.
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Invalid object id returned by git2.
    #[error("invalid object id: {oid}")]
    InvalidOid { oid: String },

    /// Permission or locking error.
    #[error("repository access error: {message}")]
    AccessError { message: String },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal { message: String },
}

impl GitError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        GitError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        GitError::InvalidOid {
            oid: err.to_string(),
        }
    }
}

/// Summary of working tree status.
///
/// Untracked files are not reported and never make the tree dirty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Check if the worktree is completely clean (no changes at all).
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }
}

/// Commit author and committer identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// The capability set the reconciler and publisher need from a working
/// copy.
///
/// Paths are always [`RepoPath`]s, so implementations never see a path
/// that escapes the working copy.
pub trait VersionControl {
    /// Root of the working copy.
    fn workdir(&self) -> &Path;

    /// Whether `path` exists in the working copy (symlinks not followed).
    fn exists(&self, path: &RepoPath) -> bool;

    /// Staged/unstaged summary against `HEAD`.
    fn status(&self) -> Result<WorktreeStatus, GitError>;

    /// Stage the current content of the file at `path`.
    fn stage_add(&self, path: &RepoPath) -> Result<(), GitError>;

    /// Delete `path` (file or whole directory) from the working copy and
    /// stage the removal. Absent paths are a no-op.
    fn stage_remove(&self, path: &RepoPath) -> Result<(), GitError>;

    /// Commit the index on top of `HEAD`.
    fn commit(
        &self,
        message: &str,
        author: &Author,
        when: chrono::DateTime<chrono::Utc>,
    ) -> Result<Oid, GitError>;

    /// Push the checked out branch to its upstream.
    fn push(&self) -> Result<(), GitError>;
}

/// Where a cloned repository pushes to.
#[derive(Debug, Clone)]
pub struct Upstream {
    pub branch: BranchName,
    pub transport: Transport,
}

/// The git2-backed [`VersionControl`].
pub struct Git {
    repo: git2::Repository,
    workdir: PathBuf,
    upstream: Option<Upstream>,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("workdir", &self.workdir)
            .field("upstream", &self.upstream.as_ref().map(|u| u.branch.as_str()))
            .finish()
    }
}

impl Git {
    /// Open an existing non-bare repository at `path`.
    ///
    /// The result has no upstream; [`VersionControl::push`] fails with
    /// [`GitError::NoUpstream`].
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::open(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;
        Self::from_repo(repo, None)
    }

    /// Wrap a freshly cloned repository that pushes to `upstream`.
    pub(crate) fn from_repo(
        repo: git2::Repository,
        upstream: Option<Upstream>,
    ) -> Result<Self, GitError> {
        let workdir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();
        Ok(Self {
            repo,
            workdir,
            upstream,
        })
    }

    fn index(&self) -> Result<git2::Index, GitError> {
        Ok(self.repo.index()?)
    }
}

impl VersionControl for Git {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn exists(&self, path: &RepoPath) -> bool {
        path.under(&self.workdir)
            .map(|p| p.symlink_metadata().is_ok())
            .unwrap_or(false)
    }

    fn status(&self) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut result = WorktreeStatus::default();
        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }
        }

        Ok(result)
    }

    fn stage_add(&self, path: &RepoPath) -> Result<(), GitError> {
        let mut index = self.index()?;
        index.add_path(&path.to_path())?;
        index.write()?;
        Ok(())
    }

    fn stage_remove(&self, path: &RepoPath) -> Result<(), GitError> {
        let absolute = path.under(&self.workdir)?;
        let metadata = match absolute.symlink_metadata() {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(GitError::io(&absolute, e)),
        };

        let mut index = self.index()?;
        if metadata.is_dir() {
            index.remove_dir(&path.to_path(), 0)?;
            fs::remove_dir_all(&absolute).map_err(|e| GitError::io(&absolute, e))?;
        } else {
            index.remove_path(&path.to_path())?;
            fs::remove_file(&absolute).map_err(|e| GitError::io(&absolute, e))?;
        }
        index.write()?;
        Ok(())
    }

    fn commit(
        &self,
        message: &str,
        author: &Author,
        when: chrono::DateTime<chrono::Utc>,
    ) -> Result<Oid, GitError> {
        let mut index = self.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let time = git2::Time::new(when.timestamp(), 0);
        let signature = git2::Signature::new(&author.name, &author.email, &time)?;

        // An unborn HEAD (empty branch) produces a root commit.
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(Oid::new(oid.to_string())?)
    }

    fn push(&self) -> Result<(), GitError> {
        let upstream = self.upstream.as_ref().ok_or(GitError::NoUpstream)?;
        let local_ref = upstream.branch.local_ref();
        let refspec = format!("{0}:{0}", local_ref);

        let mut remote = self.repo.find_remote(REMOTE)?;
        let rejection: RefCell<Option<(String, String)>> = RefCell::new(None);
        {
            let mut callbacks = upstream.transport.callbacks();
            callbacks.push_update_reference(|refname, status| {
                if let Some(reason) = status {
                    *rejection.borrow_mut() = Some((refname.to_string(), reason.to_string()));
                }
                Ok(())
            });

            let mut opts = git2::PushOptions::new();
            opts.remote_callbacks(callbacks);
            remote
                .push(&[refspec.as_str()], Some(&mut opts))
                .map_err(|e| GitError::Push {
                    refspec: refspec.clone(),
                    message: e.message().to_string(),
                })?;
        }

        if let Some((refname, reason)) = rejection.into_inner() {
            return Err(GitError::PushRejected { refname, reason });
        }
        Ok(())
    }
}
