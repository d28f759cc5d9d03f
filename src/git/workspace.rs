//! git::workspace
//!
//! Ephemeral, exclusively owned clones.
//!
//! # Lifecycle
//!
//! Each [`LocalWorkspace`] lives in its own uniquely named temporary
//! directory:
//!
//! ```text
//! $TMPDIR/statestore-XXXXXX/      <- root, removed on drop
//!                          repo/  <- working copy
//! ```
//!
//! The root is removed when the workspace is dropped, so every exit path
//! (success, `?`, panic unwinding) tears it down. [`LocalWorkspace::close`]
//! does the same but reports removal failures.

use std::path::Path;

use tempfile::TempDir;

use super::interface::{Git, GitError, Upstream, VersionControl, REMOTE};
use super::transport::{is_local_url, redact_url, Transport};
use crate::core::types::BranchName;

const WORKSPACE_PREFIX: &str = "statestore-";
const CHECKOUT_DIR: &str = "repo";

/// A shallow, single-branch clone in a private temporary directory.
#[derive(Debug)]
pub struct LocalWorkspace {
    // Field order matters: the repository handle is dropped before the
    // directory it lives in.
    git: Git,
    root: TempDir,
}

impl LocalWorkspace {
    /// Clone `branch` of `url` into a new workspace.
    ///
    /// The clone has depth 1 and only fetches `branch`. Local remotes are
    /// cloned in full because the local transport has no shallow support.
    ///
    /// # Errors
    ///
    /// - [`GitError::Io`] if the temporary directory cannot be created
    /// - [`GitError::Clone`] for network, auth, or missing-branch failures
    pub fn checkout(
        url: &str,
        branch: &BranchName,
        transport: &Transport,
    ) -> Result<Self, GitError> {
        let root = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir()
            .map_err(|e| GitError::io(&std::env::temp_dir(), e))?;
        let workdir = root.path().join(CHECKOUT_DIR);

        let safe_url = redact_url(url);
        tracing::info!(url = %safe_url, %branch, dir = %workdir.display(), "cloning repo");

        let mut fetch = git2::FetchOptions::new();
        fetch.remote_callbacks(transport.callbacks());
        if !is_local_url(url) {
            fetch.depth(1);
        }

        let refspec = format!("+{}:refs/remotes/{}/{}", branch.local_ref(), REMOTE, branch);
        let mut builder = git2::build::RepoBuilder::new();
        builder
            .branch(branch.as_str())
            .fetch_options(fetch)
            .remote_create(move |repo, name, url| repo.remote_with_fetch(name, url, &refspec));

        let repo = builder.clone(url, &workdir).map_err(|e| GitError::Clone {
            url: safe_url.clone(),
            branch: branch.to_string(),
            message: e.message().to_string(),
        })?;

        let git = Git::from_repo(
            repo,
            Some(Upstream {
                branch: branch.clone(),
                transport: transport.clone(),
            }),
        )?;

        Ok(Self { git, root })
    }

    /// The cloned repository.
    pub fn git(&self) -> &Git {
        &self.git
    }

    /// Root of the working copy.
    pub fn workdir(&self) -> &Path {
        self.git.workdir()
    }

    /// The temporary directory holding the working copy.
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    /// Remove the workspace, reporting failures instead of ignoring them.
    pub fn close(self) -> Result<(), GitError> {
        let LocalWorkspace { git, root } = self;
        drop(git);
        let path = root.path().to_path_buf();
        root.close().map_err(|e| GitError::io(&path, e))?;
        tracing::debug!(dir = %path.display(), "removed workspace");
        Ok(())
    }
}
