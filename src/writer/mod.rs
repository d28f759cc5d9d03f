//! writer
//!
//! The state store writer: persist workload files into a branch of a git
//! repository and read them back.
//!
//! # Architecture
//!
//! ```text
//! GitWriter::update_files
//!   ├─ ChangeSet::is_noop        -> Published::Skipped
//!   ├─ Reconciler::plan          (all paths resolved, nothing cloned yet)
//!   ├─ LocalWorkspace::checkout  (fresh shallow clone)
//!   ├─ Reconciler::apply         (stage deletes, then creates)
//!   └─ CommitPublisher::publish  (commit + push, or Unchanged)
//! ```
//!
//! # Invariants
//!
//! - Credentials are resolved once, at construction
//! - Each call owns its workspace; nothing is shared between calls
//! - No file is written outside the working copy
//!
//! # Example
//!
//! ```no_run
//! use gitops_statestore::core::types::{
//!     AuthMethodKind, BranchName, Destination, StateStoreSpec, Workload,
//! };
//! use gitops_statestore::secrets::CredentialSet;
//! use gitops_statestore::writer::{GitWriter, StateStoreWriter};
//!
//! let spec = StateStoreSpec::new(
//!     "https://git.example.com/org/state.git",
//!     BranchName::new("main").unwrap(),
//!     AuthMethodKind::Basic,
//! );
//! let destination = Destination::new("default", "worker-1");
//! let creds: CredentialSet = [("username", "bot"), ("password", "token")]
//!     .into_iter()
//!     .collect();
//!
//! let writer = GitWriter::new(&spec, &destination, &creds).unwrap();
//! writer
//!     .update_files("apps", "promise-redis", &[Workload::new("redis.yaml", "kind: Redis")], &[])
//!     .unwrap();
//! ```

mod error;
mod publish;
mod reconcile;

pub use error::WriterError;
pub use publish::{bot_author, CommitPublisher, Published, BOT_EMAIL, BOT_NAME};
pub use reconcile::{commit_message, Action, ChangeSet, Plan, PlannedWrite, Reconciler, Removal};

use std::fs;

use crate::auth;
use crate::core::config::WriterConfig;
use crate::core::paths::{PathLayout, RepoPath};
use crate::core::types::{BranchName, Destination, StateStoreSpec, Workload};
use crate::git::{redact_url, GitError, LocalWorkspace, Transport, VersionControl};
use crate::secrets::CredentialSet;

/// Persists desired workload files into a state store.
pub trait StateStoreWriter: Send + Sync {
    /// Make the destination's files match the request and publish the
    /// result.
    ///
    /// With a non-empty `sub_dir`, everything under it is replaced by
    /// `workloads_to_create` and `workloads_to_delete` is ignored. With an
    /// empty `sub_dir`, each path in `workloads_to_delete` is removed if
    /// present.
    fn update_files(
        &self,
        sub_dir: &str,
        operation_label: &str,
        workloads_to_create: &[Workload],
        workloads_to_delete: &[String],
    ) -> Result<Published, WriterError>;

    /// Raw content of `path`, relative to the repository root.
    ///
    /// Returns [`WriterError::FileNotFound`] if the path is absent or is a
    /// directory, and [`WriterError::PathTraversalViolation`] if the path or
    /// any directory above it is a committed symbolic link.
    fn read_file(&self, path: &str) -> Result<Vec<u8>, WriterError>;
}

/// A [`StateStoreWriter`] backed by a git branch.
#[derive(Debug, Clone)]
pub struct GitWriter {
    url: String,
    branch: BranchName,
    layout: PathLayout,
    transport: Transport,
    publisher: CommitPublisher,
}

impl GitWriter {
    /// Build a writer for `destination` on the store described by `spec`.
    ///
    /// # Errors
    ///
    /// [`WriterError::MissingCredential`] or [`WriterError::AuthParseError`]
    /// if `creds` does not hold what `spec.auth_method` needs. No network
    /// access happens here.
    pub fn new(
        spec: &StateStoreSpec,
        destination: &Destination,
        creds: &CredentialSet,
    ) -> Result<Self, WriterError> {
        let secret = format!("{}/{}", destination.namespace, spec.secret_ref);
        let auth = auth::resolve(spec.auth_method, creds, &secret).inspect_err(
            |e| tracing::error!(error = %e, secret = %secret, "could not resolve git credentials"),
        )?;

        let layout = PathLayout::new([
            spec.path.as_str(),
            destination.path.as_str(),
            destination.namespace.as_str(),
            destination.name.as_str(),
        ]);

        tracing::debug!(
            url = %redact_url(&spec.url),
            branch = %spec.branch,
            dir = %layout.display(),
            auth = %spec.auth_method,
            "created git writer"
        );

        Ok(Self {
            url: spec.url.clone(),
            branch: spec.branch.clone(),
            layout,
            transport: Transport::new(auth, spec.insecure_skip_tls_verify),
            publisher: CommitPublisher::default(),
        })
    }

    /// Build a writer from a loaded config, reading credentials from the
    /// source it names.
    pub fn from_config(config: &WriterConfig) -> Result<Self, WriterError> {
        config.validate()?;
        let source = config.credential_source()?;
        tracing::debug!(source = %source.describe(), "loading git credentials");
        let creds = source.load()?;
        Self::new(&config.state_store, &config.destination, &creds)
    }

    pub fn branch(&self) -> &BranchName {
        &self.branch
    }

    /// Remote URL with any password removed.
    pub fn url(&self) -> String {
        redact_url(&self.url)
    }

    /// Leading path segments of every file this writer manages.
    pub fn layout(&self) -> &PathLayout {
        &self.layout
    }

    fn checkout(&self) -> Result<LocalWorkspace, WriterError> {
        LocalWorkspace::checkout(&self.url, &self.branch, &self.transport).map_err(|e| {
            tracing::error!(error = %e, "could not clone repository");
            WriterError::from(e)
        })
    }
}

impl StateStoreWriter for GitWriter {
    fn update_files(
        &self,
        sub_dir: &str,
        operation_label: &str,
        workloads_to_create: &[Workload],
        workloads_to_delete: &[String],
    ) -> Result<Published, WriterError> {
        let span = tracing::info_span!(
            "update_files",
            dir = %self.layout.display(),
            branch = %self.branch,
            sub_dir
        );
        let _enter = span.enter();

        let changes = ChangeSet::new(
            sub_dir,
            operation_label,
            workloads_to_create,
            workloads_to_delete,
        );
        if changes.is_noop() {
            tracing::debug!("empty workloads, skipping update");
            return Ok(Published::Skipped);
        }

        let reconciler = Reconciler::new(&self.layout);
        let plan = reconciler.plan(&changes).inspect_err(|e| {
            tracing::error!(path = %e.path(), error = %e, "path is not located within the git repository")
        })?;

        let workspace = self.checkout()?;
        reconciler.apply(workspace.git(), &plan)?;
        let outcome = self
            .publisher
            .publish(workspace.git(), &changes.commit_message())?;

        close(workspace);
        Ok(outcome)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>, WriterError> {
        let span = tracing::info_span!("read_file", branch = %self.branch, path);
        let _enter = span.enter();

        let target = RepoPath::resolve([path])?;
        let workspace = self.checkout()?;

        let git = workspace.git();
        let absolute = target
            .under_without_symlinks(git.workdir())
            .inspect_err(|e| {
                tracing::error!(error = %e, "refusing to read through a symbolic link")
            })?;
        let is_file = git.exists(&target)
            && fs::symlink_metadata(&absolute)
                .map(|m| m.is_file())
                .unwrap_or(false);
        if !is_file {
            tracing::debug!(filepath = %target, "file not found in repository");
            return Err(WriterError::FileNotFound {
                path: path.to_string(),
            });
        }

        let content = fs::read(&absolute)
            .map_err(|e| WriterError::Workspace(GitError::io(&absolute, e)))?;

        close(workspace);
        Ok(content)
    }
}

/// Remove `workspace`, logging instead of failing: the caller's result is
/// already decided.
fn close(workspace: LocalWorkspace) {
    let root = workspace.root().to_path_buf();
    if let Err(e) = workspace.close() {
        tracing::warn!(dir = %root.display(), error = %e, "could not remove workspace");
    }
}
