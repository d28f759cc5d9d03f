//! writer::reconcile
//!
//! Turns a requested change set into staged changes in a working copy.
//!
//! # Phases
//!
//! 1. [`Reconciler::plan`] resolves every path up front. Nothing touches the
//!    filesystem, so a bad path fails the update before a clone is made.
//! 2. [`Reconciler::apply`] stages deletions, then writes and stages
//!    creations.
//!
//! # Delete policies
//!
//! A non-empty sub-directory is owned wholesale: its subtree is removed and
//! rebuilt from the create set, and the delete list is ignored. An empty
//! sub-directory means the caller names each file to delete.

use std::fs;
use std::path::Path;

use crate::core::paths::{PathError, PathLayout, RepoPath};
use crate::core::types::Workload;
use crate::git::{GitError, VersionControl};

use super::error::WriterError;

/// What an update does, as named in its commit message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Update,
    Delete,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Update => write!(f, "Update"),
            Action::Delete => write!(f, "Delete"),
        }
    }
}

/// One requested update, borrowed from the caller.
#[derive(Debug, Clone, Copy)]
pub struct ChangeSet<'a> {
    pub sub_dir: &'a str,
    pub label: &'a str,
    pub create: &'a [Workload],
    pub delete: &'a [String],
}

impl<'a> ChangeSet<'a> {
    pub fn new(
        sub_dir: &'a str,
        label: &'a str,
        create: &'a [Workload],
        delete: &'a [String],
    ) -> Self {
        Self {
            sub_dir,
            label,
            create,
            delete,
        }
    }

    /// Nothing to create, nothing to delete and no directory to replace.
    pub fn is_noop(&self) -> bool {
        self.sub_dir.is_empty() && self.create.is_empty() && self.delete.is_empty()
    }

    pub fn action(&self) -> Action {
        if self.create.is_empty() {
            Action::Delete
        } else {
            Action::Update
        }
    }

    pub fn commit_message(&self) -> String {
        commit_message(self.action(), self.label)
    }
}

/// `"<Action> from: <label>"`
pub fn commit_message(action: Action, label: &str) -> String {
    format!("{} from: {}", action, label)
}

/// Which paths are removed before the creations are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    /// Replace the whole subtree.
    Directory(RepoPath),
    /// Remove each named path that exists.
    Files(Vec<RepoPath>),
}

/// A workload with its resolved location.
#[derive(Debug, Clone)]
pub struct PlannedWrite<'a> {
    pub path: RepoPath,
    pub workload: &'a Workload,
}

/// Fully resolved change set. Every path in it is contained.
#[derive(Debug, Clone)]
pub struct Plan<'a> {
    pub removal: Removal,
    pub writes: Vec<PlannedWrite<'a>>,
}

/// Resolves and applies change sets under a fixed path layout.
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'a> {
    layout: &'a PathLayout,
}

impl<'a> Reconciler<'a> {
    pub fn new(layout: &'a PathLayout) -> Self {
        Self { layout }
    }

    /// Resolve every path in `changes`.
    ///
    /// # Errors
    ///
    /// Any [`PathError`] from the layout, plus
    /// [`PathError::RepositoryRoot`] when a directory to replace or a file
    /// to write resolves to the repository root.
    pub fn plan<'w>(&self, changes: &ChangeSet<'w>) -> Result<Plan<'w>, PathError> {
        let writes = changes
            .create
            .iter()
            .map(|workload| {
                let path = self
                    .layout
                    .resolve(&[changes.sub_dir, workload.filepath.as_str()])?;
                if path.is_root() {
                    return Err(PathError::RepositoryRoot {
                        path: workload.filepath.clone(),
                    });
                }
                Ok(PlannedWrite { path, workload })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let removal = if changes.sub_dir.is_empty() {
            let paths = changes
                .delete
                .iter()
                .map(|file| self.layout.resolve(&[file.as_str()]))
                .collect::<Result<Vec<_>, _>>()?;
            Removal::Files(paths)
        } else {
            let dir = self.layout.resolve(&[changes.sub_dir])?;
            if dir.is_root() {
                return Err(PathError::RepositoryRoot {
                    path: changes.sub_dir.to_string(),
                });
            }
            Removal::Directory(dir)
        };

        Ok(Plan { removal, writes })
    }

    /// Stage `plan` into `vcs`: deletions first, then creations.
    pub fn apply<V>(&self, vcs: &V, plan: &Plan<'_>) -> Result<(), WriterError>
    where
        V: VersionControl + ?Sized,
    {
        let workdir = vcs.workdir();

        match &plan.removal {
            Removal::Directory(dir) => {
                if vcs.exists(dir) {
                    tracing::info!(dir = %dir, "deleting existing content");
                    dir.under_without_symlinks(workdir)?;
                    vcs.stage_remove(dir)?;
                } else {
                    tracing::debug!(dir = %dir, "directory does not exist, nothing to replace");
                }
            }
            Removal::Files(paths) => {
                for path in paths {
                    if !vcs.exists(path) {
                        tracing::info!(
                            filepath = %path,
                            "file requested to be deleted from worktree but does not exist"
                        );
                        continue;
                    }
                    path.under_without_symlinks(workdir)?;
                    vcs.stage_remove(path)?;
                    tracing::info!(filepath = %path, "successfully deleted file from worktree");
                }
            }
        }

        for write in &plan.writes {
            let absolute = write.path.under_without_symlinks(workdir)?;
            if let Some(parent) = absolute.parent() {
                create_dirs(parent)?;
            }
            tracing::debug!(filepath = %write.path, "writing file to worktree");
            fs::write(&absolute, &write.workload.content)
                .map_err(|e| WriterError::Workspace(GitError::io(&absolute, e)))?;
            vcs.stage_add(&write.path)?;
        }

        Ok(())
    }
}

fn create_dirs(dir: &Path) -> Result<(), WriterError> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder
        .create(dir)
        .map_err(|e| WriterError::Workspace(GitError::io(dir, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{Author, Git};
    use tempfile::TempDir;

    fn init_repo() -> (TempDir, Git) {
        let dir = TempDir::new().unwrap();
        git2::Repository::init(dir.path()).unwrap();
        let git = Git::open(dir.path()).unwrap();
        (dir, git)
    }

    fn seed(git: &Git, files: &[&str]) {
        for file in files {
            let path = RepoPath::resolve([*file]).unwrap();
            let absolute = path.under(git.workdir()).unwrap();
            fs::create_dir_all(absolute.parent().unwrap()).unwrap();
            fs::write(&absolute, b"seed").unwrap();
            git.stage_add(&path).unwrap();
        }
        git.commit("seed", &Author::new("t", "t@example.com"), chrono::Utc::now())
            .unwrap();
    }

    fn layout() -> PathLayout {
        PathLayout::new(["base", "", "ns", "worker"])
    }

    mod change_set {
        use super::*;

        #[test]
        fn noop_only_when_everything_empty() {
            assert!(ChangeSet::new("", "x", &[], &[]).is_noop());
            assert!(!ChangeSet::new("apps", "x", &[], &[]).is_noop());
            let deletes = vec!["a.yaml".to_string()];
            assert!(!ChangeSet::new("", "x", &[], &deletes).is_noop());
        }

        #[test]
        fn commit_messages() {
            let creates = vec![Workload::new("a.yaml", "a")];
            assert_eq!(
                ChangeSet::new("apps", "promise-x", &creates, &[]).commit_message(),
                "Update from: promise-x"
            );
            assert_eq!(
                ChangeSet::new("apps", "promise-x", &[], &[]).commit_message(),
                "Delete from: promise-x"
            );
        }
    }

    mod plan {
        use super::*;

        #[test]
        fn resolves_writes_under_sub_dir() {
            let layout = layout();
            let creates = vec![Workload::new("deploy.yaml", "x")];
            let plan = Reconciler::new(&layout)
                .plan(&ChangeSet::new("apps", "l", &creates, &[]))
                .unwrap();

            assert_eq!(plan.writes[0].path.as_str(), "base/ns/worker/apps/deploy.yaml");
            assert_eq!(
                plan.removal,
                Removal::Directory(RepoPath::resolve(["base/ns/worker/apps"]).unwrap())
            );
        }

        #[test]
        fn selective_delete_ignores_nothing() {
            let layout = layout();
            let deletes = vec!["a.yaml".to_string(), "sub/b.yaml".to_string()];
            let plan = Reconciler::new(&layout)
                .plan(&ChangeSet::new("", "l", &[], &deletes))
                .unwrap();

            match plan.removal {
                Removal::Files(paths) => {
                    let paths: Vec<_> = paths.iter().map(RepoPath::as_str).collect();
                    assert_eq!(paths, ["base/ns/worker/a.yaml", "base/ns/worker/sub/b.yaml"]);
                }
                other => panic!("expected selective delete, got {:?}", other),
            }
        }

        #[test]
        fn escaping_write_rejected() {
            let layout = layout();
            let creates = vec![Workload::new("../../../../../etc/passwd", "x")];
            let result = Reconciler::new(&layout).plan(&ChangeSet::new("", "l", &creates, &[]));
            assert!(matches!(result, Err(PathError::EscapesRoot { .. })));
        }

        #[test]
        fn escaping_delete_rejected() {
            let layout = layout();
            let deletes = vec!["../../../.git/config".to_string()];
            let result = Reconciler::new(&layout).plan(&ChangeSet::new("", "l", &[], &deletes));
            assert!(matches!(result, Err(PathError::GitDir { .. })));
        }

        #[test]
        fn replacing_root_rejected() {
            let layout = PathLayout::new(["", "", "", ""]);
            let result = Reconciler::new(&layout).plan(&ChangeSet::new(".", "l", &[], &[]));
            assert!(matches!(result, Err(PathError::RepositoryRoot { .. })));
        }

        #[test]
        fn writing_root_rejected() {
            let layout = PathLayout::new(["ns"]);
            let creates = vec![Workload::new("..", "x")];
            let result = Reconciler::new(&layout).plan(&ChangeSet::new("", "l", &creates, &[]));
            assert!(matches!(result, Err(PathError::RepositoryRoot { .. })));
        }
    }

    mod apply {
        use super::*;

        #[test]
        fn directory_replace_removes_old_content() {
            let (_dir, git) = init_repo();
            seed(&git, &["base/ns/worker/apps/old.yaml", "base/ns/worker/keep.yaml"]);

            let layout = layout();
            let reconciler = Reconciler::new(&layout);
            let creates = vec![Workload::new("new.yaml", "new")];
            let plan = reconciler
                .plan(&ChangeSet::new("apps", "l", &creates, &[]))
                .unwrap();
            reconciler.apply(&git, &plan).unwrap();

            let root = git.workdir();
            assert!(!root.join("base/ns/worker/apps/old.yaml").exists());
            assert!(root.join("base/ns/worker/keep.yaml").exists());
            assert_eq!(
                fs::read(root.join("base/ns/worker/apps/new.yaml")).unwrap(),
                b"new"
            );
            assert_eq!(git.status().unwrap().staged, 2);
        }

        #[test]
        fn selective_delete_skips_absent() {
            let (_dir, git) = init_repo();
            seed(&git, &["base/ns/worker/a.yaml", "base/ns/worker/b.yaml"]);

            let layout = layout();
            let reconciler = Reconciler::new(&layout);
            let deletes = vec!["a.yaml".to_string(), "missing.yaml".to_string()];
            let plan = reconciler
                .plan(&ChangeSet::new("", "l", &[], &deletes))
                .unwrap();
            reconciler.apply(&git, &plan).unwrap();

            let root = git.workdir();
            assert!(!root.join("base/ns/worker/a.yaml").exists());
            assert!(root.join("base/ns/worker/b.yaml").exists());
            assert_eq!(git.status().unwrap().staged, 1);
        }

        #[test]
        fn overwrite_with_same_content_is_clean() {
            let (_dir, git) = init_repo();
            seed(&git, &["base/ns/worker/a.yaml"]);

            let layout = layout();
            let reconciler = Reconciler::new(&layout);
            let creates = vec![Workload::new("a.yaml", "seed")];
            let plan = reconciler
                .plan(&ChangeSet::new("", "l", &creates, &[]))
                .unwrap();
            reconciler.apply(&git, &plan).unwrap();

            assert!(git.status().unwrap().is_clean());
        }

        #[cfg(unix)]
        #[test]
        fn write_through_symlink_rejected() {
            let (_dir, git) = init_repo();
            let outside = TempDir::new().unwrap();
            let link_parent = git.workdir().join("base/ns/worker");
            fs::create_dir_all(&link_parent).unwrap();
            std::os::unix::fs::symlink(outside.path(), link_parent.join("apps")).unwrap();

            let layout = layout();
            let reconciler = Reconciler::new(&layout);
            let creates = vec![Workload::new("apps/passwd", "x")];
            let plan = reconciler
                .plan(&ChangeSet::new("", "l", &creates, &[]))
                .unwrap();
            let result = reconciler.apply(&git, &plan);

            assert!(matches!(
                result,
                Err(WriterError::PathTraversalViolation(PathError::ThroughSymlink { .. }))
            ));
            assert!(!outside.path().join("passwd").exists());
        }
    }
}
