//! core::paths
//!
//! Path resolution and containment for files written into a working copy.
//!
//! # Layout
//!
//! Every file a writer touches lives at
//!
//! ```text
//! <store base path>/<destination path>/<namespace>/<name>/<sub dir>/<file>
//! ```
//!
//! The whole chain is joined first and normalized second, so `..` segments
//! may cancel out across segment boundaries. What they may never do is climb
//! above the repository root or reach into `.git`.
//!
//! # Example
//!
//! ```
//! use gitops_statestore::core::paths::{PathLayout, PathError};
//!
//! let layout = PathLayout::new(["clusters", "", "default", "worker-1"]);
//!
//! let path = layout.resolve(&["apps", "deploy.yaml"]).unwrap();
//! assert_eq!(path.as_str(), "clusters/default/worker-1/apps/deploy.yaml");
//!
//! let sibling = layout.resolve(&["", "../worker-2/x.yaml"]).unwrap();
//! assert_eq!(sibling.as_str(), "clusters/default/worker-2/x.yaml");
//!
//! assert!(matches!(
//!     layout.resolve(&["", "../../../../../etc/passwd"]),
//!     Err(PathError::EscapesRoot { .. })
//! ));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors from resolving a path inside the working copy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// The normalized path climbs above the repository root.
    #[error("path '{path}' escapes the repository root")]
    EscapesRoot { path: String },

    /// The normalized path points into the repository's git directory.
    #[error("path '{path}' points into the .git directory")]
    GitDir { path: String },

    /// The path resolves to the repository root where a file or managed
    /// directory was expected.
    #[error("path '{path}' resolves to the repository root")]
    RepositoryRoot { path: String },

    /// An existing component of the path is a symbolic link.
    #[error("path '{path}' passes through a symbolic link")]
    ThroughSymlink { path: String },
}

impl PathError {
    /// The offending path as it was supplied (joined, not normalized).
    pub fn path(&self) -> &str {
        match self {
            PathError::EscapesRoot { path }
            | PathError::GitDir { path }
            | PathError::RepositoryRoot { path }
            | PathError::ThroughSymlink { path } => path,
        }
    }
}

/// A normalized, relative, `/`-separated path inside a working copy.
///
/// # Invariants
///
/// - Never contains `.` or `..` components or empty components
/// - Never starts with `.git`
/// - The empty path is the repository root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RepoPath(String);

impl RepoPath {
    /// Join `segments` with `/` and normalize the result lexically.
    ///
    /// Leading slashes are separators, never an absolute root: `"/etc"` as a
    /// segment resolves to `etc` under the repository.
    ///
    /// # Errors
    ///
    /// - [`PathError::EscapesRoot`] if `..` pops past the root
    /// - [`PathError::GitDir`] if the first component is `.git`
    pub fn resolve<'a, I>(segments: I) -> Result<Self, PathError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let joined = segments
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("/");

        let mut components: Vec<&str> = Vec::new();
        for component in joined.split('/') {
            match component {
                "" | "." => {}
                ".." => {
                    if components.pop().is_none() {
                        return Err(PathError::EscapesRoot { path: joined });
                    }
                }
                other => components.push(other),
            }
        }

        if components.first() == Some(&".git") {
            return Err(PathError::GitDir { path: joined });
        }

        Ok(Self(components.join("/")))
    }

    /// Whether this is the repository root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path as a relative native path.
    pub fn to_path(&self) -> PathBuf {
        self.0.split('/').filter(|c| !c.is_empty()).collect()
    }

    /// Absolute location of this path under `root`.
    ///
    /// Re-checks containment on the final absolute path, component-wise, so a
    /// root of `/tmp/repo` never accepts `/tmp/repo2/...`.
    pub fn under(&self, root: &Path) -> Result<PathBuf, PathError> {
        let absolute = root.join(self.to_path());
        if !absolute.starts_with(root) {
            return Err(PathError::EscapesRoot {
                path: absolute.display().to_string(),
            });
        }
        Ok(absolute)
    }

    /// [`RepoPath::under`], additionally rejecting the path if any component
    /// that exists on disk is a symbolic link, the last one included.
    ///
    /// Lexical containment alone would let a committed `a -> /etc` link carry
    /// `a/passwd` out of the working copy.
    pub fn under_without_symlinks(&self, root: &Path) -> Result<PathBuf, PathError> {
        let absolute = self.under(root)?;
        let mut current = root.to_path_buf();
        for component in self.to_path().components() {
            current.push(component);
            match current.symlink_metadata() {
                Ok(meta) if meta.file_type().is_symlink() => {
                    return Err(PathError::ThroughSymlink {
                        path: self.to_string(),
                    });
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        Ok(absolute)
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, ".")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// The fixed leading segments of every path a writer resolves.
///
/// Kept as raw segments rather than a pre-normalized [`RepoPath`] so that
/// normalization always runs over the complete chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathLayout {
    segments: Vec<String>,
}

impl PathLayout {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Resolve the layout followed by `extra` segments.
    pub fn resolve(&self, extra: &[&str]) -> Result<RepoPath, PathError> {
        RepoPath::resolve(
            self.segments
                .iter()
                .map(String::as_str)
                .chain(extra.iter().copied()),
        )
    }

    /// Human readable form of the layout, for log fields.
    pub fn display(&self) -> String {
        self.segments
            .iter()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod repo_path {
        use super::*;

        #[test]
        fn joins_and_skips_empty_segments() {
            let path = RepoPath::resolve(["a", "", "b", "c.yaml"]).unwrap();
            assert_eq!(path.as_str(), "a/b/c.yaml");
        }

        #[test]
        fn dot_components_dropped() {
            let path = RepoPath::resolve(["./a/./b", "."]).unwrap();
            assert_eq!(path.as_str(), "a/b");
        }

        #[test]
        fn parent_segments_cancel_out() {
            let path = RepoPath::resolve(["a/b", "../c"]).unwrap();
            assert_eq!(path.as_str(), "a/c");

            let path = RepoPath::resolve(["a/b", "../../c"]).unwrap();
            assert_eq!(path.as_str(), "c");
        }

        #[test]
        fn escaping_the_root_fails() {
            let err = RepoPath::resolve(["a", "../../etc/passwd"]).unwrap_err();
            assert!(matches!(err, PathError::EscapesRoot { .. }));
            assert_eq!(err.path(), "a/../../etc/passwd");
        }

        #[test]
        fn leading_slash_is_not_absolute() {
            let path = RepoPath::resolve(["base", "/etc/passwd"]).unwrap();
            assert_eq!(path.as_str(), "base/etc/passwd");
        }

        #[test]
        fn git_dir_rejected() {
            assert!(matches!(
                RepoPath::resolve([".git/config"]),
                Err(PathError::GitDir { .. })
            ));
            assert!(matches!(
                RepoPath::resolve(["a", "../.git/hooks/pre-commit"]),
                Err(PathError::GitDir { .. })
            ));
        }

        #[test]
        fn dot_git_deeper_is_allowed() {
            let path = RepoPath::resolve(["a/.git/x"]).unwrap();
            assert_eq!(path.as_str(), "a/.git/x");
        }

        #[test]
        fn root_detection() {
            let root = RepoPath::resolve(["a", ".."]).unwrap();
            assert!(root.is_root());
            assert_eq!(root.to_string(), ".");
        }

        #[test]
        fn under_stays_in_root() {
            let root = Path::new("/tmp/statestore-abc/repo");
            let path = RepoPath::resolve(["a", "b.yaml"]).unwrap();
            assert_eq!(
                path.under(root).unwrap(),
                PathBuf::from("/tmp/statestore-abc/repo/a/b.yaml")
            );
            assert_eq!(RepoPath::default().under(root).unwrap(), root);
        }

        #[test]
        fn missing_components_are_not_symlinks() {
            let root = tempfile::TempDir::new().unwrap();
            std::fs::create_dir(root.path().join("a")).unwrap();
            let path = RepoPath::resolve(["a/new/file.yaml"]).unwrap();
            assert_eq!(
                path.under_without_symlinks(root.path()).unwrap(),
                root.path().join("a/new/file.yaml")
            );
        }

        #[cfg(unix)]
        #[test]
        fn symlinked_directory_rejected() {
            let root = tempfile::TempDir::new().unwrap();
            let outside = tempfile::TempDir::new().unwrap();
            std::os::unix::fs::symlink(outside.path(), root.path().join("a")).unwrap();

            let err = RepoPath::resolve(["a/passwd"])
                .unwrap()
                .under_without_symlinks(root.path())
                .unwrap_err();
            assert_eq!(
                err,
                PathError::ThroughSymlink {
                    path: "a/passwd".into()
                }
            );
        }

        #[cfg(unix)]
        #[test]
        fn symlinked_file_rejected() {
            let root = tempfile::TempDir::new().unwrap();
            let outside = tempfile::NamedTempFile::new().unwrap();
            std::os::unix::fs::symlink(outside.path(), root.path().join("leak")).unwrap();

            let path = RepoPath::resolve(["leak"]).unwrap();
            assert!(path.under(root.path()).is_ok());
            assert!(matches!(
                path.under_without_symlinks(root.path()),
                Err(PathError::ThroughSymlink { .. })
            ));
        }
    }

    mod path_layout {
        use super::*;

        #[test]
        fn resolves_full_chain() {
            let layout = PathLayout::new(["base", "dev", "ns", "name"]);
            let path = layout.resolve(&["team-a", "file.yaml"]).unwrap();
            assert_eq!(path.as_str(), "base/dev/ns/name/team-a/file.yaml");
        }

        #[test]
        fn cancels_across_layout_boundary() {
            let layout = PathLayout::new(["base", "", "ns", "name"]);
            let path = layout.resolve(&["", "../../other/file.yaml"]).unwrap();
            assert_eq!(path.as_str(), "base/other/file.yaml");
        }

        #[test]
        fn parents_cancelling_inside_layout_are_legal() {
            let layout = PathLayout::new(["clusters", "", "default", "worker-1"]);
            let path = layout.resolve(&["", "../../etc/passwd"]).unwrap();
            assert_eq!(path.as_str(), "clusters/etc/passwd");

            assert!(matches!(
                layout.resolve(&["", "../../../../etc/passwd"]),
                Err(PathError::EscapesRoot { .. })
            ));
        }

        #[test]
        fn display_skips_empty() {
            let layout = PathLayout::new(["base", "", "ns", "name"]);
            assert_eq!(layout.display(), "base/ns/name");
        }
    }
}
