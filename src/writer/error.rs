//! writer::error
//!
//! The public error type of the writer.
//!
//! # Classification
//!
//! Every lower-layer error is folded into one [`WriterError`] variant so
//! callers can decide what to do without matching on git details:
//!
//! | Variant | Retry? |
//! |---------|--------|
//! | `MissingCredential`, `AuthParseError` | no, fix the secret |
//! | `CloneError`, `PushError` | yes |
//! | `PathTraversalViolation` | no |
//! | `FileNotFound` | no, expected outcome |
//! | `Workspace`, `Git` | no |

use thiserror::Error;

use crate::auth::AuthError;
use crate::core::config::ConfigError;
use crate::core::paths::PathError;
use crate::git::GitError;
use crate::secrets::SecretError;

/// Errors returned by a state store writer.
#[derive(Debug, Error)]
pub enum WriterError {
    /// A required key is absent from the credential set.
    #[error("missing credential: {0}")]
    MissingCredential(#[source] AuthError),

    /// A credential key is present but unusable.
    #[error("invalid credential: {0}")]
    AuthParseError(#[source] AuthError),

    /// The credential source could not be read.
    #[error(transparent)]
    Secrets(#[from] SecretError),

    /// The writer config is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The state store could not be cloned.
    #[error("could not clone state store: {0}")]
    CloneError(#[source] GitError),

    /// The commit could not be pushed.
    #[error("could not push to state store: {0}")]
    PushError(#[source] GitError),

    /// A requested path is not located within the repository.
    #[error("path is not located within the git repository: {0}")]
    PathTraversalViolation(#[from] PathError),

    /// The requested file does not exist in the state store.
    #[error("file not found: {path}")]
    FileNotFound { path: String },

    /// Filesystem failure in the ephemeral workspace.
    #[error("workspace error: {0}")]
    Workspace(#[source] GitError),

    /// Local repository operation failed.
    #[error(transparent)]
    Git(GitError),
}

impl WriterError {
    /// Whether the same call may succeed if repeated unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WriterError::CloneError(_) | WriterError::PushError(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WriterError::FileNotFound { .. })
    }
}

impl From<AuthError> for WriterError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredential { .. } => WriterError::MissingCredential(err),
            AuthError::ParseError { .. } => WriterError::AuthParseError(err),
        }
    }
}

impl From<GitError> for WriterError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Clone { .. } => WriterError::CloneError(err),
            GitError::Push { .. } | GitError::PushRejected { .. } => WriterError::PushError(err),
            GitError::InvalidPath(path) => WriterError::PathTraversalViolation(path),
            GitError::Io { .. } => WriterError::Workspace(err),
            other => WriterError::Git(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn clone_error() -> GitError {
        GitError::Clone {
            url: "https://example.com/state.git".into(),
            branch: "main".into(),
            message: "connection refused".into(),
        }
    }

    #[test]
    fn auth_errors_split_by_kind() {
        let missing = AuthError::MissingCredential {
            key: "sshPrivateKey",
            secret: "default/git".into(),
        };
        assert!(matches!(
            WriterError::from(missing),
            WriterError::MissingCredential(_)
        ));

        let parse = AuthError::ParseError {
            key: "knownHosts",
            message: "bad line".into(),
        };
        assert!(matches!(
            WriterError::from(parse),
            WriterError::AuthParseError(_)
        ));
    }

    #[test]
    fn git_errors_classified() {
        assert!(matches!(
            WriterError::from(clone_error()),
            WriterError::CloneError(_)
        ));
        assert!(matches!(
            WriterError::from(GitError::PushRejected {
                refname: "refs/heads/main".into(),
                reason: "non-fast-forward".into(),
            }),
            WriterError::PushError(_)
        ));
        assert!(matches!(
            WriterError::from(GitError::InvalidPath(PathError::EscapesRoot {
                path: "../x".into()
            })),
            WriterError::PathTraversalViolation(_)
        ));
        assert!(matches!(
            WriterError::from(GitError::io(
                &PathBuf::from("/tmp/x"),
                std::io::Error::from(std::io::ErrorKind::PermissionDenied)
            )),
            WriterError::Workspace(_)
        ));
        assert!(matches!(
            WriterError::from(GitError::NoUpstream),
            WriterError::Git(_)
        ));
    }

    #[test]
    fn only_transport_failures_retry() {
        assert!(WriterError::from(clone_error()).is_retryable());
        assert!(WriterError::from(GitError::Push {
            refspec: "refs/heads/main:refs/heads/main".into(),
            message: "timeout".into(),
        })
        .is_retryable());

        assert!(!WriterError::PathTraversalViolation(PathError::GitDir {
            path: ".git/config".into()
        })
        .is_retryable());
        assert!(!WriterError::FileNotFound { path: "a".into() }.is_retryable());
        assert!(!WriterError::from(AuthError::MissingCredential {
            key: "password",
            secret: "default/git".into(),
        })
        .is_retryable());
    }

    #[test]
    fn messages_carry_context() {
        let err = WriterError::from(clone_error());
        assert!(err.to_string().contains("could not clone"));
        assert!(err.to_string().contains("connection refused"));

        let err = WriterError::FileNotFound {
            path: "ns/name/a.yaml".into(),
        };
        assert_eq!(err.to_string(), "file not found: ns/name/a.yaml");
        assert!(err.is_not_found());
    }
}
