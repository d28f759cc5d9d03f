//! auth::errors
//!
//! Error types for credential resolution.
//!
//! # Design
//!
//! Error messages MUST NOT contain secret material. They name the missing
//! key and the secret it was expected in, or describe what is wrong with
//! a value without quoting it.
//!
//! # Example
//!
//! ```
//! use gitops_statestore::auth::AuthError;
//!
//! let err = AuthError::MissingCredential {
//!     key: "sshPrivateKey",
//!     secret: "default/git-creds".to_string(),
//! };
//! assert_eq!(err.to_string(), "sshPrivateKey not found in secret default/git-creds");
//! ```

use thiserror::Error;

/// Errors from resolving a credential set into a [`GitAuth`](super::GitAuth).
///
/// Both variants are configuration problems: retrying with the same
/// credential set can never succeed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    /// A key required by the auth method is absent from the credential set.
    #[error("{key} not found in secret {secret}")]
    MissingCredential {
        /// The missing key (e.g. `sshPrivateKey`)
        key: &'static str,
        /// `<namespace>/<secret name>` the key was looked up in
        secret: String,
    },

    /// A credential value is present but cannot be used.
    #[error("error parsing {key}: {message}")]
    ParseError {
        /// The key whose value is malformed
        key: &'static str,
        /// What is wrong with it (never the value itself)
        message: String,
    },
}

impl AuthError {
    pub(crate) fn parse(key: &'static str, message: impl Into<String>) -> Self {
        AuthError::ParseError {
            key,
            message: message.into(),
        }
    }

    /// The credential key this error is about.
    pub fn key(&self) -> &'static str {
        match self {
            AuthError::MissingCredential { key, .. } | AuthError::ParseError { key, .. } => key,
        }
    }
}
