//! secrets::traits
//!
//! Credential source trait definition.
//!
//! # Design
//!
//! A `CredentialSource` produces a complete [`CredentialSet`] in one call.
//! Sources are read once, when a writer is built; nothing here caches or
//! refreshes.
//!
//! # Security
//!
//! Implementations MUST:
//! - Never log, print, or include secret values in error messages
//! - Be thread-safe (Send + Sync)

use thiserror::Error;

use super::CredentialSet;

/// Errors from loading credentials.
///
/// Note: Error messages intentionally do not include secret values.
#[derive(Debug, Error)]
pub enum SecretError {
    /// Failed to read from the credential source.
    #[error("failed to read credentials: {0}")]
    ReadError(String),

    /// The credential source exists but its content is malformed.
    #[error("failed to parse credentials: {0}")]
    ParseError(String),
}

/// Something that can produce a [`CredentialSet`].
///
/// # Example
///
/// ```ignore
/// use gitops_statestore::secrets::{CredentialSource, DirectorySource};
///
/// let source = DirectorySource::new("/var/run/secrets/git".into());
/// let creds = source.load()?;
/// assert!(creds.contains_key("sshPrivateKey"));
/// ```
pub trait CredentialSource: Send + Sync {
    /// Load every key the source holds.
    fn load(&self) -> Result<CredentialSet, SecretError>;

    /// Short description of where the credentials come from, for logs.
    fn describe(&self) -> String;
}
