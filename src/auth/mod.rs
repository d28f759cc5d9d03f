//! auth
//!
//! Credential resolution for git remotes.
//!
//! # Architecture
//!
//! A writer resolves its credentials exactly once, at construction:
//!
//! 1. The caller supplies an [`AuthMethodKind`](crate::core::types::AuthMethodKind)
//!    and a [`CredentialSet`](crate::secrets::CredentialSet)
//! 2. [`resolve`] checks the required keys, validates the values, and
//!    produces a [`GitAuth`]
//! 3. The transport uses that `GitAuth` for every clone and push
//!
//! Missing or malformed credentials therefore fail before any network
//! access.
//!
//! # Host key verification
//!
//! SSH host keys are checked against an in-memory [`KnownHosts`] list
//! parsed from the `knownHosts` credential. Nothing is written to disk.
//!
//! # Security
//!
//! - `Debug` output of every credential type redacts secret values
//! - [`AuthError`] messages name keys, never values

mod errors;
pub mod known_hosts;
mod resolver;

pub use errors::AuthError;
pub use known_hosts::{HostKeyVerdict, KnownHosts};
pub use resolver::{
    resolve, validate_private_key, BasicCredential, GitAuth, SshCredential, DEFAULT_SSH_USER,
    KNOWN_HOSTS, PASSWORD, SSH_PRIVATE_KEY, USERNAME,
};
