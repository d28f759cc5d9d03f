//! secrets
//!
//! Credential loading for state store writers.
//!
//! # Architecture
//!
//! Credentials reach the writer as a [`CredentialSet`]: an opaque mapping
//! of key names to bytes. How that mapping is produced is behind the
//! [`CredentialSource`] trait, with two implementations:
//!
//! - [`DirectorySource`]: a mounted secret directory, one file per key
//! - [`ManifestSource`]: a JSON secret manifest (`data` / `stringData`)
//!
//! # Security
//!
//! - Secret values are **never** logged or included in error messages
//! - `Debug` output of a [`CredentialSet`] lists key names only
//!
//! # Example
//!
//! ```ignore
//! use gitops_statestore::secrets::{CredentialSource, ManifestSource};
//!
//! let creds = ManifestSource::new("secret.json".into()).load()?;
//! if creds.contains_key("sshPrivateKey") {
//!     // hand over to the auth resolver
//! }
//! ```

mod credentials;
mod directory;
mod manifest;
mod traits;

pub use credentials::CredentialSet;
pub use directory::DirectorySource;
pub use manifest::ManifestSource;
pub use traits::{CredentialSource, SecretError};
