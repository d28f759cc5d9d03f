//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Config values are validated after parsing. Parsing already rejects an
//! invalid branch name or auth method; validation covers the cross-field
//! rules serde cannot express.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{Destination, StateStoreSpec};

/// Complete writer configuration.
///
/// # Example
///
/// ```toml
/// [state_store]
/// url = "ssh://git@example.com/org/state.git"
/// branch = "main"
/// path = "clusters"
/// auth_method = "ssh"
/// secret_ref = "git-credentials"
///
/// [destination]
/// namespace = "default"
/// name = "worker-1"
///
/// [credentials]
/// dir = "/var/run/secrets/git"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WriterConfig {
    /// Remote, branch and auth method.
    pub state_store: StateStoreSpec,

    /// Target location inside the state store.
    pub destination: Destination,

    /// Where to load the credential set from.
    pub credentials: CredentialsConfig,
}

impl WriterConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_store.url.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "state_store.url cannot be empty".into(),
            ));
        }

        if self.destination.namespace.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "destination.namespace cannot be empty".into(),
            ));
        }

        if self.destination.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "destination.name cannot be empty".into(),
            ));
        }

        self.credentials.validate()
    }
}

/// Credential source settings.
///
/// Exactly one of `dir` or `manifest` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    /// A mounted secret directory, one file per key.
    pub dir: Option<PathBuf>,

    /// A JSON secret manifest with `data` / `stringData` maps.
    pub manifest: Option<PathBuf>,
}

impl CredentialsConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.dir, &self.manifest) {
            (Some(_), Some(_)) => Err(ConfigError::InvalidValue(
                "credentials: set either 'dir' or 'manifest', not both".into(),
            )),
            (None, None) => Err(ConfigError::InvalidValue(
                "credentials: one of 'dir' or 'manifest' is required".into(),
            )),
            _ => Ok(()),
        }
    }
}
