//! secrets::manifest
//!
//! Credentials from a JSON secret manifest.
//!
//! Accepts the shape an orchestrator prints for a secret object: a `data`
//! map of base64 values and/or a `stringData` map of plain values. Other
//! top-level fields are ignored. When a key appears in both maps, the
//! `stringData` value wins.
//!
//! ```json
//! {
//!   "kind": "Secret",
//!   "data": { "username": "Ym90" },
//!   "stringData": { "password": "s3cret" }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use base64::Engine as _;
use serde::Deserialize;

use super::traits::{CredentialSource, SecretError};
use super::CredentialSet;

#[derive(Debug, Deserialize)]
struct SecretManifest {
    #[serde(default)]
    data: BTreeMap<String, String>,
    #[serde(default, rename = "stringData")]
    string_data: BTreeMap<String, String>,
}

/// Reads a [`CredentialSet`] from a JSON manifest file.
#[derive(Debug, Clone)]
pub struct ManifestSource {
    path: PathBuf,
}

impl ManifestSource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Parse manifest content directly.
    ///
    /// # Errors
    ///
    /// `SecretError::ParseError` for malformed JSON or a `data` value that
    /// is not valid base64. The error names the key, never the value.
    pub fn parse(content: &[u8]) -> Result<CredentialSet, SecretError> {
        let manifest: SecretManifest = serde_json::from_slice(content)
            .map_err(|e| SecretError::ParseError(format!("invalid secret manifest: {}", e)))?;

        let mut creds = CredentialSet::new();
        for (key, encoded) in manifest.data {
            let value = base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|_| {
                    SecretError::ParseError(format!("invalid base64 for key '{}'", key))
                })?;
            creds.insert(key, value);
        }
        for (key, value) in manifest.string_data {
            creds.insert(key, value.into_bytes());
        }
        Ok(creds)
    }
}

impl CredentialSource for ManifestSource {
    fn load(&self) -> Result<CredentialSet, SecretError> {
        let content = fs::read(&self.path).map_err(|e| {
            SecretError::ReadError(format!("cannot read '{}': {}", self.path.display(), e))
        })?;
        let creds = Self::parse(&content)?;
        tracing::debug!(path = %self.path.display(), keys = creds.len(), "loaded credentials");
        Ok(creds)
    }

    fn describe(&self) -> String {
        format!("manifest {}", self.path.display())
    }
}
