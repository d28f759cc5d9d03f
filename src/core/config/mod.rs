//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! A writer config is a single TOML file. [`WriterConfig::load`] reads an
//! explicit path; [`WriterConfig::from_env`] reads the path named by
//! `$STATESTORE_CONFIG`.
//!
//! # Example
//!
//! ```no_run
//! use gitops_statestore::core::config::WriterConfig;
//! use std::path::Path;
//!
//! let config = WriterConfig::load(Path::new("/etc/statestore/writer.toml")).unwrap();
//! println!("branch: {}", config.state_store.branch);
//! ```

pub mod schema;

pub use schema::{CredentialsConfig, WriterConfig};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::secrets::{CredentialSource, DirectorySource, ManifestSource};

/// Environment variable naming the config file for [`WriterConfig::from_env`].
pub const CONFIG_ENV: &str = "STATESTORE_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),
}

impl WriterConfig {
    /// Load and validate a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails
    /// validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: WriterConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        config.validate()?;
        tracing::debug!(path = %path.display(), "loaded writer config");
        Ok(config)
    }

    /// Load the config file named by `$STATESTORE_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV).ok_or(ConfigError::MissingEnv(CONFIG_ENV))?;
        Self::load(Path::new(&path))
    }

    /// Build the credential source this config points at.
    ///
    /// Relative paths are taken as-is (relative to the process working
    /// directory).
    pub fn credential_source(&self) -> Result<Box<dyn CredentialSource>, ConfigError> {
        self.credentials.validate()?;
        match (&self.credentials.dir, &self.credentials.manifest) {
            (Some(dir), None) => Ok(Box::new(DirectorySource::new(dir.clone()))),
            (None, Some(manifest)) => Ok(Box::new(ManifestSource::new(manifest.clone()))),
            // validate() rules out the other combinations
            _ => Err(ConfigError::InvalidValue(
                "credentials: one of 'dir' or 'manifest' is required".into(),
            )),
        }
    }
}
