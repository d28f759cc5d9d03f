//! secrets::directory
//!
//! Credentials from a mounted secret directory.
//!
//! Each regular file is one key; the file name is the key and the file
//! content is the value. Entries whose names start with `.` are skipped,
//! which covers the `..data` and timestamped directories an orchestrator
//! uses to swap mounted secrets atomically. Symlinks are followed.

use std::fs;
use std::path::PathBuf;

use super::traits::{CredentialSource, SecretError};
use super::CredentialSet;

/// Reads a [`CredentialSet`] from a directory of files.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

impl CredentialSource for DirectorySource {
    fn load(&self) -> Result<CredentialSet, SecretError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            SecretError::ReadError(format!("cannot list '{}': {}", self.dir.display(), e))
        })?;

        let mut creds = CredentialSet::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                SecretError::ReadError(format!("cannot list '{}': {}", self.dir.display(), e))
            })?;

            let Some(key) = entry.file_name().to_str().map(str::to_owned) else {
                tracing::warn!(dir = %self.dir.display(), "skipping non UTF-8 credential file name");
                continue;
            };
            if key.starts_with('.') {
                continue;
            }

            let path = entry.path();
            let metadata = fs::metadata(&path).map_err(|e| {
                SecretError::ReadError(format!("cannot stat '{}': {}", path.display(), e))
            })?;
            if !metadata.is_file() {
                continue;
            }

            let value = fs::read(&path).map_err(|e| {
                SecretError::ReadError(format!("cannot read '{}': {}", path.display(), e))
            })?;
            creds.insert(key, value);
        }

        tracing::debug!(dir = %self.dir.display(), keys = creds.len(), "loaded credentials");
        Ok(creds)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}
