//! core::types
//!
//! Strong types for the state store domain.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`AuthMethodKind`] - Which credential shape a state store expects
//! - [`SecretRef`] - Name of the secret holding the credentials
//! - [`StateStoreSpec`] - Remote, branch and base path of a state store
//! - [`Destination`] - Where inside the state store a destination lives
//! - [`Workload`] - A single file to materialise
//!
//! # Validation
//!
//! These types enforce validity at construction time. Invalid values
//! cannot be represented, preventing entire classes of bugs.
//!
//! # Examples
//!
//! ```
//! use gitops_statestore::core::types::{BranchName, Oid};
//!
//! let branch = BranchName::new("main").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// Characters git never allows in a ref name, besides ASCII control
/// characters.
const FORBIDDEN_REF_CHARS: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

/// A branch name that git will accept as `refs/heads/<name>`.
///
/// Follows `git check-ref-format --branch`: no empty `/` components, no
/// component starting with `.` or ending in `.lock`, no `..` or `@{`, none
/// of `FORBIDDEN_REF_CHARS`, and not `@` on its own or starting with `-`.
///
/// # Example
///
/// ```
/// use gitops_statestore::core::types::BranchName;
///
/// let name = BranchName::new("environments/dev").unwrap();
/// assert_eq!(name.local_ref(), "refs/heads/environments/dev");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("branch.lock").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BranchName(String);

impl BranchName {
    /// # Errors
    ///
    /// [`TypeError::InvalidBranchName`] naming the first rule `name` breaks.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        match refname_problem(&name) {
            Some(problem) => Err(TypeError::InvalidBranchName(format!(
                "{:?} {}",
                name, problem
            ))),
            None => Ok(Self(name)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `refs/heads/<name>`.
    pub fn local_ref(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

/// Why `name` is not a valid branch name, if it is not.
fn refname_problem(name: &str) -> Option<String> {
    if name.is_empty() {
        return Some("is empty".into());
    }
    if name == "@" {
        return Some("is reserved".into());
    }
    if name.starts_with('-') {
        return Some("starts with '-'".into());
    }
    if name.ends_with('.') {
        return Some("ends with '.'".into());
    }
    if let Some(c) = name
        .chars()
        .find(|c| c.is_ascii_control() || FORBIDDEN_REF_CHARS.contains(c))
    {
        return Some(format!("contains {:?}", c));
    }
    if let Some(seq) = ["..", "@{"].into_iter().find(|seq| name.contains(seq)) {
        return Some(format!("contains '{}'", seq));
    }

    name.split('/').find_map(|component| {
        if component.is_empty() {
            Some("has an empty path component".to_string())
        } else if component.starts_with('.') {
            Some(format!("has component '{}' starting with '.'", component))
        } else if component.ends_with(".lock") {
            Some(format!("has component '{}' ending in '.lock'", component))
        } else {
            None
        }
    })
}

impl TryFrom<String> for BranchName {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<BranchName> for String {
    fn from(name: BranchName) -> Self {
        name.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A commit id in lowercase hex: 40 digits in SHA-1 repositories, 64 in
/// SHA-256 ones.
///
/// ```
/// use gitops_statestore::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(String);

impl Oid {
    pub fn new(hex: impl AsRef<str>) -> Result<Self, TypeError> {
        let hex = hex.as_ref();
        let well_formed =
            matches!(hex.len(), 40 | 64) && hex.bytes().all(|b| b.is_ascii_hexdigit());
        if !well_formed {
            return Err(TypeError::InvalidOid(format!(
                "{:?} is not a 40 or 64 digit hex id",
                hex
            )));
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// The first `len` hex digits, or the whole id when it is shorter.
    pub fn short(&self, len: usize) -> &str {
        self.0.get(..len).unwrap_or(self.0.as_str())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The credential shape a state store expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethodKind {
    /// SSH private key plus a known hosts list.
    Ssh,
    /// HTTP basic authentication (username and password or token).
    Basic,
}

impl std::fmt::Display for AuthMethodKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMethodKind::Ssh => write!(f, "ssh"),
            AuthMethodKind::Basic => write!(f, "basic"),
        }
    }
}

/// Name of the secret that holds a state store's credentials.
///
/// Only used to make error messages point at the right secret.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecretRef(pub String);

impl SecretRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SecretRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_skip_tls() -> bool {
    true
}

/// Where and how the desired state is stored.
///
/// Immutable once loaded; a writer captures it at construction.
///
/// ```toml
/// url = "ssh://git@example.com/org/state.git"
/// branch = "main"
/// path = "clusters"
/// auth_method = "ssh"
/// secret_ref = "git-credentials"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateStoreSpec {
    /// Remote URL (ssh, https, or a local path).
    pub url: String,

    /// Branch that holds the desired state.
    pub branch: BranchName,

    /// Base path inside the repository. May be empty.
    #[serde(default)]
    pub path: String,

    /// Credential shape to resolve from the secret.
    pub auth_method: AuthMethodKind,

    /// Secret holding the credentials.
    #[serde(default)]
    pub secret_ref: SecretRef,

    /// Skip TLS certificate validation for HTTPS remotes.
    #[serde(default = "default_skip_tls")]
    pub insecure_skip_tls_verify: bool,
}

impl StateStoreSpec {
    /// Create a spec with the default TLS policy and an empty base path.
    pub fn new(url: impl Into<String>, branch: BranchName, auth_method: AuthMethodKind) -> Self {
        Self {
            url: url.into(),
            branch,
            path: String::new(),
            auth_method,
            secret_ref: SecretRef::default(),
            insecure_skip_tls_verify: default_skip_tls(),
        }
    }
}

/// A target location within the state store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Destination {
    pub namespace: String,
    pub name: String,

    /// Destination-specific sub path, placed between the store base path
    /// and the namespace.
    #[serde(default)]
    pub path: String,
}

impl Destination {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            path: String::new(),
        }
    }

    /// Set the destination sub path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

/// A single file to create or overwrite.
#[derive(Clone, PartialEq, Eq)]
pub struct Workload {
    /// Path relative to the directory being reconciled.
    pub filepath: String,
    /// Raw file content.
    pub content: Vec<u8>,
}

impl Workload {
    pub fn new(filepath: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            filepath: filepath.into(),
            content: content.into(),
        }
    }
}

impl std::fmt::Debug for Workload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workload")
            .field("filepath", &self.filepath)
            .field("content_len", &self.content.len())
            .finish()
    }
}
