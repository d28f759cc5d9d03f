//! secrets::credentials
//!
//! The in-memory credential mapping handed to the auth resolver.

use std::collections::BTreeMap;

/// Named secret values, as raw bytes.
///
/// Which keys matter depends on the auth method: `sshPrivateKey` and
/// `knownHosts` for SSH, `username` and `password` for basic auth.
///
/// The `Debug` output lists key names only.
///
/// ```
/// use gitops_statestore::secrets::CredentialSet;
///
/// let mut creds = CredentialSet::new();
/// creds.insert("username", "bot");
/// creds.insert("password", "s3cret");
///
/// assert_eq!(creds.get("username"), Some(&b"bot"[..]));
/// assert!(!format!("{:?}", creds).contains("s3cret"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct CredentialSet {
    values: BTreeMap<String, Vec<u8>>,
}

impl CredentialSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[u8]> {
        self.values.get(key).map(Vec::as_slice)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for CredentialSet
where
    K: Into<String>,
    V: Into<Vec<u8>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSet")
            .field("keys", &self.values.keys().collect::<Vec<_>>())
            .finish()
    }
}
