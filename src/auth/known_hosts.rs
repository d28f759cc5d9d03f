//! auth::known_hosts
//!
//! In-memory verification of SSH host keys against OpenSSH `known_hosts`
//! content.
//!
//! # Format
//!
//! ```text
//! [@marker] hostpatterns keytype base64-key [comment]
//! ```
//!
//! - Lines are decoded by `ssh-key`; host patterns are comma separated
//!   globs (`*`, `?`) and may be negated with `!`. `[host]:port` matches `host` on any port.
//! - Hashed host fields (`|1|salt|hash`) are matched by HMAC-SHA1 of the
//!   plain host name.
//! - `@revoked` keys are rejected for every host.
//! - `@cert-authority` lines are skipped; certificate host keys are not
//!   supported by the transport.

use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use ssh_key::known_hosts::{Entry, HostPatterns, Marker};

use super::AuthError;

type HmacSha1 = Hmac<sha1::Sha1>;

const KEY: &str = "knownHosts";

/// Outcome of checking a presented host key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKeyVerdict {
    /// An entry for this host carries exactly this key.
    Trusted,
    /// The key is listed under `@revoked`.
    Revoked,
    /// No entry for this host carries this key.
    Unknown,
}

#[derive(Clone, PartialEq, Eq)]
enum HostMatcher {
    Patterns(Vec<HostPattern>),
    Hashed { salt: Vec<u8>, hash: Vec<u8> },
}

#[derive(Clone, PartialEq, Eq)]
struct HostPattern {
    negated: bool,
    glob: glob::Pattern,
}

#[derive(Clone, PartialEq, Eq)]
struct HostEntry {
    revoked: bool,
    hosts: HostMatcher,
    key_type: String,
    key: Vec<u8>,
}

/// A parsed `known_hosts` list.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct KnownHosts {
    entries: Vec<HostEntry>,
}

impl KnownHosts {
    /// Parse `known_hosts` content.
    ///
    /// # Errors
    ///
    /// [`AuthError::ParseError`] naming the offending line for non UTF-8
    /// content, lines `ssh-key` cannot decode (missing fields, unknown
    /// markers, bad base64, a key that does not match its declared type),
    /// or host patterns that are not valid globs.
    pub fn parse(content: &[u8]) -> Result<Self, AuthError> {
        let text = std::str::from_utf8(content)
            .map_err(|_| AuthError::parse(KEY, "content is not valid UTF-8"))?;

        let mut entries = Vec::new();
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let lineno = index + 1;
            let invalid =
                |message: String| AuthError::parse(KEY, format!("line {}: {}", lineno, message));

            let entry: Entry = line
                .parse()
                .map_err(|e: ssh_key::Error| invalid(e.to_string()))?;
            if matches!(entry.marker(), Some(Marker::CertAuthority)) {
                continue;
            }

            let public_key = entry.public_key();
            let key = public_key.to_bytes().map_err(|e| invalid(e.to_string()))?;

            let hosts = match entry.host_patterns() {
                HostPatterns::HashedName { salt, hash } => HostMatcher::Hashed {
                    salt: salt.clone(),
                    hash: hash.to_vec(),
                },
                HostPatterns::Patterns(patterns) => parse_patterns(patterns).map_err(invalid)?,
            };

            entries.push(HostEntry {
                revoked: matches!(entry.marker(), Some(Marker::Revoked)),
                hosts,
                key_type: public_key.algorithm().as_str().to_string(),
                key,
            });
        }

        Ok(Self { entries })
    }

/// Number of usable entries (including revocations).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check `key` (wire-format public key blob) presented by `host`.
    pub fn verify(&self, host: &str, key: &[u8]) -> HostKeyVerdict {
        if self.entries.iter().any(|e| e.revoked && e.key == key) {
            return HostKeyVerdict::Revoked;
        }

        let host = host.to_ascii_lowercase();
        let trusted = self
            .entries
            .iter()
            .filter(|e| !e.revoked)
            .any(|e| e.key == key && e.hosts.matches(&host));

        if trusted {
            HostKeyVerdict::Trusted
        } else {
            HostKeyVerdict::Unknown
        }
    }

    /// Key types listed for `host`, for diagnostics.
    pub fn key_types_for(&self, host: &str) -> Vec<&str> {
        let host = host.to_ascii_lowercase();
        self.entries
            .iter()
            .filter(|e| !e.revoked && e.hosts.matches(&host))
            .map(|e| e.key_type.as_str())
            .collect()
    }
}

impl std::fmt::Debug for KnownHosts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnownHosts")
            .field("entries", &self.entries.len())
            .finish()
    }
}

/// `SHA256:<base64>` fingerprint of a public key blob, as `ssh-keygen -l`
/// prints it.
pub fn fingerprint(key: &[u8]) -> String {
    let hash = Sha256::digest(key);
    let encoded = base64::engine::general_purpose::STANDARD_NO_PAD.encode(hash);
    format!("SHA256:{encoded}")
}

fn parse_patterns(patterns: &[String]) -> Result<HostMatcher, String> {
    let patterns = patterns
        .iter()
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (negated, p) = match p.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, p.as_str()),
            };
            let glob = glob::Pattern::new(&strip_port(p).to_ascii_lowercase())
                .map_err(|e| format!("invalid host pattern '{}': {}", p, e))?;
            Ok(HostPattern { negated, glob })
        })
        .collect::<Result<Vec<_>, String>>()?;

    if patterns.is_empty() {
        return Err("empty host pattern".to_string());
    }
    Ok(HostMatcher::Patterns(patterns))
}

/// `[host]:port` -> `host`; anything else unchanged.
fn strip_port(pattern: &str) -> &str {
    pattern
        .strip_prefix('[')
        .and_then(|rest| rest.split_once("]:"))
        .map(|(host, _port)| host)
        .unwrap_or(pattern)
}

impl HostMatcher {
    fn matches(&self, host: &str) -> bool {
        match self {
            HostMatcher::Patterns(patterns) => {
                let mut matched = false;
                for pattern in patterns {
                    if pattern.glob.matches(host) {
                        if pattern.negated {
                            return false;
                        }
                        matched = true;
                    }
                }
                matched
            }
            HostMatcher::Hashed { salt, hash } => {
                let Ok(mut mac) = HmacSha1::new_from_slice(salt) else {
                    return false;
                };
                mac.update(host.as_bytes());
                mac.verify_slice(hash).is_ok()
            }
        }
    }
}
