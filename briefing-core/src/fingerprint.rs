//! Deterministic identifiers
//!
//! - [`ClusterId`]: derived from member item ids, recomputed every run and
//!   used as the seed for reproducible choices within a cluster
//! - [`Fingerprint`]: derived from the normalized representative title and
//!   domain, stable across runs and used for cross-run dedup and feedback

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::{normalize, ItemId};

const ID_HEX_LEN: usize = 16;

fn hex_prefix(hasher: Sha256) -> String {
    format!("{:x}", hasher.finalize())[..ID_HEX_LEN].to_string()
}

/// Cluster identifier derived from the sorted member ids
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(String);

impl ClusterId {
    /// Derive an id from member item ids; order of the input does not matter
    pub fn from_members<'a, I>(ids: I) -> Self
    where
        I: IntoIterator<Item = &'a ItemId>,
    {
        let mut sorted: Vec<&str> = ids.into_iter().map(|id| id.as_str()).collect();
        sorted.sort_unstable();

        let mut hasher = Sha256::new();
        for id in sorted {
            hasher.update(id.as_bytes());
            hasher.update(b"\n");
        }
        Self(hex_prefix(hasher))
    }

    /// 32-byte seed for reproducible random choices within this cluster
    pub fn seed(&self) -> [u8; 32] {
        let mut seed = [0u8; 32];
        seed.copy_from_slice(&Sha256::digest(self.0.as_bytes()));
        seed
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Run-independent topic fingerprint
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Fingerprint of a news topic: normalized title + representative domain
    pub fn for_topic(title: &str, domain: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"news|");
        hasher.update(normalize(title).as_bytes());
        hasher.update(b"|");
        hasher.update(domain.trim().to_lowercase().as_bytes());
        Self(hex_prefix(hasher))
    }

    /// Fingerprint of a repository: its lower-cased full name
    pub fn for_repo(full_name: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"repo|");
        hasher.update(full_name.trim().to_lowercase().as_bytes());
        Self(hex_prefix(hasher))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Fingerprint {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Stable 64-bit hash of `text` under `seed`
pub fn stable_hash(seed: &str, text: &str) -> u64 {
    let digest = Sha256::digest(format!("{}|{}", seed, text).as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
