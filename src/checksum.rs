//! Namespaced dependency checksums
//!
//! Catalog entries carry checksums as `algorithm:hash` (e.g. `sha256:abcd…`),
//! while older layers and catalogs store a bare hash. A bare hash has no
//! algorithm and is compatible with any algorithm when compared.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A checksum split into its optional algorithm and its hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: Option<String>,
    hash: String,
}

impl Checksum {
    /// Parse a checksum in either `algorithm:hash` or bare `hash` form.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match value.split_once(':') {
            Some((algorithm, hash)) if !algorithm.is_empty() => Self {
                algorithm: Some(algorithm.to_ascii_lowercase()),
                hash: hash.to_ascii_lowercase(),
            },
            Some((_, hash)) => Self {
                algorithm: None,
                hash: hash.to_ascii_lowercase(),
            },
            None => Self {
                algorithm: None,
                hash: value.to_ascii_lowercase(),
            },
        }
    }

    /// A sha256 checksum from a hex digest
    pub fn sha256(hash: impl Into<String>) -> Self {
        Self {
            algorithm: Some("sha256".to_string()),
            hash: hash.into().to_ascii_lowercase(),
        }
    }

    pub fn algorithm(&self) -> Option<&str> {
        self.algorithm.as_deref()
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn is_empty(&self) -> bool {
        self.hash.is_empty()
    }

    /// Algorithm-tolerant equality.
    ///
    /// Empty hashes never match. Two explicit algorithms must agree; a
    /// missing algorithm on either side matches any algorithm.
    pub fn matches(&self, other: &Checksum) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        if let (Some(left), Some(right)) = (&self.algorithm, &other.algorithm) {
            if left != right {
                return false;
            }
        }
        self.hash == other.hash
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.algorithm {
            Some(algorithm) => write!(f, "{}:{}", algorithm, self.hash),
            None => write!(f, "{}", self.hash),
        }
    }
}

impl FromStr for Checksum {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}
