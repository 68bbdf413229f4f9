//! Reuse-or-rebuild decision for a single layer

use crate::checksum::Checksum;
use std::fmt;

/// What to do with an existing layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDecision {
    /// Recorded checksum matches, keep the layer contents
    Reuse,
    /// Reset the layer and install again
    Rebuild,
}

impl CacheDecision {
    pub fn decide(cached: Option<&Checksum>, resolved: &Checksum) -> Self {
        if should_reuse(cached, resolved) {
            Self::Reuse
        } else {
            Self::Rebuild
        }
    }
}

impl fmt::Display for CacheDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reuse => write!(f, "reuse"),
            Self::Rebuild => write!(f, "rebuild"),
        }
    }
}

/// Decide whether a layer built from `cached` can stand in for `resolved`.
pub fn should_reuse(cached: Option<&Checksum>, resolved: &Checksum) -> bool {
    match cached {
        Some(cached) if !cached.is_empty() && !resolved.is_empty() => cached.matches(resolved),
        _ => false,
    }
}
