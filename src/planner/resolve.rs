//! Priority-ordered version resolution
//!
//! Candidates are the distinct `(source, version)` pairs requested for a tool,
//! followed by an implicit `<unknown> -> ""` candidate that lets the catalog
//! pick its configured default. The first prioritized source with a
//! non-empty version wins.

use crate::error::{InstallerError, InstallerResult};
use crate::plan::{PlanEntry, PlanMetadata};
use crate::planner::merge::merge_layer_types;

/// Source label for versions requested without a source, and for the default
pub const UNKNOWN_SOURCE: &str = "<unknown>";

/// Version string meaning "use the catalog default"
pub const DEFAULT_VERSION: &str = "";

/// One version source considered during resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: String,
    pub version: String,
    pub selected: bool,
}

/// Outcome of resolving one tool's version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Effective entry: winning version and source, merged flags
    pub entry: PlanEntry,

    /// Every candidate in priority order, winner marked
    pub candidates: Vec<Candidate>,
}

impl Resolution {
    /// The effective version, empty when the catalog default applies
    pub fn version(&self) -> &str {
        &self.entry.metadata.version
    }

    pub fn source(&self) -> &str {
        &self.entry.metadata.version_source
    }

    /// Aligned `source -> "version"` lines for operator logs
    pub fn candidate_lines(&self) -> Vec<String> {
        let width = self
            .candidates
            .iter()
            .map(|c| c.source.len())
            .max()
            .unwrap_or(0);

        self.candidates
            .iter()
            .map(|c| format!("{:<width$} -> \"{}\"", c.source, c.version, width = width))
            .collect()
    }
}

/// Resolve the effective version for `tool`.
///
/// Explicit sources that request two different versions for the same tool
/// are rejected as a configuration error.
pub fn resolve(
    tool: &str,
    entries: &[PlanEntry],
    priorities: &[&str],
) -> InstallerResult<Resolution> {
    let mut requested: Vec<(String, String)> = Vec::new();

    for entry in entries.iter().filter(|e| e.name == tool) {
        let version = entry.metadata.version.trim();
        if version.is_empty() {
            continue;
        }
        let source = match entry.metadata.version_source.trim() {
            "" => UNKNOWN_SOURCE,
            source => source,
        };

        if source != UNKNOWN_SOURCE {
            if let Some((_, first)) = requested
                .iter()
                .find(|(s, v)| s == source && v != version)
            {
                return Err(InstallerError::ConflictingVersions {
                    tool: tool.to_string(),
                    source_name: source.to_string(),
                    first: first.clone(),
                    second: version.to_string(),
                });
            }
        }

        if !requested.iter().any(|(s, v)| s == source && v == version) {
            requested.push((source.to_string(), version.to_string()));
        }
    }

    // Prioritized sources first, in priority order, then the rest as declared.
    let rank = |source: &str| {
        priorities
            .iter()
            .position(|p| *p == source)
            .unwrap_or(priorities.len())
    };
    requested.sort_by_key(|(source, _)| rank(source));

    let winner = requested
        .iter()
        .position(|(source, _)| rank(source) < priorities.len());

    let mut candidates: Vec<Candidate> = requested
        .into_iter()
        .enumerate()
        .map(|(index, (source, version))| Candidate {
            source,
            version,
            selected: Some(index) == winner,
        })
        .collect();

    candidates.push(Candidate {
        source: UNKNOWN_SOURCE.to_string(),
        version: DEFAULT_VERSION.to_string(),
        selected: winner.is_none(),
    });

    let chosen = candidates
        .iter()
        .find(|c| c.selected)
        .cloned()
        .unwrap_or_else(|| Candidate {
            source: UNKNOWN_SOURCE.to_string(),
            version: DEFAULT_VERSION.to_string(),
            selected: true,
        });

    let types = merge_layer_types(tool, entries);
    let entry = PlanEntry {
        name: tool.to_string(),
        metadata: PlanMetadata {
            build: types.build,
            launch: types.launch,
            version: chosen.version,
            version_source: chosen.source,
        },
    };

    Ok(Resolution { entry, candidates })
}
