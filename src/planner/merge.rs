//! Build/launch flag merging across duplicated plan entries

use crate::plan::PlanEntry;

/// Where a layer is visible once the build completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayerTypes {
    pub build: bool,
    pub launch: bool,
}

impl LayerTypes {
    /// A layer is cached across builds iff it is part of the build environment.
    pub fn cache(&self) -> bool {
        self.build
    }
}

/// OR-accumulate the `build` and `launch` flags of every entry named `tool`.
///
/// Zero matching entries is legitimate (transitive provisions) and yields
/// neither flag.
pub fn merge_layer_types(tool: &str, entries: &[PlanEntry]) -> LayerTypes {
    entries
        .iter()
        .filter(|entry| entry.name == tool)
        .fold(LayerTypes::default(), |acc, entry| LayerTypes {
            build: acc.build || entry.metadata.build,
            launch: acc.launch || entry.metadata.launch,
        })
}
