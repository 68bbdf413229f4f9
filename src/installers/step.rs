//! The build step shared by every installer
//!
//! ```text
//! resolve version ─► catalog lookup ─► merge layer types ─► cache decision
//!                                                              │
//!                          ┌───────────── reuse ◄──────────────┤
//!                          │                                   ▼
//!                          │                   reset ─► install ─► metadata ─► SBOM
//!                          ▼                                                    │
//!                     BuildResult ◄─────────────────────────────────────────────┘
//! ```
//!
//! Installers drive the sequence through [`BuildStep`] and only supply the
//! install mechanics in between.

use crate::build::{BuildContext, BuildResult, CommonBuildParameters};
use crate::cache::CacheDecision;
use crate::catalog::{deprecation_warning, BomEntry, DependencyDescriptor, DependencyManager};
use crate::clock::format_duration;
use crate::error::InstallerResult;
use crate::installers::Installer;
use crate::layer::{Layer, LayerMetadata};
use crate::planner::{self, merge_layer_types, LayerTypes};
use tracing::{debug, info, warn};

/// Everything known about a tool before anything is installed
#[derive(Debug, Clone)]
pub struct Prepared {
    pub dependency: DependencyDescriptor,

    /// The layer as a previous build left it
    pub layer: Layer,

    pub types: LayerTypes,
    pub decision: CacheDecision,
    bom: Vec<BomEntry>,
}

impl Prepared {
    pub fn is_reusable(&self) -> bool {
        self.decision == CacheDecision::Reuse
    }

    /// Wrap the step's layers with the BOM in every environment the tool joins.
    pub fn into_result(self, layers: Vec<Layer>) -> BuildResult {
        BuildResult {
            layers,
            build_bom: if self.types.build {
                self.bom.clone()
            } else {
                Vec::new()
            },
            launch_bom: if self.types.launch {
                self.bom
            } else {
                Vec::new()
            },
        }
    }
}

/// One installer's pass through the shared sequence
pub struct BuildStep<'a> {
    installer: Installer,
    context: &'a BuildContext,
    common: &'a CommonBuildParameters,
}

impl<'a> BuildStep<'a> {
    pub fn new(
        installer: Installer,
        context: &'a BuildContext,
        common: &'a CommonBuildParameters,
    ) -> Self {
        Self {
            installer,
            context,
            common,
        }
    }

    /// Resolve the version, look the dependency up and decide about the cache.
    pub fn prepare(&self, manager: &dyn DependencyManager) -> InstallerResult<Prepared> {
        let installer = self.installer;
        let tool = installer.plan_name();

        info!("Resolving {} version", installer.display_name());
        let resolution = planner::resolve(
            tool,
            &self.context.plan.entries,
            &installer.priorities(),
        )?;
        info!("Candidate version sources (in priority order):");
        for line in resolution.candidate_lines() {
            info!("  {}", line);
        }

        let dependency = manager.resolve(
            &self.context.manifest_path(),
            installer.dependency_id(),
            resolution.version(),
            &self.context.stack,
        )?;
        self.log_selected(&dependency, resolution.source());

        let bom = manager.generate_bill_of_materials(std::slice::from_ref(&dependency));
        let layer = self.context.layers.get(installer.layer_name())?;
        let types = merge_layer_types(tool, &self.context.plan.entries);

        let checksum = dependency.checksum();
        let cached = layer.metadata.checksum(installer.checksum_key());
        let decision = CacheDecision::decide(cached, &checksum);
        debug!("Cache decision for {}: {} ({})", tool, decision, checksum);

        Ok(Prepared {
            dependency,
            layer,
            types,
            decision,
            bom,
        })
    }

    fn log_selected(&self, dependency: &DependencyDescriptor, source: &str) {
        info!(
            "Selected {} version (using {}): {}",
            dependency.display_name(),
            source,
            dependency.version
        );
        if let Some(warning) = deprecation_warning(dependency, self.common.clock.now()) {
            warn!("{}", warning);
        }
    }

    /// Hand back the cached layer with types from the current plan.
    pub fn reuse(&self, prepared: &Prepared) -> Layer {
        info!("Reusing cached layer {}", prepared.layer.path.display());
        let mut layer = prepared.layer.clone();
        layer.apply_types(prepared.types);
        layer
    }

    /// Clear the tool's layer for a fresh install.
    pub fn fresh_layer(&self, prepared: &Prepared) -> InstallerResult<Layer> {
        let mut layer = prepared.layer.clone().reset()?;
        layer.apply_types(prepared.types);
        Ok(layer)
    }

    /// A cleared staging layer with no types; dropped when the build is persisted.
    pub fn scratch_layer(&self, name: &str) -> InstallerResult<Layer> {
        self.context.layers.get(name)?.reset()
    }

    /// Run the install mechanics, timed.
    pub fn install<F>(&self, dependency: &DependencyDescriptor, f: F) -> InstallerResult<()>
    where
        F: FnOnce() -> InstallerResult<()>,
    {
        info!("Executing build process");
        info!(
            "  Installing {} {}",
            self.installer.display_name(),
            dependency.version
        );
        let (result, duration) = self.common.clock.measure(f);
        result?;
        info!("    Completed in {}", format_duration(duration));
        Ok(())
    }

    /// Run a follow-up action, timed as `<label> completed in`.
    pub fn timed<T, F>(&self, label: &str, f: F) -> InstallerResult<T>
    where
        F: FnOnce() -> InstallerResult<T>,
    {
        let (result, duration) = self.common.clock.measure(f);
        let value = result?;
        info!("    {} completed in {}", label, format_duration(duration));
        Ok(value)
    }

    /// Record the installed checksum and attach the SBOM.
    pub fn finish(
        &self,
        layer: &mut Layer,
        dependency: &DependencyDescriptor,
    ) -> InstallerResult<()> {
        layer.metadata = LayerMetadata::installed(
            self.installer.checksum_key(),
            dependency.checksum(),
            self.common.clock.now(),
        );

        info!("Generating SBOM for {}", layer.path.display());
        let generator = &self.common.sbom_generator;
        let (sbom, duration) = self
            .common
            .clock
            .measure(|| generator.generate_from_dependency(dependency, &layer.path));
        let sbom = sbom?;
        info!("  Completed in {}", format_duration(duration));

        let formats = &self.context.buildpack.sbom_formats;
        if !formats.is_empty() {
            info!("Writing SBOM in the following format(s):");
            for format in formats {
                info!("  {}", format);
            }
        }
        layer.sbom = sbom.in_formats(formats)?;
        Ok(())
    }
}
