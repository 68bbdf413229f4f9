//! Test doubles for the collaborator traits
//!
//! Fakes share their state through `Rc<RefCell<_>>` so a test can hand a
//! boxed clone to the code under test and still inspect the calls afterwards.

use crate::build::{BuildContext, CommonBuildParameters};
use crate::catalog::{BomEntry, DependencyDescriptor, DependencyManager};
use crate::clock::Clock;
use crate::config::BuildpackInfo;
use crate::error::{InstallerError, InstallerResult};
use crate::exec::{ExecOutput, Executable, Execution};
use crate::layer::Layers;
use crate::plan::{Plan, PlanEntry};
use crate::sbom::{DependencySbomGenerator, Sbom, SbomGenerator};
use chrono::{TimeZone, Utc};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const STACK: &str = "io.buildpacks.stacks.jammy";

/// A context rooted in `root` with `layers/`, `cnb/` and `platform/` directories.
pub fn build_context(root: &Path, entries: Vec<PlanEntry>) -> BuildContext {
    let layers = root.join("layers");
    let cnb = root.join("cnb");
    let platform = root.join("platform");
    for dir in [&layers, &cnb, &platform] {
        fs::create_dir_all(dir).unwrap();
    }

    BuildContext {
        buildpack: BuildpackInfo {
            name: "Some Buildpack".to_string(),
            version: "some-version".to_string(),
            ..Default::default()
        },
        cnb_path: cnb,
        platform_path: platform,
        layers: Layers::new(layers),
        plan: Plan::new(entries),
        stack: STACK.to_string(),
    }
}

pub fn common_parameters() -> CommonBuildParameters {
    CommonBuildParameters {
        sbom_generator: Box::new(DependencySbomGenerator),
        clock: Clock::Fixed(Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()),
    }
}

pub fn descriptor(id: &str, version: &str, checksum: &str) -> DependencyDescriptor {
    DependencyDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        version: version.to_string(),
        uri: format!("https://example.com/{}-{}.tgz", id, version),
        checksum: checksum.to_string(),
        stacks: vec![STACK.to_string()],
        ..Default::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveCall {
    pub manifest: PathBuf,
    pub id: String,
    pub version: String,
    pub stack: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliverCall {
    pub dependency: DependencyDescriptor,
    pub cnb_path: PathBuf,
    pub destination: PathBuf,
    pub platform_path: PathBuf,
}

#[derive(Default)]
struct ManagerState {
    dependency: Option<DependencyDescriptor>,
    deliver_error: Option<String>,
    deliver_files: Vec<(String, String)>,
    resolve_calls: Vec<ResolveCall>,
    deliver_calls: Vec<DeliverCall>,
}

/// Catalog returning one fixed descriptor and recording every call
#[derive(Clone, Default)]
pub struct FakeDependencyManager {
    state: Rc<RefCell<ManagerState>>,
}

impl FakeDependencyManager {
    pub fn returning(dependency: DependencyDescriptor) -> Self {
        let fake = Self::default();
        fake.state.borrow_mut().dependency = Some(dependency);
        fake
    }

    /// A catalog that knows no versions at all
    pub fn failing_resolve() -> Self {
        Self::default()
    }

    pub fn set_dependency(&self, dependency: DependencyDescriptor) {
        self.state.borrow_mut().dependency = Some(dependency);
    }

    /// Make every delivery fail with a download error.
    pub fn fail_deliver(&self, reason: &str) {
        self.state.borrow_mut().deliver_error = Some(reason.to_string());
    }

    /// Files (relative path, content) written into the destination on delivery
    pub fn deliver_file(&self, path: &str, content: &str) {
        self.state
            .borrow_mut()
            .deliver_files
            .push((path.to_string(), content.to_string()));
    }

    pub fn resolve_calls(&self) -> Vec<ResolveCall> {
        self.state.borrow().resolve_calls.clone()
    }

    pub fn deliver_calls(&self) -> Vec<DeliverCall> {
        self.state.borrow().deliver_calls.clone()
    }
}

impl DependencyManager for FakeDependencyManager {
    fn resolve(
        &self,
        manifest: &Path,
        id: &str,
        version: &str,
        stack: &str,
    ) -> InstallerResult<DependencyDescriptor> {
        let mut state = self.state.borrow_mut();
        state.resolve_calls.push(ResolveCall {
            manifest: manifest.to_path_buf(),
            id: id.to_string(),
            version: version.to_string(),
            stack: stack.to_string(),
        });
        state
            .dependency
            .clone()
            .ok_or_else(|| InstallerError::DependencyNotFound {
                id: id.to_string(),
                version: version.to_string(),
                stack: stack.to_string(),
                supported: Vec::new(),
            })
    }

    fn deliver(
        &self,
        dependency: &DependencyDescriptor,
        cnb_path: &Path,
        destination: &Path,
        platform_path: &Path,
    ) -> InstallerResult<()> {
        let mut state = self.state.borrow_mut();
        state.deliver_calls.push(DeliverCall {
            dependency: dependency.clone(),
            cnb_path: cnb_path.to_path_buf(),
            destination: destination.to_path_buf(),
            platform_path: platform_path.to_path_buf(),
        });
        if let Some(reason) = &state.deliver_error {
            return Err(InstallerError::Download {
                uri: dependency.uri.clone(),
                reason: reason.clone(),
            });
        }
        for (path, content) in &state.deliver_files {
            let target = destination.join(path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(|e| InstallerError::io("fake deliver", e))?;
            }
            fs::write(&target, content).map_err(|e| InstallerError::io("fake deliver", e))?;
        }
        Ok(())
    }

    fn generate_bill_of_materials(&self, dependencies: &[DependencyDescriptor]) -> Vec<BomEntry> {
        dependencies.iter().map(BomEntry::from_dependency).collect()
    }
}

#[derive(Default)]
struct ExecState {
    calls: Vec<Execution>,
    responses: VecDeque<InstallerResult<ExecOutput>>,
}

/// Executable that records invocations and replays queued responses
///
/// With no queued response a call succeeds with empty output.
#[derive(Clone, Default)]
pub struct RecordingExecutable {
    state: Rc<RefCell<ExecState>>,
}

impl RecordingExecutable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond_with(&self, stdout: &str) {
        self.state.borrow_mut().responses.push_back(Ok(ExecOutput {
            stdout: stdout.to_string(),
            stderr: String::new(),
        }));
    }

    pub fn fail_with(&self, command: &str, output: &str) {
        self.state
            .borrow_mut()
            .responses
            .push_back(Err(InstallerError::command_exec(command, output)));
    }

    pub fn calls(&self) -> Vec<Execution> {
        self.state.borrow().calls.clone()
    }
}

impl Executable for RecordingExecutable {
    fn execute(&self, execution: &Execution) -> InstallerResult<ExecOutput> {
        let mut state = self.state.borrow_mut();
        state.calls.push(execution.clone());
        state
            .responses
            .pop_front()
            .unwrap_or_else(|| Ok(ExecOutput::default()))
    }
}

/// SBOM generator that always fails
pub struct FailingSbomGenerator;

impl SbomGenerator for FailingSbomGenerator {
    fn generate_from_dependency(
        &self,
        dependency: &DependencyDescriptor,
        _dir: &Path,
    ) -> InstallerResult<Sbom> {
        Err(InstallerError::Sbom {
            name: dependency.display_name().to_string(),
            reason: "failed to generate SBOM".to_string(),
        })
    }
}
