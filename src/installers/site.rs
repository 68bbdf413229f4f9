//! User site-packages discovery for pip-installed tools

use crate::error::{InstallerError, InstallerResult};
use crate::exec::{Executable, Execution};
use crate::installers::Installer;
use std::path::Path;

/// Finds the `site-packages` directory of a `--user` install rooted at a layer
pub trait SitePackages {
    /// Raw answer of the interpreter, trailing newline removed
    fn execute(&self, layer_path: &Path) -> InstallerResult<String>;
}

/// Asks `python -m site --user-site` with `PYTHONUSERBASE` pointing at the layer
pub struct SitePackageProcess {
    python: Box<dyn Executable>,
}

impl SitePackageProcess {
    pub fn new(python: Box<dyn Executable>) -> Self {
        Self { python }
    }
}

impl SitePackages for SitePackageProcess {
    fn execute(&self, layer_path: &Path) -> InstallerResult<String> {
        let execution = Execution::new(["-m", "site", "--user-site"])
            .env("PYTHONUSERBASE", layer_path.to_string_lossy());
        let output = self.python.execute(&execution).map_err(|e| {
            crate::exec::relabel(e, "failed to locate site-packages")
        })?;
        Ok(output.stdout.trim_end_matches(['\n', '\r']).to_string())
    }
}

/// Site-packages path for `installer`'s layer, an error when the lookup came back empty.
pub fn site_packages_for(
    finder: &dyn SitePackages,
    installer: Installer,
    layer_path: &Path,
) -> InstallerResult<String> {
    let site = finder.execute(layer_path)?;
    if site.is_empty() {
        return Err(InstallerError::SitePackagesMissing {
            tool: installer.plan_name().to_string(),
        });
    }
    Ok(site)
}
