//! Shared mechanics for tools shipped as prebuilt binary archives (uv, pixi)

use crate::error::{InstallerError, InstallerResult};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Copies an unpacked release into `<layer>/bin`
pub trait BinaryInstall {
    fn execute(&self, layer_path: &Path, source_path: &Path, arch: &str) -> InstallerResult<()>;
}

/// Catalog architecture name to the target triple prefix used by release archives.
pub fn translate_arch(arch: &str) -> InstallerResult<&'static str> {
    match arch {
        "amd64" => Ok("x86_64"),
        "arm64" => Ok("aarch64"),
        other => Err(InstallerError::UnsupportedArch(other.to_string())),
    }
}

/// Recursively copy the contents of `source` into `destination`.
pub fn copy_tree(source: &Path, destination: &Path) -> InstallerResult<()> {
    fs::create_dir_all(destination)
        .map_err(|e| InstallerError::io(format!("creating {}", destination.display()), e))?;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let context = format!("reading {}", source.display());
            match e.into_io_error() {
                Some(io) => InstallerError::io(context, io),
                None => InstallerError::io(context, std::io::Error::other("filesystem loop")),
            }
        })?;

        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .map_err(|e| InstallerError::io(format!("creating {}", target.display()), e))?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| {
                InstallerError::io(
                    format!("copying {} to {}", entry.path().display(), target.display()),
                    e,
                )
            })?;
        }
    }
    Ok(())
}
