//! Artifact unpacking
//!
//! Supports:
//! - `.tar.gz` / `.tgz`
//! - `.tar`
//!
//! Anything else is stored as a single file.

use crate::error::{InstallerError, InstallerResult};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};
use tracing::debug;

/// How a downloaded artifact is laid out on disk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    TarGz,
    Tar,
    File,
}

impl ArtifactKind {
    /// Classify by the URI's path, ignoring any query or fragment.
    pub fn from_uri(uri: &str) -> Self {
        let path = uri.split(['?', '#']).next().unwrap_or(uri);
        if path.ends_with(".tar.gz") || path.ends_with(".tgz") {
            Self::TarGz
        } else if path.ends_with(".tar") {
            Self::Tar
        } else {
            Self::File
        }
    }
}

/// Unpack a tar archive at `archive_path` into `dest`, dropping the first
/// `strip_components` path components of every entry.
pub fn unpack(
    kind: ArtifactKind,
    archive_path: &Path,
    dest: &Path,
    strip_components: usize,
) -> InstallerResult<()> {
    let file = File::open(archive_path)
        .map_err(|e| InstallerError::io(format!("opening {}", archive_path.display()), e))?;

    fs::create_dir_all(dest)
        .map_err(|e| InstallerError::io(format!("creating {}", dest.display()), e))?;

    match kind {
        ArtifactKind::TarGz => {
            unpack_tar(GzDecoder::new(BufReader::new(file)), dest, strip_components)
        }
        ArtifactKind::Tar => unpack_tar(BufReader::new(file), dest, strip_components),
        ArtifactKind::File => Err(InstallerError::UnsupportedArchive(
            archive_path.display().to_string(),
        )),
    }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, strip_components: usize) -> InstallerResult<()> {
    let mut archive = Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| InstallerError::io("reading archive entries", e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| InstallerError::io("reading archive entry", e))?;
        let path = entry
            .path()
            .map_err(|e| InstallerError::io("reading archive entry path", e))?
            .into_owned();

        let Some(stripped) = strip(&path, strip_components) else {
            continue;
        };

        let dest_path = dest.join(&stripped);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| InstallerError::io(format!("creating {}", parent.display()), e))?;
        }

        match entry.header().entry_type() {
            EntryType::Symlink => {
                let target = link_target(&entry)?;
                let base = stripped.parent().unwrap_or(Path::new(""));
                if !stays_within(base, &target) {
                    debug!("Skipping symlink {} -> {}", path.display(), target.display());
                    continue;
                }
            }
            EntryType::Link => {
                // Hard link targets name another entry of the same archive
                let target = link_target(&entry)?;
                let Some(source) = strip(&target, strip_components)
                    .filter(|source| stays_within(Path::new(""), source))
                else {
                    debug!("Skipping hard link {} -> {}", path.display(), target.display());
                    continue;
                };
                let source = dest.join(source);
                fs::hard_link(&source, &dest_path).map_err(|e| {
                    InstallerError::io(format!("linking {}", dest_path.display()), e)
                })?;
                continue;
            }
            _ => {}
        }

        entry
            .unpack(&dest_path)
            .map_err(|e| InstallerError::io(format!("unpacking {}", dest_path.display()), e))?;
    }

    debug!("Unpacked to {}", dest.display());
    Ok(())
}

/// Drop `..`, `.` and root components, then the first `strip_components`.
fn strip(path: &Path, strip_components: usize) -> Option<PathBuf> {
    let stripped: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(strip_components)
        .collect();
    (!stripped.as_os_str().is_empty()).then_some(stripped)
}

fn link_target<R: Read>(entry: &tar::Entry<'_, R>) -> InstallerResult<PathBuf> {
    entry
        .link_name()
        .map_err(|e| InstallerError::io("reading archive link target", e))?
        .map(|target| target.into_owned())
        .ok_or_else(|| {
            InstallerError::io(
                "reading archive link target",
                std::io::Error::new(std::io::ErrorKind::InvalidData, "link without a target"),
            )
        })
}

/// Whether `target`, taken relative to `base` (itself relative to the
/// unpack root), resolves to a path inside the unpack root.
fn stays_within(base: &Path, target: &Path) -> bool {
    let mut depth = base.components().count();
    for component in target.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(parent) => depth = parent,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}
