//! Artifact transport: `file://`, http(s) and platform dependency mappings

use crate::checksum::Checksum;
use crate::error::{InstallerError, InstallerResult};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEPENDENCY_MAPPING_TYPE: &str = "dependency-mapping";

/// Look up an operator-provided replacement URI for a dependency.
///
/// Bindings live in `<platform>/bindings/<name>/`; a binding whose `type`
/// file reads `dependency-mapping` maps a dependency checksum hash (file
/// name) to a URI (file content).
pub fn mapped_uri(platform_path: &Path, checksum: &Checksum) -> InstallerResult<Option<String>> {
    if checksum.is_empty() {
        return Ok(None);
    }

    let bindings = platform_path.join("bindings");
    let entries = match fs::read_dir(&bindings) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(InstallerError::io(
                format!("listing bindings in {}", bindings.display()),
                e,
            ))
        }
    };

    for entry in entries {
        let entry =
            entry.map_err(|e| InstallerError::io(format!("listing {}", bindings.display()), e))?;
        let binding = entry.path();

        let binding_type = match fs::read_to_string(binding.join("type")) {
            Ok(content) => content,
            Err(_) => continue,
        };
        if binding_type.trim() != DEPENDENCY_MAPPING_TYPE {
            continue;
        }

        let mapping = binding.join(checksum.hash());
        match fs::read_to_string(&mapping) {
            Ok(uri) => {
                debug!("Dependency mapping {} -> {}", checksum, uri.trim());
                return Ok(Some(uri.trim().to_string()));
            }
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(InstallerError::io(
                    format!("reading dependency mapping {}", mapping.display()),
                    e,
                ))
            }
        }
    }

    Ok(None)
}

/// Stream `uri` into `dest`, returning the sha256 of the bytes written.
pub fn fetch(uri: &str, dest: &Path) -> InstallerResult<Checksum> {
    info!("Fetching {}", uri);

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| InstallerError::io(format!("creating {}", parent.display()), e))?;
    }

    if uri.starts_with("http://") || uri.starts_with("https://") {
        let mut response = ureq::get(uri).call().map_err(|e| InstallerError::Download {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        let mut reader = response.body_mut().as_reader();
        copy_hashed(uri, &mut reader, dest)
    } else {
        let path = local_path(uri);
        let mut file = File::open(&path).map_err(|e| InstallerError::Download {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        copy_hashed(uri, &mut file, dest)
    }
}

fn local_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix("file://").unwrap_or(uri))
}

fn copy_hashed<R: Read>(uri: &str, reader: &mut R, dest: &Path) -> InstallerResult<Checksum> {
    let mut file = File::create(dest)
        .map_err(|e| InstallerError::io(format!("creating {}", dest.display()), e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = reader.read(&mut buffer).map_err(|e| InstallerError::Download {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
        file.write_all(&buffer[..read])
            .map_err(|e| InstallerError::io(format!("writing {}", dest.display()), e))?;
    }

    Ok(Checksum::sha256(hex::encode(hasher.finalize())))
}
