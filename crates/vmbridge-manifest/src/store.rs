//! Manifest file persistence.
//!
//! Writes go through a temp file in the destination directory followed by a
//! rename, so a reader never observes a truncated manifest even if the writer
//! crashes mid-write. The same primitive is reused for generated sources.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::codec;
use crate::manifest::Manifest;
use crate::ManifestError;

/// Atomically replace `path` with `bytes`.
///
/// Missing parent directories are created. The temp file lives next to the
/// destination so the final rename never crosses a filesystem boundary.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

/// Encode `manifest` and atomically write it to `path`.
///
/// Returns the BLAKE3 digest of the written text.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<String, ManifestError> {
    let text = codec::to_json(manifest)?;
    write_atomic(path, text.as_bytes()).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let digest = codec::digest(&text);
    tracing::info!(
        path = %path.display(),
        view_models = manifest.len(),
        digest = %digest,
        "manifest written"
    );
    Ok(digest)
}

/// Read and validate the manifest at `path`.
pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let manifest = codec::from_json(&text)?;
    tracing::debug!(
        path = %path.display(),
        version = manifest.version,
        view_models = manifest.len(),
        "manifest loaded"
    );
    Ok(manifest)
}
