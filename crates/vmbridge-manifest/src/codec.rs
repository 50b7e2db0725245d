//! JSON encoding and decoding of the manifest.
//!
//! Encoding is deterministic: fields are written in declaration order, with
//! four-space indentation and a trailing newline, and default-valued fields
//! (`"state": null`, `"actions": []`, `"params": []`) are always present so
//! that a plain text diff between two manifests only shows real changes.
//!
//! Decoding is tolerant in the other direction: unknown fields are ignored and
//! optional fields fall back to their defaults, and entries are put back in
//! qualified-name order. A version newer than
//! [`MANIFEST_VERSION`] or a repeated qualified name is rejected.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::ser::PrettyFormatter;

use crate::manifest::{Manifest, MANIFEST_VERSION};
use crate::ManifestError;

/// Encode a manifest into its canonical text form.
pub fn to_json(manifest: &Manifest) -> Result<String, ManifestError> {
    let mut buf = Vec::with_capacity(256 + manifest.len() * 256);
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    manifest
        .serialize(&mut serializer)
        .map_err(ManifestError::Encode)?;
    buf.push(b'\n');

    String::from_utf8(buf).map_err(|e| ManifestError::Encode(serde::ser::Error::custom(e)))
}

/// Decode and validate manifest text.
pub fn from_json(text: &str) -> Result<Manifest, ManifestError> {
    let mut manifest: Manifest = serde_json::from_str(text).map_err(ManifestError::Parse)?;

    if manifest.version == 0 || manifest.version > MANIFEST_VERSION {
        return Err(ManifestError::UnsupportedVersion {
            found: manifest.version,
            supported: MANIFEST_VERSION,
        });
    }

    let mut seen = HashSet::with_capacity(manifest.len());
    for entry in &manifest.view_models {
        if !seen.insert(entry.qualified_name.as_str()) {
            return Err(ManifestError::DuplicateEntry {
                qualified_name: entry.qualified_name.clone(),
            });
        }
    }
    manifest
        .view_models
        .sort_by(|a, b| a.qualified_name.cmp(&b.qualified_name));

    Ok(manifest)
}

/// BLAKE3 hex digest (64 lowercase hex chars) of manifest text.
pub fn digest(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

impl Manifest {
    /// BLAKE3 hex digest of this manifest's canonical encoding.
    pub fn digest(&self) -> Result<String, ManifestError> {
        to_json(self).map(|text| digest(&text))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
