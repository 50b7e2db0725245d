//! vmbridge Manifest - the versioned contract between symbol scanning and
//! wrapper generation.
//!
//! The manifest is the only artifact that crosses from the scanning front-end
//! to the code generator. It lists every bridgeable view-model with its
//! observable state surface and its dispatchable actions.
//!
//! # Modules
//!
//! - [`manifest`]: Schema types ([`Manifest`], [`ViewModelEntry`],
//!   [`StateEntry`], [`ActionEntry`], [`ActionParamEntry`]) and the sorted,
//!   key-unique construction rule.
//! - [`codec`]: Deterministic JSON encoding, tolerant decoding with version
//!   checks, and BLAKE3 content digests.
//! - [`store`]: Atomic (temp file + rename) writes and validated reads.

#![deny(unsafe_code)]

use std::path::PathBuf;

pub mod codec;
pub mod manifest;
pub mod store;

pub use manifest::{
    ActionEntry, ActionParamEntry, Manifest, StateEntry, ViewModelEntry, MANIFEST_VERSION,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while encoding, decoding, or persisting a manifest.
///
/// Every variant is fatal for the consumer that hit it: a manifest that cannot
/// be read or trusted must never be partially used.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// Reading or writing the manifest file failed.
    #[error("failed to access manifest at {}: {source}", path.display())]
    Io {
        /// The file that could not be accessed.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest text is not valid JSON or does not match the schema.
    #[error("malformed manifest: {0}")]
    Parse(#[source] serde_json::Error),

    /// The manifest could not be encoded.
    #[error("failed to encode manifest: {0}")]
    Encode(#[source] serde_json::Error),

    /// The manifest declares a schema version this build cannot read.
    #[error("manifest version {found} is not supported (supported: 1..={supported})")]
    UnsupportedVersion {
        /// The version found in the file.
        found: u32,
        /// The newest version this build understands.
        supported: u32,
    },

    /// Two entries share the same qualified name.
    #[error("manifest lists view-model '{qualified_name}' more than once")]
    DuplicateEntry {
        /// The repeated qualified name.
        qualified_name: String,
    },
}
