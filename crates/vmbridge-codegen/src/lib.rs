//! vmbridge Codegen - Swift wrapper generation from a view-model manifest.
//!
//! The generator reads a [`Manifest`](vmbridge_manifest::Manifest) and emits
//! one `ObservableObject` wrapper per entry. It is a batch step: read the
//! manifest, generate every unit in memory, then write them all.
//!
//! # Modules
//!
//! - [`writer`]: [`SourceWriter`](writer::SourceWriter), the indentation-aware
//!   line builder.
//! - [`rules`]: Which type names can be emitted and how names are escaped.
//! - [`swift`]: Per-entry rendering with entry-scoped failures.
//! - [`config`]: [`GeneratorConfig`](config::GeneratorConfig), loadable from
//!   TOML.
//! - [`output`]: Atomic writes and pruning of stale units.
//!
//! # Quick Start
//!
//! ```
//! use vmbridge_codegen::prelude::*;
//! use vmbridge_manifest::{ActionEntry, Manifest, StateEntry, ViewModelEntry};
//!
//! let manifest = Manifest::new([ViewModelEntry::new("com.a.CounterViewModel", "CounterViewModel")
//!     .with_state(StateEntry::new("count", "Int"))
//!     .with_action(ActionEntry::new("increment", vec![]))]);
//!
//! let generation = generate(&manifest, &GeneratorConfig::default());
//! assert!(generation.is_complete());
//! assert_eq!(generation.units[0].file_name, "ObservableCounterViewModel.swift");
//! ```

#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

use vmbridge_manifest::{store, Manifest, ManifestError};

pub mod config;
pub mod output;
pub mod rules;
pub mod swift;
pub mod writer;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by the generator.
///
/// [`GenerateError::UnsupportedType`] and [`GenerateError::InvalidName`] are
/// entry-scoped: they are collected in [`swift::Generation::failures`] and
/// other entries still generate. All other variants are fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// A state or parameter type has no generation rule.
    #[error("'{qualified_name}': {usage} has type '{type_name}' with no generation rule ({reason})")]
    UnsupportedType {
        /// The view-model whose unit was skipped.
        qualified_name: String,
        /// The offending type name as written in the manifest.
        type_name: String,
        /// Where the type was used.
        usage: String,
        #[source]
        reason: rules::Unsupported,
    },

    /// A name that must be a single identifier is not one.
    #[error("'{qualified_name}': {usage} '{name}' is not a valid identifier")]
    InvalidName {
        /// The view-model whose unit was skipped.
        qualified_name: String,
        name: String,
        usage: String,
    },

    /// The manifest could not be read or trusted.
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    /// The configuration file is not valid.
    #[error("invalid generator config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Reading or writing a file failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Outcome of [`run`].
#[derive(Debug)]
pub struct RunSummary {
    pub report: output::OutputReport,
    pub failures: Vec<GenerateError>,
    /// BLAKE3 digest of the canonical encoding of the manifest that was read.
    pub manifest_digest: String,
}

/// Read the manifest at `manifest_path`, generate every unit, and write them
/// to `out_dir`.
///
/// Entry-scoped failures are returned in [`RunSummary::failures`]; a manifest
/// that cannot be read or an output that cannot be written is an error.
pub fn run(
    manifest_path: &Path,
    out_dir: &Path,
    config: &config::GeneratorConfig,
) -> Result<RunSummary, GenerateError> {
    let manifest: Manifest = store::read_manifest(manifest_path)?;
    let manifest_digest = manifest.digest()?;
    let generation = swift::generate(&manifest, config);
    let report = output::write_units(out_dir, &generation.units, &config.header)?;
    Ok(RunSummary {
        report,
        failures: generation.failures,
        manifest_digest,
    })
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::config::GeneratorConfig;
    pub use crate::output::{write_units, OutputReport};
    pub use crate::rules::{check_type, Unsupported};
    pub use crate::swift::{generate, render_entry, GeneratedUnit, Generation};
    pub use crate::writer::SourceWriter;
    pub use crate::{run, GenerateError, RunSummary};
}
