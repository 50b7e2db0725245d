//! Multi-pass resolution driver with deferral and a single manifest write.
//!
//! The host calls [`ResolutionDriver::process`] once per compilation round.
//! Each pass:
//!
//! 1. Scans every view-model-marked type visible in the round.
//! 2. Defers types whose referenced types are not yet resolvable. A type
//!    deferred by an earlier pass stays deferred until a pass resolves or
//!    rejects it, even if the round no longer shows it.
//! 3. Builds the rest, buffering successes by qualified name. A later pass
//!    overwrites an earlier entry, and a later failure drops it and records a
//!    diagnostic.
//! 4. When nothing is deferred, sorts the buffer and hands the manifest to the
//!    [`ManifestSink`]. The driver is then done and later passes are no-ops.
//!
//! If the same non-empty set of types is deferred in two consecutive passes,
//! resolution has stalled and the driver fails with
//! [`DriverError::StalledResolution`].
//!
//! # Example
//!
//! ```
//! use vmbridge_scan::prelude::*;
//!
//! let mut driver = ResolutionDriver::new(ScanConfig::default(), MemorySink::default());
//!
//! // Round 1: nothing marked yet.
//! let outcome = driver.process(&SymbolTable::new()).unwrap();
//! assert_eq!(outcome, PassOutcome::Written { pass: 1, entries: 0 });
//!
//! // Later rounds never write again.
//! assert_eq!(driver.process(&SymbolTable::new()).unwrap(), PassOutcome::AlreadyDone);
//! assert_eq!(driver.sink().written.len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use vmbridge_manifest::{store, Manifest, ManifestError, ViewModelEntry};

use crate::builder::{EntryBuilder, ScanConfig};
use crate::scanner::scan;
use crate::symbol::{SymbolUniverse, TypeSymbol};
use crate::ScanError;

// ---------------------------------------------------------------------------
// Sinks
// ---------------------------------------------------------------------------

/// Destination of the aggregated manifest.
pub trait ManifestSink {
    fn write(&mut self, manifest: &Manifest) -> Result<(), ManifestError>;
}

/// Writes the manifest atomically to a file.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    digest: Option<String>,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            digest: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// BLAKE3 digest of the written manifest, once written.
    pub fn digest(&self) -> Option<&str> {
        self.digest.as_deref()
    }
}

impl ManifestSink for FileSink {
    fn write(&mut self, manifest: &Manifest) -> Result<(), ManifestError> {
        self.digest = Some(store::write_manifest(&self.path, manifest)?);
        Ok(())
    }
}

/// Collects written manifests in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub written: Vec<Manifest>,
}

impl ManifestSink for MemorySink {
    fn write(&mut self, manifest: &Manifest) -> Result<(), ManifestError> {
        self.written.push(manifest.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors and outcomes
// ---------------------------------------------------------------------------

/// Fatal driver failures. Per-entry problems are [`ScanError`] diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The same symbols stayed deferred across two consecutive passes.
    #[error(
        "resolution stalled at pass {pass}: still deferred: {}",
        symbols.join(", ")
    )]
    StalledResolution { pass: u32, symbols: Vec<String> },

    /// The manifest sink failed.
    #[error("failed to write manifest")]
    Sink(#[from] ManifestError),
}

/// Result of one pure resolution step.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Advance {
    pub resolved: Vec<ViewModelEntry>,
    pub deferred: Vec<TypeSymbol>,
    pub diagnostics: Vec<ScanError>,
}

/// What a call to [`ResolutionDriver::process`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Some symbols were deferred; nothing was written.
    Deferred { pass: u32, count: usize },
    /// The manifest was written with `entries` view-models.
    Written { pass: u32, entries: usize },
    /// The manifest was already written by an earlier pass.
    AlreadyDone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DriverState {
    Scanning,
    Done,
    Stalled { pass: u32, symbols: Vec<String> },
}

// ---------------------------------------------------------------------------
// ResolutionDriver
// ---------------------------------------------------------------------------

/// Owns the cross-pass entry buffer, the deferred set, and the sink.
pub struct ResolutionDriver<S: ManifestSink> {
    config: ScanConfig,
    sink: S,
    state: DriverState,
    pass: u32,
    entries: BTreeMap<String, ViewModelEntry>,
    deferred: BTreeMap<String, TypeSymbol>,
    diagnostics: Vec<ScanError>,
}

impl<S: ManifestSink> ResolutionDriver<S> {
    pub fn new(config: ScanConfig, sink: S) -> Self {
        Self {
            config,
            sink,
            state: DriverState::Scanning,
            pass: 0,
            entries: BTreeMap::new(),
            deferred: BTreeMap::new(),
            diagnostics: Vec::new(),
        }
    }

    /// One resolution step over `universe`. Touches no driver state.
    pub fn advance<U: SymbolUniverse + ?Sized>(&self, universe: &U) -> Advance {
        let builder = EntryBuilder::new(universe, &self.config);
        let mut step = Advance::default();

        for scanned in scan(universe) {
            if !universe.is_ready(&scanned.symbol) {
                step.deferred.push(scanned.symbol);
                continue;
            }
            match builder.build(&scanned) {
                Ok(entry) => step.resolved.push(entry),
                Err(e) => step.diagnostics.push(e),
            }
        }
        step
    }

    /// Run one pass and write the manifest if nothing is left deferred.
    pub fn process<U: SymbolUniverse + ?Sized>(
        &mut self,
        universe: &U,
    ) -> Result<PassOutcome, DriverError> {
        match &self.state {
            DriverState::Done => return Ok(PassOutcome::AlreadyDone),
            DriverState::Stalled { pass, symbols } => {
                return Err(DriverError::StalledResolution {
                    pass: *pass,
                    symbols: symbols.clone(),
                })
            }
            DriverState::Scanning => {}
        }

        self.pass += 1;
        let step = self.advance(universe);

        let mut settled = BTreeSet::new();
        for diagnostic in step.diagnostics {
            tracing::error!(
                pass = self.pass,
                symbol = diagnostic.symbol(),
                rule = diagnostic.code(),
                "{diagnostic}"
            );
            settled.insert(diagnostic.symbol().to_owned());
            if self.entries.remove(diagnostic.symbol()).is_some() {
                tracing::warn!(
                    pass = self.pass,
                    symbol = diagnostic.symbol(),
                    "buffered entry dropped"
                );
            }
            if !self.diagnostics.contains(&diagnostic) {
                self.diagnostics.push(diagnostic);
            }
        }
        for entry in step.resolved {
            settled.insert(entry.qualified_name.clone());
            self.entries.insert(entry.qualified_name.clone(), entry);
        }

        // Earlier deferrals the round neither resolved nor rejected carry over.
        let previous: Vec<String> = self.deferred.keys().cloned().collect();
        let mut deferred: BTreeMap<String, TypeSymbol> = std::mem::take(&mut self.deferred)
            .into_iter()
            .filter(|(name, _)| !settled.contains(name))
            .collect();
        let carried = deferred.len();
        for symbol in step.deferred {
            deferred.insert(symbol.display_name().to_owned(), symbol);
        }
        let names: Vec<String> = deferred.keys().cloned().collect();
        self.deferred = deferred;

        if names.is_empty() {
            let entries = self.write()?;
            return Ok(PassOutcome::Written {
                pass: self.pass,
                entries,
            });
        }
        if names == previous {
            tracing::error!(pass = self.pass, deferred = names.len(), "resolution stalled");
            self.state = DriverState::Stalled {
                pass: self.pass,
                symbols: names.clone(),
            };
            return Err(DriverError::StalledResolution {
                pass: self.pass,
                symbols: names,
            });
        }
        tracing::debug!(
            pass = self.pass,
            deferred = names.len(),
            carried,
            "symbols deferred"
        );
        Ok(PassOutcome::Deferred {
            pass: self.pass,
            count: names.len(),
        })
    }

    /// End-of-processing hook.
    ///
    /// Fails if symbols are still deferred. Writes the (possibly empty)
    /// manifest if no pass has written it yet.
    pub fn finish(&mut self) -> Result<(), DriverError> {
        match &self.state {
            DriverState::Done => Ok(()),
            DriverState::Stalled { pass, symbols } => Err(DriverError::StalledResolution {
                pass: *pass,
                symbols: symbols.clone(),
            }),
            DriverState::Scanning if !self.deferred.is_empty() => {
                let symbols: Vec<String> = self.deferred.keys().cloned().collect();
                self.state = DriverState::Stalled {
                    pass: self.pass,
                    symbols: symbols.clone(),
                };
                Err(DriverError::StalledResolution {
                    pass: self.pass,
                    symbols,
                })
            }
            DriverState::Scanning => self.write().map(drop),
        }
    }

    fn write(&mut self) -> Result<usize, DriverError> {
        let manifest = Manifest::new(self.entries.values().cloned());
        self.sink.write(&manifest)?;
        self.state = DriverState::Done;
        tracing::info!(
            pass = self.pass,
            entries = manifest.len(),
            diagnostics = self.diagnostics.len(),
            "resolution complete"
        );
        Ok(manifest.len())
    }

    pub fn is_done(&self) -> bool {
        self.state == DriverState::Done
    }

    /// Number of passes processed so far.
    pub fn pass_count(&self) -> u32 {
        self.pass
    }

    /// Every distinct diagnostic reported during the run, in first-seen order.
    pub fn diagnostics(&self) -> &[ScanError] {
        &self.diagnostics
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
