//! vmbridge Scan - discovery, validation, and multi-round resolution of
//! bridgeable view-models.
//!
//! This crate is the front-end of the bridge generator. It turns the symbols
//! of a shared codebase into a [`Manifest`](vmbridge_manifest::Manifest):
//!
//! 1. The [`scanner`] finds types carrying the view-model marker, plus their
//!    state- and action-marked members.
//! 2. The [`builder`] validates each finding and produces a
//!    [`ViewModelEntry`](vmbridge_manifest::ViewModelEntry), or a
//!    [`ScanError`] diagnostic that drops only that entry.
//! 3. The [`driver`] runs passes until no symbol is deferred, then writes the
//!    manifest exactly once.
//!
//! Everything is written against the [`SymbolUniverse`](symbol::SymbolUniverse)
//! trait; [`table::SymbolTable`] is the bundled in-memory host.
//!
//! # Quick Start
//!
//! ```
//! use vmbridge_scan::prelude::*;
//!
//! let table = SymbolTable::new().with(
//!     Declaration::class("com.example.CounterViewModel")
//!         .marked(Marker::ViewModel)
//!         .member(
//!             MemberSymbol::property(
//!                 "count",
//!                 "kotlinx.coroutines.flow.StateFlow<Int>".parse().unwrap(),
//!             ),
//!             &[Marker::UiState],
//!         )
//!         .member(MemberSymbol::function("increment", vec![]), &[Marker::UiAction]),
//! );
//!
//! let mut driver = ResolutionDriver::new(ScanConfig::default(), MemorySink::default());
//! driver.process(&table).unwrap();
//!
//! let manifest = &driver.sink().written[0];
//! assert_eq!(manifest.view_models[0].state.as_ref().unwrap().type_simple_name, "Int");
//! ```

#![deny(unsafe_code)]

pub mod builder;
pub mod driver;
pub mod marker;
pub mod scanner;
pub mod symbol;
pub mod table;

use symbol::SymbolKind;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// A per-entry validation failure.
///
/// These are reported as diagnostics against the offending symbol. The entry
/// is dropped and the run continues with the remaining symbols.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// The view-model marker was placed on something that is not a class.
    #[error("'{symbol}': the view-model marker can only target classes, found a {kind}")]
    InvalidMarkerTarget { symbol: String, kind: SymbolKind },

    /// The marked type has no fully qualified name (local or anonymous).
    #[error("'{symbol}': cannot resolve the qualified name of the view-model")]
    UnresolvableSymbol { symbol: String },

    /// More than one member carries the state marker.
    #[error(
        "'{symbol}': multiple state properties ({}); annotate exactly one",
        properties.join(", ")
    )]
    MultipleStateMarkers {
        symbol: String,
        properties: Vec<String>,
    },

    /// The state member is not a single-argument observable stream.
    #[error("'{symbol}': state property '{property}' must be a StateFlow<T>, found {found}")]
    InvalidStateShape {
        symbol: String,
        property: String,
        found: String,
    },

    /// The state stream's value type is missing or unresolvable.
    #[error("'{symbol}': state property '{property}' must be generic (StateFlow<T>) with a resolvable T")]
    MissingStateTypeArgument { symbol: String, property: String },
}

impl ScanError {
    /// The symbol the diagnostic is reported against.
    pub fn symbol(&self) -> &str {
        match self {
            ScanError::InvalidMarkerTarget { symbol, .. }
            | ScanError::UnresolvableSymbol { symbol }
            | ScanError::MultipleStateMarkers { symbol, .. }
            | ScanError::InvalidStateShape { symbol, .. }
            | ScanError::MissingStateTypeArgument { symbol, .. } => symbol,
        }
    }

    /// Stable rule name, suitable for filtering and for tests.
    pub fn code(&self) -> &'static str {
        match self {
            ScanError::InvalidMarkerTarget { .. } => "InvalidMarkerTarget",
            ScanError::UnresolvableSymbol { .. } => "UnresolvableSymbol",
            ScanError::MultipleStateMarkers { .. } => "MultipleStateMarkers",
            ScanError::InvalidStateShape { .. } => "InvalidStateShape",
            ScanError::MissingStateTypeArgument { .. } => "MissingStateTypeArgument",
        }
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::builder::{EntryBuilder, ScanConfig};
    pub use crate::driver::{
        Advance, DriverError, FileSink, ManifestSink, MemorySink, PassOutcome, ResolutionDriver,
    };
    pub use crate::marker::Marker;
    pub use crate::scanner::{scan, scan_type, ScannedType};
    pub use crate::symbol::{
        MemberKind, MemberSymbol, ParamSymbol, ResolvedType, SymbolId, SymbolKind, SymbolUniverse,
        TypeArgument, TypeSymbol, TypeUse,
    };
    pub use crate::table::{Declaration, SymbolTable};
    pub use crate::ScanError;
}
