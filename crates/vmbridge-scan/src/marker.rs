//! The marker vocabulary.
//!
//! Markers are plain source-level tags with no behavior. They are the only
//! coupling point between application code and the bridge generator:
//!
//! | Marker               | Target    | Meaning                                   |
//! |----------------------|-----------|-------------------------------------------|
//! | `SwiftViewModel`     | type      | this type is a bridgeable view-model      |
//! | `SwiftUiState`       | property  | this is the single observable state surface |
//! | `SwiftUiAction`      | function  | this is a dispatchable action             |
//!
//! A host matches an annotation against a marker by either its short name or
//! its fully qualified name.

use serde::{Deserialize, Serialize};

/// Package that declares the marker annotations.
pub const MARKER_PACKAGE: &str = "com.mnikonov.observablevm.swiftvm";

/// One of the three declarative markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Marker {
    /// Type-level: the type is a bridgeable view-model.
    ViewModel,
    /// Property-level: the observable state surface.
    UiState,
    /// Function-level: a dispatchable action.
    UiAction,
}

impl Marker {
    /// All markers, in vocabulary order.
    pub const ALL: [Marker; 3] = [Marker::ViewModel, Marker::UiState, Marker::UiAction];

    /// The annotation's short name.
    pub fn short_name(self) -> &'static str {
        match self {
            Marker::ViewModel => "SwiftViewModel",
            Marker::UiState => "SwiftUiState",
            Marker::UiAction => "SwiftUiAction",
        }
    }

    /// The annotation's fully qualified name.
    pub fn qualified_name(self) -> String {
        format!("{MARKER_PACKAGE}.{}", self.short_name())
    }

    /// Whether an annotation name as written in source refers to this marker.
    pub fn matches(self, annotation: &str) -> bool {
        let annotation = annotation.trim_start_matches('@');
        match annotation.strip_prefix(MARKER_PACKAGE) {
            Some(rest) => rest.strip_prefix('.') == Some(self.short_name()),
            None => annotation == self.short_name(),
        }
    }
}
