//! Manifest schema.
//!
//! The field names and nesting here are a compatibility contract: the code
//! generator may run from a different build than the scanner, so every field
//! added later must be optional on read. The `version` field exists so that a
//! breaking change can be detected instead of misread.
//!
//! # Ordering
//!
//! A [`Manifest`] always holds its entries sorted ascending by qualified name
//! with no duplicates. [`Manifest::new`] enforces this, which makes the
//! serialized form independent of the order in which view-models were
//! discovered.
//!
//! # Example
//!
//! ```
//! use vmbridge_manifest::{Manifest, ViewModelEntry};
//!
//! let manifest = Manifest::new(vec![
//!     ViewModelEntry::new("com.example.b.ProfileViewModel", "ProfileViewModel"),
//!     ViewModelEntry::new("com.example.a.LoginViewModel", "LoginViewModel"),
//! ]);
//!
//! assert_eq!(manifest.view_models[0].simple_name, "LoginViewModel");
//! assert!(manifest.entry("com.example.b.ProfileViewModel").is_some());
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The schema version written by this build.
pub const MANIFEST_VERSION: u32 = 1;

fn default_version() -> u32 {
    MANIFEST_VERSION
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The top-level manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version. Absent on read means version 1.
    #[serde(default = "default_version")]
    pub version: u32,
    /// All bridgeable view-models, sorted by qualified name.
    #[serde(default)]
    pub view_models: Vec<ViewModelEntry>,
}

impl Manifest {
    /// Build a manifest at the current version from entries in any order.
    ///
    /// Entries are sorted by qualified name. When two entries share a
    /// qualified name the one that comes later in `entries` wins, mirroring
    /// the overwrite rule of the scanning buffer.
    pub fn new(entries: impl IntoIterator<Item = ViewModelEntry>) -> Self {
        let mut by_name = BTreeMap::new();
        for entry in entries {
            by_name.insert(entry.qualified_name.clone(), entry);
        }
        Self {
            version: MANIFEST_VERSION,
            view_models: by_name.into_values().collect(),
        }
    }

    /// Look up an entry by qualified name.
    pub fn entry(&self, qualified_name: &str) -> Option<&ViewModelEntry> {
        self.view_models
            .binary_search_by(|e| e.qualified_name.as_str().cmp(qualified_name))
            .ok()
            .map(|idx| &self.view_models[idx])
    }

    /// Number of view-model entries.
    pub fn len(&self) -> usize {
        self.view_models.len()
    }

    /// Returns `true` if the manifest lists no view-models.
    pub fn is_empty(&self) -> bool {
        self.view_models.is_empty()
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

// ---------------------------------------------------------------------------
// ViewModelEntry
// ---------------------------------------------------------------------------

/// One bridgeable view-model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModelEntry {
    /// Globally unique, fully qualified name of the marked type.
    #[serde(rename = "className")]
    pub qualified_name: String,
    /// Short, identifier-safe name used for generated type and file names.
    pub simple_name: String,
    /// The single observable state surface, if the view-model has one.
    #[serde(default)]
    pub state: Option<StateEntry>,
    /// Dispatchable actions in declaration order.
    #[serde(default)]
    pub actions: Vec<ActionEntry>,
}

impl ViewModelEntry {
    /// An entry with no state and no actions.
    pub fn new(qualified_name: impl Into<String>, simple_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            simple_name: simple_name.into(),
            state: None,
            actions: Vec::new(),
        }
    }

    /// Builder-style setter for the state surface.
    pub fn with_state(mut self, state: StateEntry) -> Self {
        self.state = Some(state);
        self
    }

    /// Builder-style append of one action.
    pub fn with_action(mut self, action: ActionEntry) -> Self {
        self.actions.push(action);
        self
    }
}

// ---------------------------------------------------------------------------
// StateEntry
// ---------------------------------------------------------------------------

/// The observable state surface of a view-model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateEntry {
    /// Name of the property holding the observable stream.
    pub property: String,
    /// Simple name of the value type carried by the stream.
    pub type_simple_name: String,
}

impl StateEntry {
    pub fn new(property: impl Into<String>, type_simple_name: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            type_simple_name: type_simple_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionEntry
// ---------------------------------------------------------------------------

/// A dispatchable action function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEntry {
    /// Name of the dispatch function.
    pub function: String,
    /// Parameters in declaration order. The order becomes the argument order
    /// at generated call sites.
    #[serde(default)]
    pub params: Vec<ActionParamEntry>,
}

impl ActionEntry {
    pub fn new(function: impl Into<String>, params: Vec<ActionParamEntry>) -> Self {
        Self {
            function: function.into(),
            params,
        }
    }
}

/// One parameter of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionParamEntry {
    /// Declared parameter name, or `p<index>` when the source had none.
    pub param_label: String,
    /// Simple name of the parameter's declared type.
    pub type_simple_name: String,
}

impl ActionParamEntry {
    pub fn new(param_label: impl Into<String>, type_simple_name: impl Into<String>) -> Self {
        Self {
            param_label: param_label.into(),
            type_simple_name: type_simple_name.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
