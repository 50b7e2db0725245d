//! Generator configuration, loadable from TOML.
//!
//! Every key is optional:
//!
//! ```toml
//! wrapper_prefix = "Observable"
//! imports = ["Combine", "SharedSDK"]
//! subscription_type = "Closeable"
//! subscribe_method = "watch"
//! close_method = "close"
//! header = "// Generated by vmbridge. Do not edit."
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::GenerateError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Prepended to the view-model's simple name to form the wrapper name.
    pub wrapper_prefix: String,
    /// Modules imported at the top of every unit, in order.
    pub imports: Vec<String>,
    /// Type of the handle returned by `subscribe_method`.
    pub subscription_type: String,
    /// Method on the state stream that registers a value callback.
    pub subscribe_method: String,
    /// Method on the subscription handle that stops delivery.
    pub close_method: String,
    /// First line of every generated unit. Also marks files as prunable.
    pub header: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            wrapper_prefix: "Observable".to_owned(),
            imports: vec!["Combine".to_owned(), "SharedSDK".to_owned()],
            subscription_type: "Closeable".to_owned(),
            subscribe_method: "watch".to_owned(),
            close_method: "close".to_owned(),
            header: "// Generated by vmbridge. Do not edit.".to_owned(),
        }
    }
}

impl GeneratorConfig {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load a TOML config file.
    pub fn load(path: &Path) -> Result<Self, GenerateError> {
        let text = fs::read_to_string(path).map_err(|source| GenerateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| GenerateError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "generator config loaded");
        Ok(config)
    }
}
