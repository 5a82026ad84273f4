//! URL catalog and free-text configuration parsing
//!
//! A catalog is a JSON file holding the default context count, the default
//! URL list and named presets:
//!
//! ```json
//! {
//!   "defaultContextCount": 5,
//!   "urls": ["https://cdn.example/a.js"],
//!   "testSets": {
//!     "small": { "name": "Small bundle", "urls": ["https://cdn.example/a.js"] }
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tokio::fs;

use shared::{process_debug, ProcessId, TestConfiguration};

use crate::error::{OrchestratorError, OrchestratorResult};

/// A named list of resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSet {
    pub name: String,
    pub urls: Vec<String>,
}

/// Presets and defaults a run configuration is built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlCatalog {
    #[serde(default = "default_context_count")]
    pub default_context_count: u32,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default)]
    pub test_sets: BTreeMap<String, TestSet>,
}

fn default_context_count() -> u32 {
    1
}

impl Default for UrlCatalog {
    fn default() -> Self {
        Self {
            default_context_count: default_context_count(),
            urls: Vec::new(),
            test_sets: BTreeMap::new(),
        }
    }
}

impl UrlCatalog {
    /// Load a catalog from a JSON file
    pub async fn load(path: impl AsRef<Path>) -> OrchestratorResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| OrchestratorError::CatalogError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let catalog = Self::from_json(&content).map_err(|e| OrchestratorError::CatalogError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        process_debug!(
            ProcessId::current(),
            "📚 Loaded catalog {} ({} urls, {} presets)",
            path.display(),
            catalog.urls.len(),
            catalog.test_sets.len()
        );
        Ok(catalog)
    }

    pub fn from_json(content: &str) -> OrchestratorResult<Self> {
        let mut catalog: UrlCatalog = serde_json::from_str(content)?;
        if catalog.default_context_count == 0 {
            catalog.default_context_count = default_context_count();
        }
        Ok(catalog)
    }

    /// Look up a preset by key
    pub fn preset(&self, key: &str) -> OrchestratorResult<&TestSet> {
        self.test_sets.get(key).ok_or_else(|| OrchestratorError::UnknownPreset {
            name: key.to_string(),
            available: self.preset_keys().join(", "),
        })
    }

    pub fn preset_keys(&self) -> Vec<&str> {
        self.test_sets.keys().map(String::as_str).collect()
    }

    /// URLs of a preset, or the catalog defaults when no preset is named
    pub fn urls_for(&self, preset: Option<&str>) -> OrchestratorResult<Vec<String>> {
        match preset {
            Some(key) => Ok(self.preset(key)?.urls.clone()),
            None => Ok(self.urls.clone()),
        }
    }

    /// Default configuration of this catalog
    pub fn default_configuration(&self) -> TestConfiguration {
        TestConfiguration::new(self.default_context_count, self.urls.clone())
    }
}

/// Split a URL list on newlines, dropping blank lines
pub fn parse_url_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse a context count typed as free text
///
/// Reads the leading run of digits, so "3.7" is 3 and "5abc" is 5. Empty,
/// non-numeric, negative or zero input becomes 1.
pub fn parse_context_count(text: &str) -> u32 {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());

    match unsigned[..digits_end].parse::<u32>() {
        Ok(0) | Err(_) => 1,
        Ok(count) => count,
    }
}
