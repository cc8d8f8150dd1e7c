// Resource locations and per-language morphology tables

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Environment variable naming the resource root directory.
pub const RESOURCE_ROOT_ENV: &str = "INFLECTION_RESOURCE_ROOT";

const DEFAULT_RESOURCE_ROOT: &str = "resources";
const DICTIONARY_SUBDIR: &str = "dictionary";
const DICTIONARY_PREFIX: &str = "mmappable_";
const DICTIONARY_EXTENSION: &str = "sdict";

/// Where compiled dictionaries live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    resource_root: PathBuf,
}

impl EngineConfig {
    pub fn new(resource_root: impl Into<PathBuf>) -> Self {
        EngineConfig {
            resource_root: resource_root.into(),
        }
    }

    /// Read the root from `INFLECTION_RESOURCE_ROOT`, defaulting to `./resources`.
    pub fn from_env() -> Self {
        match std::env::var_os(RESOURCE_ROOT_ENV) {
            Some(root) if !root.is_empty() => Self::new(root),
            _ => Self::new(DEFAULT_RESOURCE_ROOT),
        }
    }

    pub fn resource_root(&self) -> &Path {
        &self.resource_root
    }

    /// `<root>/dictionary/mmappable_<language>.sdict`
    pub fn dictionary_path(&self, language: &str) -> PathBuf {
        self.resource_root
            .join(DICTIONARY_SUBDIR)
            .join(format!("{DICTIONARY_PREFIX}{language}.{DICTIONARY_EXTENSION}"))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// Grammeme tables a language synthesizer hands to the analyzer.
///
/// Every entry names grammemes of the dictionary; they are converted to
/// bitsets once, when the analyzer is constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MorphologyTables {
    /// Lemma attributes, most important first.
    pub lemma_attributes: Vec<String>,
    /// Priority tables for ranking grammeme sets; each table lists single
    /// grammemes from most to least preferred.
    pub grammeme_priorities: Vec<Vec<String>>,
    /// Grammeme combinations that make an analysis uninteresting.
    pub ignore_grammeme_sets: Vec<Vec<String>>,
}

impl MorphologyTables {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }
}
