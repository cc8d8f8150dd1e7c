// JSON lexicon description consumed by the dictionary compiler

use std::collections::BTreeMap;
use std::path::Path;

use inflection_dict::DictError;
use serde::{Deserialize, Serialize};

use crate::EngineError;

/// A complete lexicon for one language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexiconSource {
    /// Language subtag written to the file header, at most 4 bytes.
    pub language: String,
    pub words: Vec<WordEntry>,
    pub patterns: Vec<PatternEntry>,
    /// Build the suffix to pattern index.
    pub suffix_index: bool,
}

/// A dictionary word.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WordEntry {
    pub word: String,
    pub grammemes: Vec<String>,
    /// Free-form properties; values are stored as strings.
    pub properties: BTreeMap<String, Vec<String>>,
    /// Identifiers of the word's inflection patterns, most likely first.
    pub inflections: Vec<String>,
}

/// An inflection pattern shared by words that inflect alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternEntry {
    pub id: String,
    /// Parts of speech the pattern applies to.
    pub pos: Vec<String>,
    pub frequency: i32,
    pub lemma_suffixes: Vec<String>,
    pub inflections: Vec<InflectionEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InflectionEntry {
    pub suffix: String,
    pub grammemes: Vec<String>,
}

impl LexiconSource {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let json = std::fs::read_to_string(path).map_err(DictError::from)?;
        Self::from_json_str(&json)
    }

    /// Every grammeme name used anywhere in the lexicon.
    pub fn grammeme_names(&self) -> impl Iterator<Item = &str> {
        let words = self.words.iter().flat_map(|w| w.grammemes.iter());
        let patterns = self.patterns.iter().flat_map(|p| {
            p.pos
                .iter()
                .chain(p.inflections.iter().flat_map(|i| i.grammemes.iter()))
        });
        words.chain(patterns).map(String::as_str)
    }
}
