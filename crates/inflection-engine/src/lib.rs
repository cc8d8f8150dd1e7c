//! Dictionary-driven morphological inflection.
//!
//! Given a lemma and a set of grammatical constraints, the engine finds the
//! inflection pattern of the word in a compiled, memory-mapped dictionary and
//! rewrites its suffix. The same data answers the reverse question: which
//! grammeme sets describe a surface form.
//!
//! # Architecture
//!
//! - [`dictionary`] -- The lexical dictionary: words, grammemes, properties
//! - [`inflector`] -- The inflection pattern store and its pattern views
//! - [`analysis`] -- Grammeme ranking and filtering over pattern matches
//! - [`lookup`] -- Dictionary lookup inflection with case handling
//! - [`registry`] -- Per-language dictionary cache
//! - [`compiler`] -- Builds dictionary files from JSON lexicons
//! - [`config`] -- Resource locations and per-language morphology tables

pub mod analysis;
pub mod compiler;
pub mod config;
pub mod dictionary;
pub mod inflector;
pub mod lookup;
pub mod registry;

pub use analysis::{InflectionGrammemes, MorphologicalAnalyzer};
pub use compiler::{DictionaryBuilder, LexiconSource};
pub use config::{EngineConfig, MorphologyTables};
pub use dictionary::Dictionary;
pub use inflector::{Inflection, InflectionPattern, Inflector};
pub use lookup::DictionaryLookupInflector;
pub use registry::DictionaryRegistry;

use inflection_dict::DictError;

/// Error type for dictionary queries, inflection and compilation.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Dictionary(#[from] DictError),
    #[error("no dictionary available for locale {0}")]
    UnsupportedLocale(String),
    #[error("inflection dictionary is missing suffix to identifiers mappings")]
    MissingSuffixMapping,
    #[error("dictionary has no inflection table")]
    MissingInflectionTable,
    #[error("properties are not recognized: {0:?}")]
    UnknownProperties(Vec<String>),
    #[error("unknown inflection pattern: {0}")]
    UnknownPattern(String),
    #[error("invalid lexicon: {0}")]
    InvalidLexicon(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Property key whose values name inflection patterns.
pub const INFLECTION_KEY: &str = "inflection";
