// Per-language dictionary cache

use std::sync::{Arc, Mutex, PoisonError};

use hashbrown::HashMap;
use inflection_core::locale::Locale;

use crate::EngineError;
use crate::analysis::MorphologicalAnalyzer;
use crate::config::{EngineConfig, MorphologyTables};
use crate::dictionary::Dictionary;
use crate::lookup::DictionaryLookupInflector;

/// Loads each language's dictionary once and hands out shared handles.
///
/// Entries are never evicted. Failed loads are not cached, so a file that
/// appears later is picked up by the next call.
#[derive(Debug)]
pub struct DictionaryRegistry {
    config: EngineConfig,
    dictionaries: Mutex<HashMap<String, Arc<Dictionary>>>,
}

impl DictionaryRegistry {
    pub fn new(config: EngineConfig) -> Self {
        DictionaryRegistry {
            config,
            dictionaries: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Dictionary for the language of `locale`.
    ///
    /// A language without its own file uses its fallback language, if any.
    /// No file at all is [`EngineError::UnsupportedLocale`].
    pub fn get(&self, locale: &Locale) -> Result<Arc<Dictionary>, EngineError> {
        let language = locale.language();
        let mut dictionaries = self
            .dictionaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(dictionary) = dictionaries.get(language) {
            return Ok(Arc::clone(dictionary));
        }

        let path = self.config.dictionary_path(language);
        if path.is_file() {
            let dictionary = Arc::new(Dictionary::open(&path)?);
            dictionaries.insert(language.to_string(), Arc::clone(&dictionary));
            return Ok(dictionary);
        }

        let Some(fallback) = locale.fallback_language() else {
            return Err(EngineError::UnsupportedLocale(locale.to_string()));
        };
        let dictionary = match dictionaries.get(fallback) {
            Some(dictionary) => Arc::clone(dictionary),
            None => {
                let path = self.config.dictionary_path(fallback);
                if !path.is_file() {
                    return Err(EngineError::UnsupportedLocale(locale.to_string()));
                }
                let dictionary = Arc::new(Dictionary::open(&path)?);
                dictionaries.insert(fallback.to_string(), Arc::clone(&dictionary));
                dictionary
            }
        };
        tracing::warn!(
            language,
            fallback,
            "no dictionary for language, using fallback"
        );
        dictionaries.insert(language.to_string(), Arc::clone(&dictionary));
        Ok(dictionary)
    }

    /// Register a dictionary under `language`, replacing any cached one.
    pub fn insert(&self, language: impl Into<String>, dictionary: Arc<Dictionary>) {
        self.dictionaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(language.into(), dictionary);
    }

    /// Languages with a cached dictionary, sorted.
    pub fn loaded_languages(&self) -> Vec<String> {
        let mut languages: Vec<String> = self
            .dictionaries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        languages.sort();
        languages
    }

    pub fn analyzer(
        &self,
        locale: &Locale,
        tables: &MorphologyTables,
    ) -> Result<MorphologicalAnalyzer, EngineError> {
        MorphologicalAnalyzer::new(self.get(locale)?, tables)
    }

    pub fn inflector(
        &self,
        locale: &Locale,
        tables: &MorphologyTables,
        enable_dictionary_fallback: bool,
    ) -> Result<DictionaryLookupInflector, EngineError> {
        DictionaryLookupInflector::new(self.get(locale)?, tables, enable_dictionary_fallback)
    }
}

impl Default for DictionaryRegistry {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
