//! Inflection patterns of a dictionary.
//!
//! Every inflectable word names one or more patterns through its
//! `inflection` property. A pattern lists the suffixes of all forms of the
//! word together with their grammemes, so reinflection is a suffix swap.

pub mod inflection;
pub mod pattern;
pub mod store;

use std::fmt;

use inflection_core::case;

use crate::EngineError;
use crate::dictionary::Dictionary;
pub use inflection::Inflection;
pub use pattern::InflectionPattern;
pub use store::{INFLECTOR_VERSION, PatternRecord, PatternStore};

/// Pattern queries bound to one dictionary.
#[derive(Clone, Copy)]
pub struct Inflector<'a> {
    dictionary: &'a Dictionary,
    store: &'a PatternStore,
}

impl<'a> Inflector<'a> {
    pub(crate) fn new(dictionary: &'a Dictionary, store: &'a PatternStore) -> Self {
        Inflector { dictionary, store }
    }

    pub fn dictionary(&self) -> &'a Dictionary {
        self.dictionary
    }

    pub fn store(&self) -> &'a PatternStore {
        self.store
    }

    pub fn pattern_count(&self) -> usize {
        self.store.pattern_count()
    }

    pub fn inflection_pattern_index_from_name(&self, name: &str) -> Option<usize> {
        self.store.pattern_id(name)
    }

    pub fn inflection_pattern(&self, id: usize) -> Result<InflectionPattern<'a>, EngineError> {
        let record = self.store.record(id)?;
        let parts_of_speech = self.store.grammeme_pattern(record.pos_index)?;
        Ok(InflectionPattern::new(*self, id, record, parts_of_speech))
    }

    /// Pattern named `name`, if the store has one.
    pub fn inflection_pattern_by_name(
        &self,
        name: &str,
    ) -> Result<Option<InflectionPattern<'a>>, EngineError> {
        self.inflection_pattern_index_from_name(name)
            .map(|id| self.inflection_pattern(id))
            .transpose()
    }

    /// Pattern ids listed for `word`, retrying in lowercase.
    pub fn inflection_pattern_identifiers(
        &self,
        word: &str,
    ) -> Result<Option<Vec<usize>>, EngineError> {
        let lexicon = self.dictionary.lexicon();
        let Some(key) = lexicon.inflection_key() else {
            return Ok(None);
        };
        if let Some(ids) = lexicon.word_property_ids(word, key)? {
            return Ok(Some(ids));
        }
        if case::is_all_lower(word) {
            return Ok(None);
        }
        let lowered = self.dictionary.transform(word);
        Ok(lexicon.word_property_ids(&lowered, key)?)
    }

    /// Patterns of `word`; empty when it has none.
    pub fn inflection_patterns_for_word(
        &self,
        word: &str,
    ) -> Result<Vec<InflectionPattern<'a>>, EngineError> {
        self.inflection_pattern_identifiers(word)?
            .unwrap_or_default()
            .into_iter()
            .map(|id| self.inflection_pattern(id))
            .collect()
    }

    /// Patterns having an inflection that ends in `suffix`.
    ///
    /// Needs the suffix index, which is optional in compiled files.
    pub fn inflection_patterns_from_suffix(
        &self,
        suffix: &str,
    ) -> Result<Vec<InflectionPattern<'a>>, EngineError> {
        if !self.has_suffix_to_identifiers_mapping() {
            return Err(EngineError::MissingSuffixMapping);
        }
        self.store
            .pattern_ids_for_suffix(suffix)?
            .into_iter()
            .map(|id| self.inflection_pattern(id))
            .collect()
    }

    pub fn has_suffix_to_identifiers_mapping(&self) -> bool {
        self.store.has_suffix_index()
    }
}

impl fmt::Debug for Inflector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inflector")
            .field("language", &self.dictionary.locale().language())
            .field("patterns", &self.store.pattern_count())
            .field("suffix_index", &self.store.has_suffix_index())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DictionaryBuilder;
    use crate::compiler::testing::{english, english_dictionary};

    #[test]
    fn pattern_by_name() {
        let dict = english_dictionary();
        let inflector = dict.require_inflector().unwrap();
        assert_eq!(inflector.pattern_count(), 5);
        let id = inflector.inflection_pattern_index_from_name("noun-s").unwrap();
        let pattern = inflector.inflection_pattern(id).unwrap();
        assert_eq!(pattern.identifier().unwrap(), "noun-s");
        assert_eq!(pattern.num_inflections(), 2);
        assert!(inflector.inflection_pattern_index_from_name("noun-x").is_none());
        assert!(inflector.inflection_pattern_by_name("noun-x").unwrap().is_none());
        assert!(inflector.inflection_pattern(99).is_err());
    }

    #[test]
    fn patterns_for_word() {
        let dict = english_dictionary();
        let inflector = dict.require_inflector().unwrap();
        let patterns = inflector.inflection_patterns_for_word("mice").unwrap();
        assert_eq!(patterns.len(), 1);
        assert_eq!(patterns[0].identifier().unwrap(), "noun-ouse");

        let upper = inflector.inflection_patterns_for_word("MICE").unwrap();
        assert_eq!(upper.len(), 1);
        assert!(inflector.inflection_patterns_for_word("zzz").unwrap().is_empty());
        assert_eq!(inflector.inflection_pattern_identifiers("zzz").unwrap(), None);
    }

    #[test]
    fn patterns_from_suffix() {
        let dict = english_dictionary();
        let inflector = dict.require_inflector().unwrap();
        assert!(inflector.has_suffix_to_identifiers_mapping());

        let mut names: Vec<String> = inflector
            .inflection_patterns_from_suffix("s")
            .unwrap()
            .iter()
            .map(|p| p.identifier().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, vec!["noun-s", "verb-regular"]);
        assert!(inflector.inflection_patterns_from_suffix("xyz").unwrap().is_empty());
    }

    #[test]
    fn missing_suffix_index() {
        let mut source = english();
        source.suffix_index = false;
        let dict = Dictionary::from_bytes(DictionaryBuilder::new(&source).build().unwrap()).unwrap();
        let inflector = dict.require_inflector().unwrap();
        assert!(!inflector.has_suffix_to_identifiers_mapping());
        assert!(matches!(
            inflector.inflection_patterns_from_suffix("s"),
            Err(EngineError::MissingSuffixMapping)
        ));
    }
}
