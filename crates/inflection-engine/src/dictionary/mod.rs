//! The lexical dictionary of one language.
//!
//! [`Dictionary`] wraps the raw file reader with the locale of the file and
//! the case folding retries every consumer expects: a word missing as
//! written is looked up again in lowercase.

pub mod mmapped;

use std::fmt;
use std::path::Path;

use inflection_core::case;
use inflection_core::grammeme::{self, GrammemeMask};
use inflection_core::locale::Locale;
use inflection_dict::{ByteView, DictError};

use crate::EngineError;
use crate::inflector::Inflector;
pub use mmapped::LexicalDictionary;

/// A loaded, immutable dictionary. Share it through `Arc`.
pub struct Dictionary {
    locale: Locale,
    lexicon: LexicalDictionary,
}

impl Dictionary {
    /// Memory-map and load a compiled dictionary file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        Self::from_view(ByteView::map_file(path)?)
    }

    /// Load a dictionary image already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, EngineError> {
        Self::from_view(ByteView::from_vec(bytes))
    }

    pub fn from_view(view: ByteView) -> Result<Self, EngineError> {
        let lexicon = LexicalDictionary::load(view)?;
        let locale = Locale::parse(lexicon.language())
            .map_err(|e| DictError::Corrupt(format!("dictionary language: {e}")))?;
        Ok(Dictionary { locale, lexicon })
    }

    pub fn locale(&self) -> &Locale {
        &self.locale
    }

    /// The underlying file reader.
    pub fn lexicon(&self) -> &LexicalDictionary {
        &self.lexicon
    }

    /// Lowercase form used for the case folding retry.
    pub fn transform(&self, word: &str) -> String {
        case::lowercase(word, &self.locale)
    }

    /// Grammemes of `word`, retrying in lowercase when the word is absent
    /// as written. An empty grammeme set counts as absent.
    pub fn combined_binary_type(&self, word: &str) -> Result<Option<GrammemeMask>, EngineError> {
        if let Some(mask) = self.lexicon.word_type(word)?.filter(|&m| m != 0) {
            return Ok(Some(mask));
        }
        let lowered = self.transform(word);
        if lowered == word {
            return Ok(None);
        }
        Ok(self.lexicon.word_type(&lowered)?.filter(|&m| m != 0))
    }

    /// Grammeme bitset of `word`, 0 when unknown.
    pub fn lookup_word(&self, word: &str) -> Result<GrammemeMask, EngineError> {
        Ok(self.combined_binary_type(word)?.unwrap_or(0))
    }

    pub fn is_known_word(&self, word: &str) -> Result<bool, EngineError> {
        Ok(self.combined_binary_type(word)?.is_some())
    }

    /// True when `word` carries the grammeme named `name`.
    pub fn has_property(&self, word: &str, name: &str) -> Result<bool, EngineError> {
        let Some(bit) = self.lexicon.value_of_type(name) else {
            return Ok(false);
        };
        self.has_any_property(word, bit)
    }

    pub fn has_all_properties(&self, word: &str, mask: GrammemeMask) -> Result<bool, EngineError> {
        Ok(self
            .combined_binary_type(word)?
            .is_some_and(|g| grammeme::contains_all(g, mask)))
    }

    pub fn has_any_property(&self, word: &str, mask: GrammemeMask) -> Result<bool, EngineError> {
        Ok(self
            .combined_binary_type(word)?
            .is_some_and(|g| grammeme::intersects(g, mask)))
    }

    /// Bitset of the named grammemes.
    ///
    /// Every name must resolve; the unresolved ones are reported in
    /// [`EngineError::UnknownProperties`].
    pub fn binary_properties<S: AsRef<str>>(&self, names: &[S]) -> Result<GrammemeMask, EngineError> {
        let mut mask = 0;
        let mut unknown = Vec::new();
        for name in names {
            match self.lexicon.value_of_type(name.as_ref()) {
                Some(bit) => mask |= bit,
                None => unknown.push(name.as_ref().to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(EngineError::UnknownProperties(unknown));
        }
        Ok(mask)
    }

    /// Names of the grammemes in `mask`, lowest bit first.
    pub fn property_names(&self, mask: GrammemeMask) -> Vec<String> {
        self.lexicon.types_of_values(mask)
    }

    pub fn property_name(&self, bit: GrammemeMask) -> Option<String> {
        self.lexicon.type_of_value(bit)
    }

    /// Grammeme names of `word`; empty when unknown.
    pub fn properties(&self, word: &str) -> Result<Vec<String>, EngineError> {
        Ok(self
            .combined_binary_type(word)?
            .map(|mask| self.property_names(mask))
            .unwrap_or_default())
    }

    /// Values of `property` for `word`.
    ///
    /// A miss is retried in lowercase unless the word is already lowercase
    /// or is itself a dictionary entry.
    pub fn property_values(
        &self,
        word: &str,
        property: &str,
    ) -> Result<Option<Vec<String>>, EngineError> {
        if let Some(values) = self.lexicon.word_property_values(word, property)? {
            return Ok(Some(values));
        }
        if case::is_all_lower(word) || self.lexicon.word_type(word)?.is_some() {
            return Ok(None);
        }
        let lowered = self.transform(word);
        Ok(self.lexicon.word_property_values(&lowered, property)?)
    }

    /// Every dictionary word. Each call restarts the walk.
    pub fn known_words(&self) -> impl Iterator<Item = Result<String, DictError>> + '_ {
        self.lexicon.all_words()
    }

    pub fn known_words_len(&self) -> usize {
        self.lexicon.all_words_len()
    }

    /// Pattern store view, when the file carries inflection tables.
    pub fn inflector(&self) -> Option<Inflector<'_>> {
        self.lexicon
            .inflector()
            .map(|store| Inflector::new(self, store))
    }

    pub fn require_inflector(&self) -> Result<Inflector<'_>, EngineError> {
        self.inflector().ok_or(EngineError::MissingInflectionTable)
    }
}

impl fmt::Debug for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dictionary")
            .field("locale", &self.locale.to_string())
            .field("words", &self.lexicon.all_words_len())
            .field("grammemes", &self.lexicon.type_count())
            .field("inflections", &self.lexicon.inflector().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::testing::{english, english_dictionary};
    use crate::compiler::DictionaryBuilder;

    // -- Lookup tests --

    #[test]
    fn lookup_known_and_unknown() {
        let dict = english_dictionary();
        let cat = dict.lookup_word("cat").unwrap();
        assert_eq!(dict.property_names(cat), vec!["noun", "singular"]);
        assert_eq!(dict.lookup_word("zzznotaword").unwrap(), 0);
        assert!(!dict.is_known_word("zzznotaword").unwrap());
    }

    #[test]
    fn lookup_retries_lowercase() {
        let dict = english_dictionary();
        assert_eq!(
            dict.lookup_word("Cat").unwrap(),
            dict.lookup_word("cat").unwrap()
        );
        assert!(dict.is_known_word("CATS").unwrap());
        // Stored capitalized; no uppercase retry
        assert!(dict.is_known_word("Paris").unwrap());
        assert!(!dict.is_known_word("paris").unwrap());
    }

    #[test]
    fn property_checks() {
        let dict = english_dictionary();
        assert!(dict.has_property("cats", "plural").unwrap());
        assert!(!dict.has_property("cats", "singular").unwrap());
        assert!(!dict.has_property("cats", "nosuchgrammeme").unwrap());

        let noun_plural = dict.binary_properties(&["noun", "plural"]).unwrap();
        assert!(dict.has_all_properties("cats", noun_plural).unwrap());
        assert!(!dict.has_all_properties("cat", noun_plural).unwrap());
        assert!(dict.has_any_property("cat", noun_plural).unwrap());
        assert!(!dict.has_any_property("zzz", noun_plural).unwrap());
    }

    #[test]
    fn binary_properties_rules() {
        let dict = english_dictionary();
        assert_eq!(dict.binary_properties::<&str>(&[]).unwrap(), 0);
        assert_ne!(dict.binary_properties(&["plural"]).unwrap(), 0);
        assert!(matches!(
            dict.binary_properties(&["bogus"]),
            Err(EngineError::UnknownProperties(names)) if names == vec!["bogus"]
        ));
        // One unknown name fails the whole list
        assert!(matches!(
            dict.binary_properties(&["plural", "bogus", "noun", "dual"]),
            Err(EngineError::UnknownProperties(names)) if names == vec!["bogus", "dual"]
        ));
    }

    #[test]
    fn names_of_bits() {
        let dict = english_dictionary();
        let plural = dict.binary_properties(&["plural"]).unwrap();
        assert_eq!(dict.property_name(plural).as_deref(), Some("plural"));
        assert_eq!(dict.property_name(plural | 1), None);
        assert_eq!(dict.property_name(1 << 63), None);
        assert_eq!(dict.properties("walks").unwrap(), vec!["present", "third", "verb"]);
        assert!(dict.properties("zzz").unwrap().is_empty());
    }

    // -- Property value tests --

    #[test]
    fn property_values_and_retry() {
        let dict = english_dictionary();
        assert_eq!(
            dict.property_values("cat", "register").unwrap(),
            Some(vec!["common".to_string()])
        );
        assert_eq!(
            dict.property_values("Cat", "register").unwrap(),
            Some(vec!["common".to_string()])
        );
        assert_eq!(dict.property_values("cat", "nosuchproperty").unwrap(), None);
        assert_eq!(dict.property_values("Paris", "register").unwrap(), None);
    }

    #[test]
    fn inflection_values_name_patterns() {
        let dict = english_dictionary();
        assert_eq!(
            dict.property_values("cat", crate::INFLECTION_KEY).unwrap(),
            Some(vec!["noun-s".to_string()])
        );
    }

    // -- Word listing tests --

    #[test]
    fn known_words_restart() {
        let dict = english_dictionary();
        let first: Vec<String> = dict.known_words().map(Result::unwrap).collect();
        let second: Vec<String> = dict.known_words().map(Result::unwrap).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), dict.known_words_len());
        assert!(first.contains(&"mouse".to_string()));
    }

    #[test]
    fn locale_from_header() {
        let dict = english_dictionary();
        assert_eq!(dict.locale().language(), "en");
        assert!(dict.inflector().is_some());
    }

    #[test]
    fn dictionary_without_inflections() {
        let mut source = english();
        source.patterns.clear();
        for entry in &mut source.words {
            entry.inflections.clear();
        }
        let bytes = DictionaryBuilder::new(&source).build().unwrap();
        let dict = Dictionary::from_bytes(bytes).unwrap();
        assert!(dict.inflector().is_none());
        assert!(matches!(
            dict.require_inflector(),
            Err(EngineError::MissingInflectionTable)
        ));
        assert!(dict.is_known_word("cat").unwrap());
    }

    // -- Header tests --

    #[test]
    fn rejects_short_and_foreign_files() {
        assert!(matches!(
            Dictionary::from_bytes(vec![0; 4]),
            Err(EngineError::Dictionary(DictError::TooShort { .. }))
        ));
        assert!(matches!(
            Dictionary::from_bytes(vec![0; 64]),
            Err(EngineError::Dictionary(DictError::InvalidMagic))
        ));
    }

    #[test]
    fn truncated_file_fails() {
        let bytes = DictionaryBuilder::new(&english()).build().unwrap();
        let half = bytes[..bytes.len() / 2].to_vec();
        assert!(matches!(
            Dictionary::from_bytes(half),
            Err(EngineError::Dictionary(_))
        ));
    }
}
