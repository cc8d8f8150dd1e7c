//! Dictionary compiler.
//!
//! Turns a JSON lexicon into the binary dictionary image read by
//! [`Dictionary`](crate::dictionary::Dictionary). Grammeme identifiers follow
//! the UTF-16 order of their names; pattern ids are assigned by the pattern
//! trie.

pub mod builder;
pub mod source;

pub use builder::DictionaryBuilder;
pub use source::{InflectionEntry, LexiconSource, PatternEntry, WordEntry};

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::OnceLock;

    use super::{DictionaryBuilder, LexiconSource};
    use crate::dictionary::Dictionary;

    const ENGLISH: &str = include_str!("../../tests/data/english.json");

    /// Small English lexicon shared by the unit tests.
    pub(crate) fn english() -> LexiconSource {
        LexiconSource::from_json_str(ENGLISH).unwrap()
    }

    pub(crate) fn english_dictionary() -> Dictionary {
        static BYTES: OnceLock<Vec<u8>> = OnceLock::new();
        let bytes = BYTES.get_or_init(|| DictionaryBuilder::new(&english()).build().unwrap());
        Dictionary::from_bytes(bytes.clone()).unwrap()
    }
}
