//! End-to-end tests: compile a sample lexicon, load it back and inflect.
//!
//! The lexicon lives in tests/data/english.json and is compiled fresh for
//! every test, either in memory or into a temporary resource directory.
//!
//! Run: cargo test -p inflection-engine --test end_to_end

use std::path::Path;
use std::sync::Arc;

use inflection_core::locale::Locale;
use inflection_dict::DictError;
use inflection_engine::compiler::WordEntry;
use inflection_engine::dictionary::mmapped::VERSION;
use inflection_engine::{
    Dictionary, DictionaryBuilder, DictionaryLookupInflector, DictionaryRegistry, EngineConfig,
    EngineError, LexiconSource, MorphologicalAnalyzer, MorphologyTables,
};
use proptest::prelude::*;

const ENGLISH: &str = include_str!("data/english.json");

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn english() -> LexiconSource {
    LexiconSource::from_json_str(ENGLISH).unwrap()
}

fn english_bytes() -> Vec<u8> {
    DictionaryBuilder::new(&english()).build().unwrap()
}

fn english_dictionary() -> Arc<Dictionary> {
    Arc::new(Dictionary::from_bytes(english_bytes()).unwrap())
}

fn tables() -> MorphologyTables {
    MorphologyTables::from_json_str(
        r#"{
            "lemma_attributes": ["singular", "present"],
            "grammeme_priorities": [["singular", "plural"]],
            "ignore_grammeme_sets": []
        }"#,
    )
    .unwrap()
}

fn inflector(fallback: bool) -> DictionaryLookupInflector {
    DictionaryLookupInflector::new(english_dictionary(), &tables(), fallback).unwrap()
}

/// Write `source` where the registry expects the dictionary of `language`.
fn install(root: &Path, language: &str, source: &LexiconSource) {
    let config = EngineConfig::new(root);
    let path = config.dictionary_path(language);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    DictionaryBuilder::new(source).write_to(&path).unwrap();
}

fn locale(tag: &str) -> Locale {
    Locale::parse(tag).unwrap()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn regular_plural() {
    let inflector = inflector(false);
    assert_eq!(
        inflector.inflect("cat", &["plural"], &[]).unwrap().as_deref(),
        Some("cats")
    );
    assert_eq!(
        inflector.inflect("cats", &["singular"], &[]).unwrap().as_deref(),
        Some("cat")
    );
}

#[test]
fn unknown_word_is_not_inflected() {
    let inflector = inflector(false);
    assert_eq!(inflector.inflect("zzznotaword", &["plural"], &[]).unwrap(), None);
}

#[test]
fn misspelled_constraint_is_rejected() {
    let inflector = inflector(false);
    assert!(matches!(
        inflector.inflect("cat", &["plural", "bogus"], &[]),
        Err(EngineError::UnknownProperties(names)) if names == vec!["bogus"]
    ));
    assert!(matches!(
        inflector.inflect("cat", &["bogus"], &[]),
        Err(EngineError::UnknownProperties(names)) if names == vec!["bogus"]
    ));
    assert!(matches!(
        inflector.inflect("cat", &["plural"], &["nuon"]),
        Err(EngineError::UnknownProperties(names)) if names == vec!["nuon"]
    ));
}

#[test]
fn suffix_lookup_needs_index() {
    let mut source = english();
    source.suffix_index = false;
    let dict = Dictionary::from_bytes(DictionaryBuilder::new(&source).build().unwrap()).unwrap();
    let inflector = dict.require_inflector().unwrap();
    assert!(matches!(
        inflector.inflection_patterns_from_suffix("s"),
        Err(EngineError::MissingSuffixMapping)
    ));

    // Everything else still works without it
    let lookup = DictionaryLookupInflector::new(Arc::new(dict), &tables(), false).unwrap();
    assert_eq!(
        lookup.inflect("mouse", &["plural"], &[]).unwrap().as_deref(),
        Some("mice")
    );
}

#[test]
fn pattern_without_inflections_yields_parts_of_speech() {
    let dict = english_dictionary();
    let analyzer = MorphologicalAnalyzer::new(Arc::clone(&dict), &tables()).unwrap();
    let noun_proper = dict.binary_properties(&["noun", "proper"]).unwrap();

    let readings = analyzer.analyze("Paris").unwrap();
    assert_eq!(readings.len(), 1);
    assert_eq!(readings[0].grammemes, noun_proper);
    assert!(readings[0].inflection.is_none());
    assert_eq!(analyzer.word_grammemesets("Paris").unwrap(), vec![noun_proper]);
}

// ---------------------------------------------------------------------------
// Case handling and readings
// ---------------------------------------------------------------------------

#[test]
fn case_is_restored() {
    let inflector = inflector(false);
    assert_eq!(
        inflector.inflect("Mouse", &["plural"], &[]).unwrap().as_deref(),
        Some("Mice")
    );
    assert_eq!(
        inflector.inflect("MOUSE", &["plural"], &[]).unwrap().as_deref(),
        Some("MICE")
    );
}

#[test]
fn ambiguous_word_follows_disambiguation() {
    let strict = inflector(false);
    assert_eq!(
        strict.inflect("duck", &["plural"], &[]).unwrap().as_deref(),
        Some("ducks")
    );
    assert_eq!(strict.inflect("duck", &["past"], &[]).unwrap(), None);
    assert_eq!(
        strict.inflect("duck", &["past"], &["verb"]).unwrap().as_deref(),
        Some("ducked")
    );
    assert_eq!(
        inflector(true).inflect("duck", &["past"], &[]).unwrap().as_deref(),
        Some("ducked")
    );
}

#[test]
fn lemma_follows_attribute_order() {
    let dict = english_dictionary();
    let inflector = dict.require_inflector().unwrap();
    let pattern = inflector.inflection_pattern_by_name("noun-s").unwrap().unwrap();

    let singular_first = MorphologicalAnalyzer::new(Arc::clone(&dict), &tables()).unwrap();
    let lemma = singular_first.select_lemma_inflection(&pattern, 0).unwrap().unwrap();
    assert_eq!(lemma.suffix(), "");

    let mut plural_tables = tables();
    plural_tables.lemma_attributes = vec!["plural".to_string()];
    let plural_first = MorphologicalAnalyzer::new(Arc::clone(&dict), &plural_tables).unwrap();
    let lemma = plural_first.select_lemma_inflection(&pattern, 0).unwrap().unwrap();
    assert_eq!(lemma.suffix(), "s");
}

#[test]
fn unknown_table_grammeme_is_rejected() {
    let mut bad = tables();
    bad.lemma_attributes = vec!["dual".to_string()];
    assert!(matches!(
        MorphologicalAnalyzer::new(english_dictionary(), &bad),
        Err(EngineError::UnknownProperties(names)) if names == vec!["dual"]
    ));
}

// ---------------------------------------------------------------------------
// File format gates
// ---------------------------------------------------------------------------

#[test]
fn version_gate() {
    let mut bytes = english_bytes();
    bytes[8..16].copy_from_slice(&(VERSION + 1).to_ne_bytes());
    assert!(matches!(
        Dictionary::from_bytes(bytes),
        Err(EngineError::Dictionary(DictError::IncompatibleVersion { found, expected }))
            if found == VERSION + 1 && expected == VERSION
    ));
}

#[test]
fn endianness_gate() {
    let mut bytes = english_bytes();
    bytes[16..18].copy_from_slice(&256i16.to_ne_bytes());
    assert!(matches!(
        Dictionary::from_bytes(bytes),
        Err(EngineError::Dictionary(DictError::EndiannessMismatch { found: 256 }))
    ));
}

#[test]
fn mapped_file_matches_memory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("english.sdict");
    DictionaryBuilder::new(&english()).write_to(&path).unwrap();
    let mapped = Dictionary::open(&path).unwrap();
    let owned = english_dictionary();
    let mapped_words: Vec<String> = mapped.known_words().map(Result::unwrap).collect();
    let owned_words: Vec<String> = owned.known_words().map(Result::unwrap).collect();
    assert_eq!(mapped_words, owned_words);
    for word in &owned_words {
        assert_eq!(mapped.lookup_word(word).unwrap(), owned.lookup_word(word).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

#[test]
fn registry_loads_from_resource_root() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), "en", &english());
    let registry = DictionaryRegistry::new(EngineConfig::new(dir.path()));

    let first = registry.get(&locale("en-US")).unwrap();
    let second = registry.get(&locale("en_GB")).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let inflector = registry.inflector(&locale("en"), &tables(), false).unwrap();
    assert_eq!(
        inflector.inflect("mouse", &["plural"], &[]).unwrap().as_deref(),
        Some("mice")
    );
}

#[test]
fn registry_falls_back_to_chinese() {
    let dir = tempfile::tempdir().unwrap();
    let mut chinese = english();
    chinese.language = "zh".to_string();
    install(dir.path(), "zh", &chinese);
    let registry = DictionaryRegistry::new(EngineConfig::new(dir.path()));

    let cantonese = registry.get(&locale("yue")).unwrap();
    assert_eq!(cantonese.locale().language(), "zh");
    assert_eq!(registry.loaded_languages(), vec!["yue", "zh"]);
    let chinese = registry.get(&locale("zh")).unwrap();
    assert!(Arc::ptr_eq(&cantonese, &chinese));
}

#[test]
fn registry_errors() {
    let dir = tempfile::tempdir().unwrap();
    let registry = DictionaryRegistry::new(EngineConfig::new(dir.path()));
    assert!(matches!(
        registry.get(&locale("fr")),
        Err(EngineError::UnsupportedLocale(_))
    ));
    assert!(matches!(
        registry.get(&locale("wuu")),
        Err(EngineError::UnsupportedLocale(_))
    ));

    let path = registry.config().dictionary_path("de");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, vec![0u8; 64]).unwrap();
    assert!(matches!(
        registry.get(&locale("de")),
        Err(EngineError::Dictionary(DictError::InvalidMagic))
    ));
    assert!(registry.loaded_languages().is_empty());
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

const GRAMMEMES: [&str; 6] = ["g0", "g1", "g2", "g3", "g4", "g5"];

proptest! {
    #[test]
    fn compiled_grammemes_read_back(
        words in prop::collection::btree_map(
            "[a-z]{1,8}",
            prop::collection::btree_set(0usize..GRAMMEMES.len(), 0..4),
            1..40,
        )
    ) {
        let source = LexiconSource {
            language: "en".to_string(),
            words: words
                .iter()
                .map(|(word, ids)| WordEntry {
                    word: word.clone(),
                    grammemes: ids.iter().map(|&i| GRAMMEMES[i].to_string()).collect(),
                    ..WordEntry::default()
                })
                .collect(),
            ..LexiconSource::default()
        };
        let dict = Dictionary::from_bytes(DictionaryBuilder::new(&source).build().unwrap()).unwrap();
        prop_assert_eq!(dict.known_words_len(), words.len());
        for (word, ids) in &words {
            let names: Vec<&str> = ids.iter().map(|&i| GRAMMEMES[i]).collect();
            let expected = dict.binary_properties(&names).unwrap();
            prop_assert_eq!(dict.lookup_word(word).unwrap(), expected);
        }
    }
}
