// Dictionary lookup inflection with case handling

use std::cmp::Ordering;
use std::sync::Arc;

use inflection_core::case;
use inflection_core::grammeme::{self, GrammemeMask};

use crate::EngineError;
use crate::analysis::{InflectionGrammemes, MorphologicalAnalyzer};
use crate::config::MorphologyTables;
use crate::dictionary::Dictionary;

/// Inflects dictionary words by swapping the suffix of their pattern.
#[derive(Debug)]
pub struct DictionaryLookupInflector {
    analyzer: MorphologicalAnalyzer,
    enable_dictionary_fallback: bool,
}

impl DictionaryLookupInflector {
    /// With `enable_dictionary_fallback`, every reading of the word is
    /// tried in rank order instead of only the best one.
    pub fn new(
        dictionary: Arc<Dictionary>,
        tables: &MorphologyTables,
        enable_dictionary_fallback: bool,
    ) -> Result<Self, EngineError> {
        Ok(Self::with_analyzer(
            MorphologicalAnalyzer::new(dictionary, tables)?,
            enable_dictionary_fallback,
        ))
    }

    pub fn with_analyzer(analyzer: MorphologicalAnalyzer, enable_dictionary_fallback: bool) -> Self {
        DictionaryLookupInflector {
            analyzer,
            enable_dictionary_fallback,
        }
    }

    pub fn analyzer(&self) -> &MorphologicalAnalyzer {
        &self.analyzer
    }

    pub fn dictionary(&self) -> &Dictionary {
        self.analyzer.dictionary()
    }

    /// Inflect `word` so that it carries every grammeme of `constraints`.
    ///
    /// `disambiguation` names grammemes of the intended reading when the
    /// word has several.
    pub fn inflect<S: AsRef<str>>(
        &self,
        word: &str,
        constraints: &[S],
        disambiguation: &[S],
    ) -> Result<Option<String>, EngineError> {
        self.inflect_with_optional_constraints(word, constraints, &[], disambiguation)
    }

    /// Like [`inflect`](Self::inflect), preferring forms that also carry the
    /// `optional` grammemes, earlier ones first.
    ///
    /// All-caps input is only looked up in lowercase, and the result is
    /// uppercased again. Other input is tried as written first; a lowercase
    /// retry is capitalized when the input starts with a capital.
    pub fn inflect_with_optional_constraints<S: AsRef<str>>(
        &self,
        word: &str,
        constraints: &[S],
        optional: &[S],
        disambiguation: &[S],
    ) -> Result<Option<String>, EngineError> {
        tracing::trace!(
            word,
            constraints = ?names(constraints),
            optional = ?names(optional),
            disambiguation = ?names(disambiguation),
            "inflect"
        );
        if constraints.iter().all(|c| c.as_ref().is_empty()) {
            return Ok(Some(word.to_string()));
        }
        let all_caps = case::is_all_upper(word);
        if !all_caps {
            let inflected =
                self.inflect_word_implementation(word, constraints, optional, disambiguation)?;
            if inflected.is_some() {
                return Ok(inflected);
            }
        }

        let locale = self.dictionary().locale();
        let lowered = case::lowercase(word, locale);
        let Some(inflected) =
            self.inflect_word_implementation(&lowered, constraints, optional, disambiguation)?
        else {
            return Ok(None);
        };
        if all_caps {
            Ok(Some(case::uppercase(&inflected, locale)))
        } else if case::starts_upper(word) {
            Ok(Some(case::capitalize_first(&inflected, locale)))
        } else {
            Ok(Some(inflected))
        }
    }

    /// Inflect `word` exactly as written, without case handling.
    pub fn inflect_word<S: AsRef<str>>(
        &self,
        word: &str,
        constraints: &[S],
        disambiguation: &[S],
    ) -> Result<Option<String>, EngineError> {
        self.inflect_word_implementation(word, constraints, &[], disambiguation)
    }

    fn inflect_word_implementation<S: AsRef<str>>(
        &self,
        word: &str,
        constraints: &[S],
        optional: &[S],
        disambiguation: &[S],
    ) -> Result<Option<String>, EngineError> {
        let dictionary = self.dictionary();
        let Some(word_grammemes) = dictionary.combined_binary_type(word)? else {
            tracing::trace!(word, "not in dictionary");
            return Ok(None);
        };
        let Some(inflector) = dictionary.inflector() else {
            return Ok(None);
        };
        let patterns = inflector.inflection_patterns_for_word(word)?;
        if patterns.is_empty() {
            tracing::trace!(word, "no inflection patterns");
            return Ok(None);
        }
        let readings = self
            .analyzer
            .inflection_grammemes(word, word_grammemes, &patterns)?;
        if readings.is_empty() {
            return Ok(None);
        }
        let readings = self.analyzer.filter_inflection_grammemes(readings);

        let disambiguation = single_masks(dictionary, disambiguation)?;
        let compare = |a: &InflectionGrammemes<'_>, b: &InflectionGrammemes<'_>| {
            self.compare_inflection_grammemes(a, b, &disambiguation)
        };
        let candidates: Vec<&InflectionGrammemes<'_>> = if self.enable_dictionary_fallback {
            let mut sorted: Vec<_> = readings.iter().collect();
            sorted.sort_by(|a, b| compare(a, b));
            if tracing::enabled!(tracing::Level::TRACE) {
                for reading in &sorted {
                    let description = reading.describe(dictionary)?;
                    tracing::trace!(reading = %description, "sorted reading");
                }
            }
            sorted
        } else {
            // First of the best on ties
            readings.iter().min_by(|a, b| compare(a, b)).into_iter().collect()
        };

        let to = dictionary.binary_properties(constraints)?;
        let optional = single_masks(dictionary, optional)?;
        for candidate in candidates {
            let Some(inflection) = &candidate.inflection else {
                return Ok(Some(word.to_string()));
            };
            tracing::trace!(
                word,
                grammemes = ?dictionary.property_names(inflection.grammemes()),
                "reinflect"
            );
            let inflected = inflection.pattern().reinflect_with_optional_constraints(
                inflection.grammemes(),
                to,
                &optional,
                word,
            )?;
            if let Some(inflected) = inflected.filter(|w| !w.is_empty()) {
                return Ok(Some(inflected));
            }
        }
        Ok(None)
    }

    /// Rank two readings; `Less` means `a` is preferred.
    ///
    /// Order: disambiguation match (earlier masks weigh more), the grammeme
    /// priority tables, readings with an inflection, fewer grammemes, then
    /// patterns with more inflections.
    pub fn compare_inflection_grammemes(
        &self,
        a: &InflectionGrammemes<'_>,
        b: &InflectionGrammemes<'_>,
        disambiguation: &[GrammemeMask],
    ) -> Ordering {
        let score_a = grammeme::priority_score(a.grammemes, disambiguation);
        let score_b = grammeme::priority_score(b.grammemes, disambiguation);
        score_b
            .cmp(&score_a)
            .then_with(|| self.analyzer.compare_grammemes(a.grammemes, b.grammemes))
            .then_with(|| match (&a.inflection, &b.inflection) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(ia), Some(ib)) => grammeme::count(a.grammemes)
                    .cmp(&grammeme::count(b.grammemes))
                    .then_with(|| {
                        ib.pattern()
                            .num_inflections()
                            .cmp(&ia.pattern().num_inflections())
                    }),
            })
    }
}

/// One bitset per name, each resolved on its own.
fn single_masks<S: AsRef<str>>(
    dictionary: &Dictionary,
    names: &[S],
) -> Result<Vec<GrammemeMask>, EngineError> {
    names
        .iter()
        .map(|name| dictionary.binary_properties(std::slice::from_ref(name)))
        .collect()
}

fn names<S: AsRef<str>>(values: &[S]) -> Vec<&str> {
    values.iter().map(AsRef::as_ref).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::testing::english_dictionary;

    const NONE: &[&str] = &[];

    fn inflector(fallback: bool) -> DictionaryLookupInflector {
        let tables = MorphologyTables {
            lemma_attributes: vec!["singular".into()],
            grammeme_priorities: vec![vec!["singular".into(), "plural".into()]],
            ignore_grammeme_sets: vec![],
        };
        DictionaryLookupInflector::new(Arc::new(english_dictionary()), &tables, fallback).unwrap()
    }

    fn inflect(inflector: &DictionaryLookupInflector, word: &str, constraints: &[&str]) -> Option<String> {
        inflector.inflect(word, constraints, NONE).unwrap()
    }

    // -- Inflection tests --

    #[test]
    fn regular_plural() {
        let inflector = inflector(false);
        assert_eq!(inflect(&inflector, "cat", &["plural"]).as_deref(), Some("cats"));
        assert_eq!(inflect(&inflector, "cats", &["singular"]).as_deref(), Some("cat"));
        assert_eq!(inflect(&inflector, "mouse", &["plural"]).as_deref(), Some("mice"));
    }

    #[test]
    fn unknown_word() {
        let inflector = inflector(false);
        assert_eq!(inflect(&inflector, "zzznotaword", &["plural"]), None);
        assert_eq!(inflector.inflect_word("zzznotaword", &["plural"], NONE).unwrap(), None);
    }

    #[test]
    fn verb_forms() {
        let inflector = inflector(false);
        assert_eq!(inflect(&inflector, "walk", &["past"]).as_deref(), Some("walked"));
        assert_eq!(inflect(&inflector, "walks", &["past"]).as_deref(), Some("walked"));
        assert_eq!(inflect(&inflector, "walk", &["present", "third"]).as_deref(), Some("walks"));
        assert_eq!(inflect(&inflector, "walked", &["gerund"]).as_deref(), Some("walking"));
    }

    #[test]
    fn optional_constraints() {
        let inflector = inflector(false);
        let walk = inflector
            .inflect_with_optional_constraints("walked", &["present"], NONE, NONE)
            .unwrap();
        assert_eq!(walk.as_deref(), Some("walk"));
        let walks = inflector
            .inflect_with_optional_constraints("walked", &["present"], &["third"], NONE)
            .unwrap();
        assert_eq!(walks.as_deref(), Some("walks"));
    }

    #[test]
    fn empty_constraints_return_word() {
        let inflector = inflector(false);
        assert_eq!(inflect(&inflector, "cat", &[]).as_deref(), Some("cat"));
        assert_eq!(inflect(&inflector, "zzz", &[""]).as_deref(), Some("zzz"));
    }

    #[test]
    fn unknown_constraint_fails() {
        let inflector = inflector(false);
        assert!(matches!(
            inflector.inflect("cat", &["vocative"], NONE),
            Err(EngineError::UnknownProperties(_))
        ));
    }

    #[test]
    fn uninflected_pattern_returns_word() {
        let inflector = inflector(false);
        assert_eq!(inflect(&inflector, "Paris", &["plural"]).as_deref(), Some("Paris"));
        // Known word without any pattern
        assert_eq!(inflect(&inflector, "the", &["plural"]), None);
    }

    // -- Case tests --

    #[test]
    fn case_is_restored() {
        let inflector = inflector(false);
        assert_eq!(inflect(&inflector, "Cat", &["plural"]).as_deref(), Some("Cats"));
        assert_eq!(inflect(&inflector, "CAT", &["plural"]).as_deref(), Some("CATS"));
        assert_eq!(inflect(&inflector, "MOUSE", &["plural"]).as_deref(), Some("MICE"));
    }

    // -- Ranking tests --

    #[test]
    fn disambiguation_picks_reading() {
        let inflector = inflector(false);
        // "duck" is a singular noun and a present tense verb; the priority
        // table prefers the noun reading
        assert_eq!(inflect(&inflector, "duck", &["plural"]).as_deref(), Some("ducks"));
        assert_eq!(inflect(&inflector, "duck", &["past"]), None);
        let verb = inflector.inflect("duck", &["past"], &["verb"]).unwrap();
        assert_eq!(verb.as_deref(), Some("ducked"));
    }

    #[test]
    fn comparator_order() {
        let inflector = inflector(false);
        let dict = inflector.dictionary();
        let singular = dict.binary_properties(&["singular"]).unwrap();
        let plural = dict.binary_properties(&["plural"]).unwrap();
        let noun = dict.binary_properties(&["noun"]).unwrap();
        let pattern = dict
            .require_inflector()
            .unwrap()
            .inflection_pattern_by_name("noun-s")
            .unwrap()
            .unwrap();
        let inflections = pattern.inflections().unwrap();
        let sing = InflectionGrammemes::new(noun | singular, Some(inflections[0].clone()));
        let plur = InflectionGrammemes::new(noun | plural, Some(inflections[1].clone()));
        let bare = InflectionGrammemes::new(noun | singular, None);

        // Priority table prefers singular
        assert_eq!(inflector.compare_inflection_grammemes(&sing, &plur, &[]), Ordering::Less);
        // Disambiguation outranks the priority table
        assert_eq!(
            inflector.compare_inflection_grammemes(&sing, &plur, &[plural]),
            Ordering::Greater
        );
        // Missing inflection ranks last
        assert_eq!(inflector.compare_inflection_grammemes(&bare, &sing, &[]), Ordering::Greater);
        assert_eq!(inflector.compare_inflection_grammemes(&sing, &bare, &[]), Ordering::Less);
        assert_eq!(inflector.compare_inflection_grammemes(&bare, &bare, &[]), Ordering::Equal);
    }

    #[test]
    fn fallback_tries_every_reading() {
        let strict = inflector(false);
        let fallback = inflector(true);
        assert_eq!(inflect(&strict, "duck", &["past"]), None);
        assert_eq!(inflect(&fallback, "duck", &["past"]).as_deref(), Some("ducked"));
        assert_eq!(inflect(&fallback, "cat", &["plural"]).as_deref(), Some("cats"));
    }
}
