// Grammeme ranking and filtering over inflection pattern matches

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use inflection_core::grammeme::{self, GrammemeMask};

use crate::EngineError;
use crate::config::MorphologyTables;
use crate::dictionary::Dictionary;
use crate::inflector::{Inflection, InflectionPattern};

/// One reading of a surface form: its grammemes and, when a pattern
/// produced it, the inflection that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InflectionGrammemes<'a> {
    pub grammemes: GrammemeMask,
    pub inflection: Option<Inflection<'a>>,
}

impl<'a> InflectionGrammemes<'a> {
    pub fn new(grammemes: GrammemeMask, inflection: Option<Inflection<'a>>) -> Self {
        InflectionGrammemes {
            grammemes,
            inflection,
        }
    }

    /// Human readable form for trace output, e.g.
    /// `Inflection[pattern-id=noun-s, suffix="s"], grammemes[noun,plural]`.
    pub fn describe(&self, dictionary: &Dictionary) -> Result<String, EngineError> {
        let inflection = match &self.inflection {
            Some(inflection) => format!(
                "pattern-id={}, suffix=\"{}\"",
                inflection.pattern().identifier()?,
                inflection.suffix()
            ),
            None => String::new(),
        };
        Ok(format!(
            "Inflection[{inflection}], grammemes[{}]",
            dictionary.property_names(self.grammemes).join(",")
        ))
    }
}

/// Morphology tables of one language resolved against its dictionary.
pub struct MorphologicalAnalyzer {
    dictionary: Arc<Dictionary>,
    lemma_attributes: Vec<GrammemeMask>,
    grammeme_priorities: Vec<Vec<GrammemeMask>>,
    ignore_grammeme_sets: Vec<GrammemeMask>,
}

impl MorphologicalAnalyzer {
    /// Resolve every table entry to a bitset. Unknown grammeme names fail
    /// with [`EngineError::UnknownProperties`].
    pub fn new(dictionary: Arc<Dictionary>, tables: &MorphologyTables) -> Result<Self, EngineError> {
        let single = |name: &String| dictionary.binary_properties(std::slice::from_ref(name));
        let lemma_attributes = tables
            .lemma_attributes
            .iter()
            .map(single)
            .collect::<Result<Vec<_>, _>>()?;
        let grammeme_priorities = tables
            .grammeme_priorities
            .iter()
            .map(|table| table.iter().map(single).collect::<Result<Vec<_>, _>>())
            .collect::<Result<Vec<_>, _>>()?;
        let ignore_grammeme_sets = tables
            .ignore_grammeme_sets
            .iter()
            .map(|set| dictionary.binary_properties(set))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_masks(
            dictionary,
            lemma_attributes,
            grammeme_priorities,
            ignore_grammeme_sets,
        ))
    }

    /// Build from already resolved bitsets. Empty ignore sets are dropped,
    /// since they would exclude everything.
    pub fn from_masks(
        dictionary: Arc<Dictionary>,
        lemma_attributes: Vec<GrammemeMask>,
        grammeme_priorities: Vec<Vec<GrammemeMask>>,
        mut ignore_grammeme_sets: Vec<GrammemeMask>,
    ) -> Self {
        ignore_grammeme_sets.retain(|&set| set != 0);
        MorphologicalAnalyzer {
            dictionary,
            lemma_attributes,
            grammeme_priorities,
            ignore_grammeme_sets,
        }
    }

    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dictionary
    }

    pub fn lemma_attributes(&self) -> &[GrammemeMask] {
        &self.lemma_attributes
    }

    /// Lemma form of `pattern` using the language's lemma attributes.
    pub fn select_lemma_inflection<'a>(
        &self,
        pattern: &InflectionPattern<'a>,
        requested: GrammemeMask,
    ) -> Result<Option<Inflection<'a>>, EngineError> {
        pattern.select_lemma_inflection(requested, &self.lemma_attributes)
    }

    /// Rank two grammeme sets by the priority tables. `Less` means `a` is
    /// preferred.
    ///
    /// Each table ranks a set by the first entry it contains; a set with no
    /// entry ranks after all of them. Later tables only break ties.
    pub fn compare_grammemes(&self, a: GrammemeMask, b: GrammemeMask) -> Ordering {
        for table in &self.grammeme_priorities {
            let rank = |g: GrammemeMask| {
                table
                    .iter()
                    .position(|&value| grammeme::contains_all(g, value))
                    .unwrap_or(table.len())
            };
            match rank(a).cmp(&rank(b)) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }

    /// False when `grammemes` covers one of the ignore sets.
    pub fn is_important(&self, grammemes: GrammemeMask) -> bool {
        !self
            .ignore_grammeme_sets
            .iter()
            .any(|&set| grammeme::contains_all(grammemes, set))
    }

    /// Every reading of `word` the patterns allow.
    ///
    /// A pattern without inflections contributes its parts of speech alone.
    pub fn inflection_grammemes<'a>(
        &self,
        word: &str,
        word_grammemes: GrammemeMask,
        patterns: &[InflectionPattern<'a>],
    ) -> Result<Vec<InflectionGrammemes<'a>>, EngineError> {
        let mut results = Vec::new();
        for pattern in patterns {
            if pattern.num_inflections() == 0 {
                results.push(InflectionGrammemes::new(pattern.parts_of_speech(), None));
                continue;
            }
            for inflection in pattern.inflections_for_surface_form(word, word_grammemes)? {
                let grammemes = inflection.grammemes() | pattern.parts_of_speech();
                results.push(InflectionGrammemes::new(grammemes, Some(inflection)));
            }
        }
        Ok(results)
    }

    pub fn filter_inflection_grammemes<'a>(
        &self,
        items: Vec<InflectionGrammemes<'a>>,
    ) -> Vec<InflectionGrammemes<'a>> {
        items
            .into_iter()
            .filter(|item| self.is_important(item.grammemes))
            .collect()
    }

    fn patterns_for_word(&self, word: &str) -> Result<Vec<InflectionPattern<'_>>, EngineError> {
        match self.dictionary.inflector() {
            Some(inflector) => inflector.inflection_patterns_for_word(word),
            None => Ok(Vec::new()),
        }
    }

    /// All grammeme sets of `word`; empty when the word is unknown.
    pub fn word_grammemesets(&self, word: &str) -> Result<Vec<GrammemeMask>, EngineError> {
        let Some(word_grammemes) = self.dictionary.combined_binary_type(word)? else {
            return Ok(Vec::new());
        };
        let patterns = self.patterns_for_word(word)?;
        let sets: Vec<GrammemeMask> = self
            .inflection_grammemes(word, word_grammemes, &patterns)?
            .into_iter()
            .map(|item| item.grammemes)
            .collect();
        if sets.is_empty() {
            return Ok(vec![word_grammemes]);
        }
        Ok(sets)
    }

    /// Readings of `word`, unimportant ones removed, most preferred first.
    pub fn analyze(&self, word: &str) -> Result<Vec<InflectionGrammemes<'_>>, EngineError> {
        let Some(word_grammemes) = self.dictionary.combined_binary_type(word)? else {
            return Ok(Vec::new());
        };
        let patterns = self.patterns_for_word(word)?;
        let mut items = self.inflection_grammemes(word, word_grammemes, &patterns)?;
        if items.is_empty() {
            items.push(InflectionGrammemes::new(word_grammemes, None));
        }
        let mut items = self.filter_inflection_grammemes(items);
        items.sort_by(|a, b| self.compare_grammemes(a.grammemes, b.grammemes));
        Ok(items)
    }
}

impl fmt::Debug for MorphologicalAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MorphologicalAnalyzer")
            .field("dictionary", &self.dictionary)
            .field("lemma_attributes", &self.lemma_attributes.len())
            .field("grammeme_priorities", &self.grammeme_priorities.len())
            .field("ignore_grammeme_sets", &self.ignore_grammeme_sets.len())
            .finish()
    }
}
