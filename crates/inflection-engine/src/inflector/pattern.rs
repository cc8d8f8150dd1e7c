// Inflection pattern view, lemma selection and reinflection

use std::cmp::Ordering;
use std::fmt;

use inflection_core::grammeme::{self, GrammemeMask};
use inflection_dict::DictError;

use super::Inflector;
use super::inflection::Inflection;
use super::store::PatternRecord;
use crate::EngineError;

/// A pattern record decoded from the store. Cheap to copy.
#[derive(Clone, Copy)]
pub struct InflectionPattern<'a> {
    inflector: Inflector<'a>,
    id: usize,
    record: PatternRecord,
    parts_of_speech: GrammemeMask,
}

/// Ranking key of a reinflection candidate; larger is better.
type CandidateScore = (i64, u32, i64);

/// Suffix lengths are ranked in UTF-16 code units.
fn suffix_len(suffix: &str) -> usize {
    suffix.encode_utf16().count()
}

impl<'a> InflectionPattern<'a> {
    pub(crate) fn new(
        inflector: Inflector<'a>,
        id: usize,
        record: PatternRecord,
        parts_of_speech: GrammemeMask,
    ) -> Self {
        InflectionPattern {
            inflector,
            id,
            record,
            parts_of_speech,
        }
    }

    /// Dense pattern id within the store.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Pattern name, as listed in word entries.
    pub fn identifier(&self) -> Result<String, EngineError> {
        Ok(self.inflector.store().pattern_name(self.id)?)
    }

    /// Corpus frequency of the pattern.
    pub fn frequency(&self) -> Result<i32, EngineError> {
        Ok(self.inflector.store().frequency(self.record.frequency_index)?)
    }

    pub fn parts_of_speech(&self) -> GrammemeMask {
        self.parts_of_speech
    }

    pub fn num_inflections(&self) -> usize {
        self.record.num_inflections
    }

    pub fn record(&self) -> &PatternRecord {
        &self.record
    }

    pub fn inflection_at(&self, index: usize) -> Result<Inflection<'a>, EngineError> {
        if index >= self.record.num_inflections {
            return Err(DictError::IndexOutOfBounds {
                index,
                len: self.record.num_inflections,
            }
            .into());
        }
        let store = self.inflector.store();
        let (grammemes, suffix_id) =
            store.inflection_entry(self.record.inflections_offset() + index)?;
        let suffix = store.suffix(suffix_id)?;
        Ok(Inflection::new(*self, suffix_id, suffix, grammemes))
    }

    /// Every inflection in stored order.
    pub fn inflections(&self) -> Result<Vec<Inflection<'a>>, EngineError> {
        (0..self.record.num_inflections)
            .map(|i| self.inflection_at(i))
            .collect()
    }

    fn lemma_suffix_ids(&self) -> Result<Vec<usize>, EngineError> {
        let store = self.inflector.store();
        let offset = self.record.lemma_suffixes_offset();
        (offset..offset + self.record.lemma_suffixes_len)
            .map(|slot| store.slot(slot).map_err(EngineError::from))
            .collect()
    }

    /// Suffixes of the lemma forms of this pattern.
    pub fn lemma_suffixes(&self) -> Result<Vec<String>, EngineError> {
        let store = self.inflector.store();
        self.lemma_suffix_ids()?
            .into_iter()
            .map(|id| store.suffix(id).map_err(EngineError::from))
            .collect()
    }

    /// Inflections whose suffix is one of the lemma suffixes.
    pub fn lemma_suffix_matches(&self) -> Result<Vec<Inflection<'a>>, EngineError> {
        let lemma_ids = self.lemma_suffix_ids()?;
        Ok(self
            .inflections()?
            .into_iter()
            .filter(|inflection| lemma_ids.contains(&inflection.suffix_id()))
            .collect())
    }

    pub fn contains_suffix(&self, suffix: &str) -> Result<bool, EngineError> {
        Ok(self.inflections()?.iter().any(|i| i.suffix() == suffix))
    }

    /// True when the pattern covers the part of speech named `pos`.
    pub fn contains_parts_of_speech(&self, pos: &str) -> bool {
        self.inflector
            .dictionary()
            .lexicon()
            .value_of_type(pos)
            .is_some_and(|mask| grammeme::intersects(self.parts_of_speech, mask))
    }

    /// Index of the first mask sharing a bit with the pattern's parts of
    /// speech; the list length when none does.
    pub fn first_containing_part_of_speech(&self, parts_of_speech: &[GrammemeMask]) -> usize {
        parts_of_speech
            .iter()
            .position(|&pos| grammeme::intersects(self.parts_of_speech, pos))
            .unwrap_or(parts_of_speech.len())
    }

    /// Inflections whose grammemes fit the named constraints.
    ///
    /// With `is_superset` the constraints must cover every grammeme of the
    /// inflection; otherwise the inflection must cover every constraint.
    pub fn constrain<S: AsRef<str>>(
        &self,
        constraints: &[S],
        is_superset: bool,
    ) -> Result<Vec<Inflection<'a>>, EngineError> {
        let mask = self
            .inflector
            .dictionary()
            .lexicon()
            .values_of_types(constraints);
        Ok(self
            .inflections()?
            .into_iter()
            .filter(|inflection| {
                let g = inflection.grammemes();
                if is_superset {
                    grammeme::contains_all(mask, g)
                } else {
                    grammeme::contains_all(g, mask)
                }
            })
            .collect())
    }

    /// Inflections that could have produced `surface_form`.
    ///
    /// An inflection qualifies when the word's grammemes cover its own and
    /// its suffix ends the surface form. Only the longest qualifying suffix
    /// length is kept.
    pub fn inflections_for_surface_form(
        &self,
        surface_form: &str,
        word_grammemes: GrammemeMask,
    ) -> Result<Vec<Inflection<'a>>, EngineError> {
        let mut results = Vec::new();
        let mut longest = None;
        for inflection in self.inflections()? {
            if !grammeme::contains_all(word_grammemes, inflection.grammemes())
                || !surface_form.ends_with(inflection.suffix())
            {
                continue;
            }
            let len = suffix_len(inflection.suffix());
            match longest {
                Some(max) if len < max => continue,
                Some(max) if len == max => {}
                _ => {
                    results.clear();
                    longest = Some(len);
                }
            }
            results.push(inflection);
        }
        Ok(results)
    }

    /// The inflection best representing the lemma of this pattern.
    ///
    /// Candidates are ranked by the lemma attributes in order (an earlier
    /// attribute outweighs all later ones together), then by the number of
    /// grammemes shared with `requested`, then by fewer grammemes.
    pub fn select_lemma_inflection(
        &self,
        requested: GrammemeMask,
        lemma_attributes: &[GrammemeMask],
    ) -> Result<Option<Inflection<'a>>, EngineError> {
        let mut best: Option<CandidateScore> = None;
        let mut selected = Vec::new();
        for inflection in self.inflections()? {
            let g = inflection.grammemes();
            let score = (
                grammeme::priority_score(g, lemma_attributes),
                grammeme::count(g & requested),
                -i64::from(grammeme::count(g)),
            );
            match best {
                Some(current) if score < current => continue,
                Some(current) if score == current => {}
                _ => {
                    best = Some(score);
                    selected.clear();
                }
            }
            selected.push(inflection);
        }
        self.matching_lemma_inflection(selected)
    }

    /// Break a tie between equally scored lemma candidates: a lemma suffix
    /// wins, else the first shortest suffix.
    fn matching_lemma_inflection(
        &self,
        mut candidates: Vec<Inflection<'a>>,
    ) -> Result<Option<Inflection<'a>>, EngineError> {
        if candidates.len() <= 1 {
            return Ok(candidates.pop());
        }
        let mut lemma_suffixes = self.lemma_suffixes()?;
        if lemma_suffixes.is_empty() {
            // A pattern without lemma suffixes uses the bare stem
            lemma_suffixes.push(String::new());
        }
        let mut shortest = 0;
        for (index, candidate) in candidates.iter().enumerate() {
            if suffix_len(candidate.suffix()) < suffix_len(candidates[shortest].suffix()) {
                shortest = index;
            }
            if lemma_suffixes.iter().any(|s| s == candidate.suffix()) {
                return Ok(Some(candidate.clone()));
            }
        }
        Ok(Some(candidates.swap_remove(shortest)))
    }

    /// Rewrite `surface_form`, which has grammemes `from`, into the form
    /// carrying `to`.
    pub fn reinflect(
        &self,
        from: GrammemeMask,
        to: GrammemeMask,
        surface_form: &str,
    ) -> Result<Option<String>, EngineError> {
        self.reinflect_with_optional_constraints(from, to, &[], surface_form)
    }

    /// Like [`reinflect`](Self::reinflect), preferring forms that also carry
    /// the `optional` masks, earlier masks first.
    pub fn reinflect_with_optional_constraints(
        &self,
        from: GrammemeMask,
        to: GrammemeMask,
        optional: &[GrammemeMask],
        surface_form: &str,
    ) -> Result<Option<String>, EngineError> {
        if to == 0 || grammeme::contains_all(from, to) {
            return Ok(Some(surface_form.to_string()));
        }

        // Longest strippable suffix as (UTF-16 length, byte length)
        let mut stem_suffix = (0, 0);
        let mut best: Option<(CandidateScore, Inflection<'a>)> = None;
        for inflection in self.inflections()? {
            let g = inflection.grammemes();
            let suffix = inflection.suffix();
            if (from == 0 || grammeme::contains_all(from, g))
                && suffix_len(suffix) > stem_suffix.0
                && surface_form.ends_with(suffix)
            {
                stem_suffix = (suffix_len(suffix), suffix.len());
            }
            if !grammeme::contains_all(g, to) {
                continue;
            }
            let score = (
                grammeme::priority_score(g, optional),
                grammeme::count(g & from),
                -(i64::from(grammeme::count(g)) - i64::from(grammeme::count(to))),
            );
            tracing::trace!(
                suffix,
                grammemes = g,
                matches = score.1,
                optional_score = score.0,
                "reinflection candidate"
            );
            if best.as_ref().is_none_or(|(current, _)| score > *current) {
                best = Some((score, inflection));
            }
        }

        // `ends_with` held for the stripped suffix, so the cut is on a char boundary
        Ok(best.map(|(_, inflection)| {
            let stem = &surface_form[..surface_form.len() - stem_suffix.1];
            format!("{stem}{}", inflection.suffix())
        }))
    }

    /// Order by pattern name.
    pub fn cmp_identifier(&self, other: &Self) -> Result<Ordering, EngineError> {
        Ok(self.identifier()?.cmp(&other.identifier()?))
    }
}

impl PartialEq for InflectionPattern<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.inflector.store(), other.inflector.store()) && self.id == other.id
    }
}

impl Eq for InflectionPattern<'_> {}

impl fmt::Debug for InflectionPattern<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InflectionPattern")
            .field("id", &self.id)
            .field("parts_of_speech", &format_args!("{:#x}", self.parts_of_speech))
            .field("num_inflections", &self.record.num_inflections)
            .field("lemma_suffixes_len", &self.record.lemma_suffixes_len)
            .finish()
    }
}
