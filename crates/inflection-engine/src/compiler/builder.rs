// Dictionary compiler: lexicon source to file image
//
// The builder fills in the same in-memory sections the reader produces and
// serializes them through the reader's own writer, so both sides share one
// layout definition.

use std::collections::{BTreeMap, BTreeSet};
use std::hash::Hash;
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use inflection_core::grammeme::{self, GrammemeMask, MAX_GRAMMEMES};
use inflection_core::locale::Locale;
use inflection_dict::compressed::calculate_bit_width;
use inflection_dict::{
    ByteWriter, CompressedArray, DictError, RecordLayout, StringArrayContainer, StringContainer,
    TrieMap,
};

use super::source::{LexiconSource, WordEntry};
use crate::dictionary::mmapped::{
    DATA_FIELDS, LANGUAGE_CODE_LENGTH, LexicalDictionary, LexiconSections, MAP_ENTRY_FIELDS,
};
use crate::inflector::PatternStore;
use crate::inflector::store::{INFLECTION_FIELDS, PREFIX_FIELDS, PatternSections, RUN_FIELDS};
use crate::{EngineError, INFLECTION_KEY};

/// Property map entries and suffix runs are stored in 32-bit slots.
const MAX_SLOT_WIDTH: u32 = 32;

/// Values in first-seen order with their positions.
struct Distinct<T> {
    values: Vec<T>,
    positions: HashMap<T, usize>,
}

impl<T: Copy + Eq + Hash> Distinct<T> {
    fn new() -> Self {
        Distinct {
            values: Vec::new(),
            positions: HashMap::new(),
        }
    }

    fn insert(&mut self, value: T) -> usize {
        *self.positions.entry(value).or_insert_with(|| {
            self.values.push(value);
            self.values.len() - 1
        })
    }
}

/// Compiles a [`LexiconSource`] into a dictionary file image.
#[derive(Debug)]
pub struct DictionaryBuilder<'a> {
    source: &'a LexiconSource,
}

impl<'a> DictionaryBuilder<'a> {
    pub fn new(source: &'a LexiconSource) -> Self {
        DictionaryBuilder { source }
    }

    /// Serialize the complete dictionary.
    pub fn build(&self) -> Result<Vec<u8>, EngineError> {
        let lexicon = self.build_lexicon()?;
        let mut out = ByteWriter::new();
        lexicon.serialize(&mut out)?;
        tracing::debug!(
            language = lexicon.language(),
            bytes = out.position(),
            "compiled dictionary"
        );
        Ok(out.into_bytes())
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), EngineError> {
        let bytes = self.build()?;
        std::fs::write(path, bytes).map_err(DictError::from)?;
        Ok(())
    }

    fn build_lexicon(&self) -> Result<LexicalDictionary, EngineError> {
        let source = self.source;
        check_language(&source.language)?;
        check_words(&source.words)?;

        let types = StringArrayContainer::new(source.grammeme_names())?;
        if types.size() > MAX_GRAMMEMES {
            return Err(EngineError::InvalidLexicon(format!(
                "{} grammemes, at most {MAX_GRAMMEMES} are supported",
                types.size()
            )));
        }
        let inflector = self.pattern_store(&types)?;

        // Property tables
        let has_inflections = source.words.iter().any(|w| !w.inflections.is_empty());
        let mut names: BTreeSet<&str> = source
            .words
            .iter()
            .flat_map(|w| w.properties.keys().map(String::as_str))
            .collect();
        if has_inflections {
            names.insert(INFLECTION_KEY);
        }
        let property_names = StringArrayContainer::new(&names)?;
        let property_values = StringContainer::new(
            source
                .words
                .iter()
                .flat_map(|w| w.properties.values().flatten()),
        )?;

        let word_maps = source
            .words
            .iter()
            .map(|w| word_map(w, &property_names, &property_values, inflector.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        let max_key = word_maps.iter().flatten().map(|(key, _)| *key).max();
        let max_values = word_maps.iter().flatten().map(|(_, ids)| ids.len()).max();
        let map_layout = RecordLayout::new(
            MAP_ENTRY_FIELDS,
            [
                calculate_bit_width(max_key.unwrap_or(0) as u64),
                calculate_bit_width(max_values.unwrap_or(0) as u64),
                calculate_bit_width(property_names.size() as u64),
            ],
        )?;
        check_slot_width("property map entry", map_layout.total_width())?;

        // Slot 0 is reserved: a zero offset means the word has no properties
        let mut property_maps: Vec<i32> = vec![0];
        let mut map_offsets: HashMap<Vec<i32>, usize> = HashMap::new();
        let mut word_offsets = Vec::with_capacity(word_maps.len());
        for entries in &word_maps {
            if entries.is_empty() {
                word_offsets.push(0);
                continue;
            }
            let slots = encode_map(entries, &map_layout)?;
            let offset = match map_offsets.get(&slots) {
                Some(&offset) => offset,
                None => {
                    let offset = property_maps.len();
                    property_maps.extend_from_slice(&slots);
                    map_offsets.insert(slots, offset);
                    offset
                }
            };
            word_offsets.push(offset);
        }

        // Type singletons; index 0 stands for "no grammemes"
        let mut singletons = Distinct::new();
        singletons.insert(0i64);
        let mut word_types = Vec::with_capacity(source.words.len());
        for entry in &source.words {
            let mask = grammeme_mask(&types, &entry.grammemes)?;
            word_types.push(if mask == 0 {
                0
            } else {
                singletons.insert(mask as i64)
            });
        }

        let data_layout = RecordLayout::fitting(
            DATA_FIELDS,
            [
                word_types.iter().copied().max().unwrap_or(0) as u64,
                word_offsets.iter().copied().max().unwrap_or(0) as u64,
            ],
        )?;
        let data = word_types
            .iter()
            .zip(&word_offsets)
            .map(|(&ty, &offset)| data_layout.encode([ty as u64, offset as u64]))
            .collect::<Result<Vec<u64>, _>>()?;

        let mut distinct = Distinct::new();
        let indexes: Vec<u64> = data.iter().map(|&d| distinct.insert(d) as u64).collect();
        let double_stage = prefers_double_stage(
            data.len(),
            distinct.values.len(),
            data_layout.total_width(),
        );
        let (word_values, data_singletons) = if double_stage {
            (indexes, CompressedArray::from_values(&distinct.values)?)
        } else {
            (data, CompressedArray::from_values(&[])?)
        };
        let words = TrieMap::build(
            source
                .words
                .iter()
                .map(|w| w.word.as_str())
                .zip(word_values),
        )?;

        tracing::debug!(
            words = source.words.len(),
            grammemes = types.size(),
            type_singletons = singletons.values.len(),
            property_maps = map_offsets.len(),
            double_stage,
            "built lexicon sections"
        );

        Ok(LexicalDictionary::from_sections(LexiconSections {
            language: source.language.clone(),
            types,
            data_layout,
            map_layout,
            words,
            type_singletons: singletons.values,
            data_singletons,
            property_names,
            property_values,
            property_maps: CompressedArray::from_values(&property_maps)?,
            inflector,
        }))
    }

    fn pattern_store(
        &self,
        types: &StringArrayContainer,
    ) -> Result<Option<PatternStore>, EngineError> {
        let patterns = &self.source.patterns;
        if patterns.is_empty() {
            return Ok(None);
        }
        let mut seen = HashSet::new();
        for pattern in patterns {
            if !seen.insert(pattern.id.as_str()) {
                return Err(EngineError::InvalidLexicon(format!(
                    "duplicate pattern `{}`",
                    pattern.id
                )));
            }
        }

        // Part of speech sets come first in the grammeme pattern table
        let mut grammeme_patterns = Distinct::new();
        let pos_indexes = patterns
            .iter()
            .map(|p| Ok(grammeme_patterns.insert(grammeme_mask(types, &p.pos)? as i64)))
            .collect::<Result<Vec<_>, EngineError>>()?;
        let inflection_indexes = patterns
            .iter()
            .map(|p| {
                p.inflections
                    .iter()
                    .map(|i| Ok(grammeme_patterns.insert(grammeme_mask(types, &i.grammemes)? as i64)))
                    .collect::<Result<Vec<_>, EngineError>>()
            })
            .collect::<Result<Vec<_>, EngineError>>()?;

        let suffixes = StringContainer::new(patterns.iter().flat_map(|p| {
            p.lemma_suffixes
                .iter()
                .chain(p.inflections.iter().map(|i| &i.suffix))
        }))?;
        let suffix_id = |suffix: &str| -> Result<u64, EngineError> {
            Ok(suffixes.get_identifier(suffix)? as u64)
        };

        let frequencies: Vec<i32> = patterns
            .iter()
            .map(|p| p.frequency)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let frequency_index = |frequency: i32| frequencies.binary_search(&frequency).unwrap_or(0);

        let largest = |values: &mut dyn Iterator<Item = usize>| values.max().unwrap_or(0) as u64;
        let prefix_layout = RecordLayout::fitting(
            PREFIX_FIELDS,
            [
                largest(&mut patterns.iter().map(|p| p.inflections.len())),
                largest(&mut patterns.iter().map(|p| p.lemma_suffixes.len())),
                largest(&mut pos_indexes.iter().copied()),
                largest(&mut patterns.iter().map(|p| frequency_index(p.frequency))),
            ],
        )?;
        let inflection_layout = RecordLayout::fitting(
            INFLECTION_FIELDS,
            [
                largest(&mut inflection_indexes.iter().flatten().copied()),
                suffixes.size().saturating_sub(1) as u64,
            ],
        )?;

        let mut inflections: Vec<i64> = Vec::new();
        let mut record_starts = Vec::with_capacity(patterns.len());
        for ((pattern, &pos_index), grammeme_indexes) in
            patterns.iter().zip(&pos_indexes).zip(&inflection_indexes)
        {
            let start = i32::try_from(inflections.len()).map_err(|_| {
                EngineError::InvalidLexicon("inflection table exceeds 2^31 entries".to_string())
            })?;
            record_starts.push((pattern.id.as_str(), start));
            inflections.push(prefix_layout.encode([
                pattern.inflections.len() as u64,
                pattern.lemma_suffixes.len() as u64,
                pos_index as u64,
                frequency_index(pattern.frequency) as u64,
            ])? as i64);
            for lemma in &pattern.lemma_suffixes {
                inflections.push(suffix_id(lemma)? as i64);
            }
            for (inflection, &grammemes) in pattern.inflections.iter().zip(grammeme_indexes) {
                inflections.push(
                    inflection_layout.encode([grammemes as u64, suffix_id(&inflection.suffix)?])?
                        as i64,
                );
            }
        }
        let pattern_map = TrieMap::build(record_starts)?;

        let (run_layout, suffix_runs, suffix_index) = if self.source.suffix_index {
            let mut by_suffix: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
            for pattern in patterns {
                let id = pattern_map
                    .key_id(&pattern.id)
                    .ok_or_else(|| DictError::NotFound(pattern.id.clone()))?;
                for inflection in &pattern.inflections {
                    by_suffix.entry(&inflection.suffix).or_default().insert(id);
                }
            }
            let mut index: Vec<i32> = Vec::new();
            let mut runs = Vec::with_capacity(by_suffix.len());
            for (suffix, ids) in &by_suffix {
                runs.push((*suffix, [ids.len() as u64, index.len() as u64]));
                index.extend(ids.iter().map(|&id| id as i32));
            }
            let run_layout = RecordLayout::fitting(
                RUN_FIELDS,
                [
                    runs.iter().map(|(_, [count, _])| *count).max().unwrap_or(0),
                    runs.iter().map(|(_, [_, offset])| *offset).max().unwrap_or(0),
                ],
            )?;
            check_slot_width("suffix run", run_layout.total_width())?;
            let encoded = runs
                .into_iter()
                .map(|(suffix, fields)| Ok((suffix, run_layout.encode(fields)? as u32 as i32)))
                .collect::<Result<Vec<_>, DictError>>()?;
            (
                run_layout,
                TrieMap::build(encoded)?,
                CompressedArray::from_values(&index)?,
            )
        } else {
            (
                RecordLayout::new(RUN_FIELDS, [0, 0])?,
                TrieMap::build(std::iter::empty::<(&str, i32)>())?,
                CompressedArray::from_values(&[])?,
            )
        };

        tracing::debug!(
            patterns = patterns.len(),
            grammeme_patterns = grammeme_patterns.values.len(),
            suffixes = suffixes.size(),
            suffix_index = self.source.suffix_index,
            "built pattern store"
        );

        Ok(Some(PatternStore::from_sections(PatternSections {
            grammeme_patterns: grammeme_patterns.values,
            suffixes,
            inflections: CompressedArray::from_values(&inflections)?,
            inflection_layout,
            run_layout,
            frequencies,
            patterns: pattern_map,
            suffix_runs,
            suffix_index,
            prefix_layout,
        })))
    }
}

fn check_language(language: &str) -> Result<(), EngineError> {
    if language.is_empty() || language.len() > LANGUAGE_CODE_LENGTH {
        return Err(EngineError::InvalidLexicon(format!(
            "language code `{language}` must be 1 to {LANGUAGE_CODE_LENGTH} bytes"
        )));
    }
    Locale::parse(language)
        .map_err(|e| EngineError::InvalidLexicon(format!("language code `{language}`: {e}")))?;
    Ok(())
}

fn check_words(words: &[WordEntry]) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for entry in words {
        if !seen.insert(entry.word.as_str()) {
            return Err(EngineError::InvalidLexicon(format!(
                "duplicate word `{}`",
                entry.word
            )));
        }
        if entry.properties.contains_key(INFLECTION_KEY) {
            return Err(EngineError::InvalidLexicon(format!(
                "word `{}` sets the reserved `{INFLECTION_KEY}` property",
                entry.word
            )));
        }
    }
    Ok(())
}

fn check_slot_width(what: &str, width: u32) -> Result<(), EngineError> {
    if width > MAX_SLOT_WIDTH {
        return Err(EngineError::InvalidLexicon(format!(
            "{what} needs {width} bits, at most {MAX_SLOT_WIDTH} fit"
        )));
    }
    Ok(())
}

fn grammeme_mask(types: &StringArrayContainer, names: &[String]) -> Result<GrammemeMask, EngineError> {
    names.iter().try_fold(0, |mask, name| {
        let id = types.get_identifier(name)?;
        let bit = grammeme::identifier_to_bit(id).ok_or_else(|| {
            EngineError::InvalidLexicon(format!("grammeme `{name}` has no bit"))
        })?;
        Ok(mask | bit)
    })
}

/// Property entries of one word as (key id, value ids), sorted by key.
fn word_map(
    entry: &WordEntry,
    names: &StringArrayContainer,
    values: &StringContainer,
    inflector: Option<&PatternStore>,
) -> Result<Vec<(usize, Vec<usize>)>, EngineError> {
    let mut map = Vec::with_capacity(entry.properties.len() + 1);
    for (name, list) in &entry.properties {
        if list.is_empty() {
            continue;
        }
        let ids = list
            .iter()
            .map(|value| values.get_identifier(value))
            .collect::<Result<Vec<_>, _>>()?;
        map.push((names.get_identifier(name)?, ids));
    }
    if !entry.inflections.is_empty() {
        let ids = entry
            .inflections
            .iter()
            .map(|pattern| {
                inflector
                    .and_then(|store| store.pattern_id(pattern))
                    .ok_or_else(|| EngineError::UnknownPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        map.push((names.get_identifier(INFLECTION_KEY)?, ids));
    }
    map.sort_by_key(|(key, _)| *key);
    Ok(map)
}

/// Key entries followed by the value ids of every key.
fn encode_map(
    entries: &[(usize, Vec<usize>)],
    layout: &RecordLayout<3>,
) -> Result<Vec<i32>, EngineError> {
    let mut slots = Vec::with_capacity(entries.len());
    for (i, (key, ids)) in entries.iter().enumerate() {
        let map_len = if i == 0 { entries.len() } else { 0 };
        let raw = layout.encode([*key as u64, ids.len() as u64, map_len as u64])?;
        slots.push(raw as u32 as i32);
    }
    for (_, ids) in entries {
        for &id in ids {
            slots.push(i32::try_from(id).map_err(|_| {
                EngineError::InvalidLexicon(format!("property value id {id} exceeds 31 bits"))
            })?);
        }
    }
    Ok(slots)
}

/// Two-stage lookup stores each distinct data word once and indexes it.
fn prefers_double_stage(words: usize, distinct: usize, data_width: u32) -> bool {
    if distinct == 0 {
        return false;
    }
    let index_width = calculate_bit_width(distinct as u64 - 1) as usize;
    let single = words * data_width as usize;
    let double = distinct * data_width as usize + words * index_width;
    double < single
}
