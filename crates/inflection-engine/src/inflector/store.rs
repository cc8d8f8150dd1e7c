// Inflection pattern store
//
// Section layout, in order:
//   i64 version, i16 endianness marker, i16 options
//   grammeme patterns (i32 count, i64 each; part of speech sets first)
//   suffix table (StringContainer)
//   inflections array: per pattern a prefix word, lemma suffix ids, then
//     one [grammemes index][suffix id] word per inflection
//   i8 x 4 widths: grammemes index, suffix id, suffix run offset, suffix run length
//   frequencies (i32 count, i32 each)
//   pattern identifier -> record start
//   suffix -> [run length][run offset] into the suffix index
//   suffix index: pattern ids grouped by suffix (empty when not built)
//   i8 x 5 widths: frequency, part of speech, lemma suffix count,
//     inflection count, prefix (reserved)

use inflection_core::grammeme::GrammemeMask;
use inflection_dict::{
    ByteWriter, CompressedArray, Cursor, DictError, PodArray, RecordLayout, StringContainer,
    TrieMap,
};

use crate::dictionary::mmapped::ENDIANNESS_MARKER;

/// Bump when the section layout changes.
pub const INFLECTOR_VERSION: i64 = 3;

pub(crate) const PREFIX_FIELDS: [&str; 4] =
    ["num_inflections", "lemma_suffixes_len", "pos", "frequency"];
pub(crate) const INFLECTION_FIELDS: [&str; 2] = ["grammemes", "suffix"];
pub(crate) const RUN_FIELDS: [&str; 2] = ["count", "offset"];

/// Decoded prefix word of one pattern record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternRecord {
    pub start: usize,
    pub num_inflections: usize,
    pub lemma_suffixes_len: usize,
    pub pos_index: usize,
    pub frequency_index: usize,
}

impl PatternRecord {
    pub fn lemma_suffixes_offset(&self) -> usize {
        self.start + 1
    }

    pub fn inflections_offset(&self) -> usize {
        self.start + 1 + self.lemma_suffixes_len
    }
}

/// Everything a pattern store is made of; the compiler fills one in.
pub(crate) struct PatternSections {
    pub grammeme_patterns: Vec<i64>,
    pub suffixes: StringContainer,
    pub inflections: CompressedArray<i64>,
    pub inflection_layout: RecordLayout<2>,
    pub run_layout: RecordLayout<2>,
    pub frequencies: Vec<i32>,
    pub patterns: TrieMap<i32>,
    pub suffix_runs: TrieMap<i32>,
    pub suffix_index: CompressedArray<i32>,
    pub prefix_layout: RecordLayout<4>,
}

/// Pattern records, their inflections and the suffix index of a dictionary.
#[derive(Debug)]
pub struct PatternStore {
    grammeme_patterns: PodArray<i64>,
    suffixes: StringContainer,
    inflections: CompressedArray<i64>,
    inflection_layout: RecordLayout<2>,
    run_layout: RecordLayout<2>,
    frequencies: PodArray<i32>,
    patterns: TrieMap<i32>,
    suffix_runs: TrieMap<i32>,
    suffix_index: CompressedArray<i32>,
    prefix_layout: RecordLayout<4>,
}

impl PatternStore {
    pub(crate) fn from_sections(sections: PatternSections) -> Self {
        PatternStore {
            grammeme_patterns: PodArray::from_vec(sections.grammeme_patterns),
            suffixes: sections.suffixes,
            inflections: sections.inflections,
            inflection_layout: sections.inflection_layout,
            run_layout: sections.run_layout,
            frequencies: PodArray::from_vec(sections.frequencies),
            patterns: sections.patterns,
            suffix_runs: sections.suffix_runs,
            suffix_index: sections.suffix_index,
            prefix_layout: sections.prefix_layout,
        }
    }

    pub fn read_from(cursor: &mut Cursor) -> Result<Self, DictError> {
        let version: i64 = cursor.read()?;
        if version != INFLECTOR_VERSION {
            return Err(DictError::IncompatibleVersion {
                found: version,
                expected: INFLECTOR_VERSION,
            });
        }
        let marker: i16 = cursor.read()?;
        if marker != ENDIANNESS_MARKER {
            return Err(DictError::EndiannessMismatch { found: marker });
        }
        let _options: i16 = cursor.read()?;

        let pattern_count = cursor.read_count()?;
        let grammeme_patterns = cursor.read_pod_array::<i64>(pattern_count)?;
        let suffixes = StringContainer::read_from(cursor)?;
        let inflections = CompressedArray::<i64>::read_from(cursor)?;
        let [grammemes_bits, suffix_bits, run_offset_bits, run_len_bits]: [i8; 4] =
            cursor.read()?;
        let frequency_count = cursor.read_count()?;
        let frequencies = cursor.read_pod_array::<i32>(frequency_count)?;
        let patterns = TrieMap::<i32>::read_from(cursor)?;
        let suffix_runs = TrieMap::<i32>::read_from(cursor)?;
        let suffix_index = CompressedArray::<i32>::read_from(cursor)?;
        let [frequency_bits, pos_bits, lemma_bits, count_bits, _prefix_bits]: [i8; 5] =
            cursor.read()?;

        Ok(PatternStore {
            grammeme_patterns,
            suffixes,
            inflections,
            inflection_layout: RecordLayout::from_header(
                INFLECTION_FIELDS,
                [grammemes_bits, suffix_bits],
            )?,
            run_layout: RecordLayout::from_header(RUN_FIELDS, [run_len_bits, run_offset_bits])?,
            frequencies,
            patterns,
            suffix_runs,
            suffix_index,
            prefix_layout: RecordLayout::from_header(
                PREFIX_FIELDS,
                [count_bits, lemma_bits, pos_bits, frequency_bits],
            )?,
        })
    }

    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        out.put(INFLECTOR_VERSION);
        out.put(ENDIANNESS_MARKER);
        out.put(0i16);
        out.put_count(self.grammeme_patterns.len())?;
        out.put_array(&self.grammeme_patterns);
        self.suffixes.serialize(out)?;
        self.inflections.serialize(out)?;
        let [grammemes_bits, suffix_bits] = self.inflection_layout.header_widths();
        let [run_len_bits, run_offset_bits] = self.run_layout.header_widths();
        out.put([grammemes_bits, suffix_bits, run_offset_bits, run_len_bits]);
        out.put_count(self.frequencies.len())?;
        out.put_array(&self.frequencies);
        self.patterns.serialize(out)?;
        self.suffix_runs.serialize(out)?;
        self.suffix_index.serialize(out)?;
        let [count_bits, lemma_bits, pos_bits, frequency_bits] =
            self.prefix_layout.header_widths();
        out.put([frequency_bits, pos_bits, lemma_bits, count_bits, 0i8]);
        Ok(())
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn pattern_id(&self, name: &str) -> Option<usize> {
        self.patterns.key_id(name)
    }

    pub fn pattern_name(&self, id: usize) -> Result<String, DictError> {
        self.patterns.key(id)
    }

    /// Decode the prefix word of pattern `id`.
    pub fn record(&self, id: usize) -> Result<PatternRecord, DictError> {
        let start = usize::try_from(self.patterns.value(id)?)
            .map_err(|_| DictError::Corrupt(format!("negative record start for pattern {id}")))?;
        let [num_inflections, lemma_suffixes_len, pos_index, frequency_index] =
            self.prefix_layout.decode(self.inflections.read(start)? as u64)?;
        Ok(PatternRecord {
            start,
            num_inflections: num_inflections as usize,
            lemma_suffixes_len: lemma_suffixes_len as usize,
            pos_index: pos_index as usize,
            frequency_index: frequency_index as usize,
        })
    }

    pub fn grammeme_pattern(&self, index: usize) -> Result<GrammemeMask, DictError> {
        Ok(self.grammeme_patterns.get(index)? as GrammemeMask)
    }

    pub fn frequency(&self, index: usize) -> Result<i32, DictError> {
        self.frequencies.get(index)
    }

    /// Raw slot of the inflections array, used for lemma suffix ids.
    pub fn slot(&self, index: usize) -> Result<usize, DictError> {
        Ok(self.inflections.read(index)? as usize)
    }

    /// Grammemes and suffix id of the inflection word at `index`.
    pub fn inflection_entry(&self, index: usize) -> Result<(GrammemeMask, usize), DictError> {
        let [grammemes, suffix] = self
            .inflection_layout
            .decode(self.inflections.read(index)? as u64)?;
        Ok((self.grammeme_pattern(grammemes as usize)?, suffix as usize))
    }

    pub fn suffix(&self, id: usize) -> Result<String, DictError> {
        self.suffixes.get_string(id)
    }

    pub fn suffix_id(&self, suffix: &str) -> Option<usize> {
        self.suffixes.get_identifier_if_available(suffix)
    }

    pub fn has_suffix_index(&self) -> bool {
        !self.suffix_index.is_empty()
    }

    /// Ids of the patterns listed under `suffix` in the suffix index.
    pub fn pattern_ids_for_suffix(&self, suffix: &str) -> Result<Vec<usize>, DictError> {
        let Some(run) = self.suffix_runs.find(suffix)? else {
            return Ok(Vec::new());
        };
        let [count, offset] = self.run_layout.decode(u64::from(run as u32))?;
        let offset = offset as usize;
        (offset..offset + count as usize)
            .map(|i| self.suffix_index.read(i).map(|id| id as u32 as usize))
            .collect()
    }
}
