// Lexical dictionary file reader
//
// File layout, in order:
//   header        magic, version, endianness marker, options, language code
//   types         grammeme names; identifier n is grammeme bit 1 << n
//   bit widths    type singleton index, property map offset, map key, map run length
//   words         word -> data word (or data singleton index in two-stage files)
//   singletons    grammeme sets shared by words, index 0 = none
//   data          distinct data words (empty for single-stage files)
//   properties    property names, property values, packed property maps
//   inflections   optional pattern store
//
// A data word packs [type singleton index][property map offset], lowest bits
// first. A property map is a run of key entries [key][value count] sorted by
// key, the first one also carrying the number of keys, followed by the value
// ids of every key in key order.

use inflection_core::grammeme::{self, GrammemeMask};
use inflection_dict::compressed::calculate_bit_width;
use inflection_dict::{
    ByteView, ByteWriter, CompressedArray, Cursor, DictError, PodArray, RecordLayout,
    StringArrayContainer, StringContainer, TrieMap,
};

use crate::INFLECTION_KEY;
use crate::inflector::PatternStore;

/// File magic, seven characters plus a NUL terminator.
pub const MAGIC_MARKER: [u8; 8] = *b"MORPHSD\0";

/// Bump when the file layout changes.
pub const VERSION: i64 = 7;

/// Written as a native `i16`; reads back as 256 on the other byte order.
pub const ENDIANNESS_MARKER: i16 = 1;

/// Option bit: the file carries a pattern store after the property tables.
pub const HAS_INFLECTION_TABLE: i16 = 1;

/// Bytes reserved for the language code in the header.
pub const LANGUAGE_CODE_LENGTH: usize = 4;

/// Smallest readable file: magic, version and endianness marker.
pub const MIN_FILE_SIZE: usize = MAGIC_MARKER.len() + size_of::<i64>() + size_of::<i16>();

pub(crate) const DATA_FIELDS: [&str; 2] = ["type_singleton", "property_map"];
pub(crate) const MAP_ENTRY_FIELDS: [&str; 3] = ["property_key", "values_len", "map_len"];

/// Everything a lexical dictionary is made of; the compiler fills one in.
pub(crate) struct LexiconSections {
    pub language: String,
    pub types: StringArrayContainer,
    pub data_layout: RecordLayout<2>,
    pub map_layout: RecordLayout<3>,
    pub words: TrieMap<u64>,
    pub type_singletons: Vec<i64>,
    pub data_singletons: CompressedArray<u64>,
    pub property_names: StringArrayContainer,
    pub property_values: StringContainer,
    pub property_maps: CompressedArray<i32>,
    pub inflector: Option<PatternStore>,
}

/// Read-only view of one compiled lexical dictionary.
#[derive(Debug)]
pub struct LexicalDictionary {
    language: String,
    types: StringArrayContainer,
    data_layout: RecordLayout<2>,
    map_layout: RecordLayout<3>,
    words: TrieMap<u64>,
    type_singletons: PodArray<i64>,
    data_singletons: CompressedArray<u64>,
    property_names: StringArrayContainer,
    property_values: StringContainer,
    property_maps: CompressedArray<i32>,
    inflector: Option<PatternStore>,
    inflection_key: Option<usize>,
    double_stage: bool,
}

impl LexicalDictionary {
    /// Parse a dictionary image, validating the header first.
    pub fn load(view: ByteView) -> Result<Self, DictError> {
        if view.len() < MIN_FILE_SIZE {
            return Err(DictError::TooShort {
                expected: MIN_FILE_SIZE,
                actual: view.len(),
            });
        }
        let mut cursor = Cursor::new(view);

        let magic: [u8; 8] = cursor.read()?;
        if magic != MAGIC_MARKER {
            return Err(DictError::InvalidMagic);
        }
        let version: i64 = cursor.read()?;
        if version != VERSION {
            return Err(DictError::IncompatibleVersion {
                found: version,
                expected: VERSION,
            });
        }
        let marker: i16 = cursor.read()?;
        if marker != ENDIANNESS_MARKER {
            return Err(DictError::EndiannessMismatch { found: marker });
        }
        let options: i16 = cursor.read()?;
        let code: [u8; LANGUAGE_CODE_LENGTH] = cursor.read()?;
        let code_len = code.iter().position(|&b| b == 0).unwrap_or(code.len());
        let language = std::str::from_utf8(&code[..code_len])
            .map_err(|_| DictError::MalformedString)?
            .to_string();

        let types = StringArrayContainer::read_from(&mut cursor)?;
        let widths: [i8; 4] = cursor.read()?;
        let type_singleton_count = cursor.read_count()?;
        let words = TrieMap::<u64>::read_from(&mut cursor)?;
        let type_singletons = cursor.read_pod_array::<i64>(type_singleton_count)?;
        let data_singletons = CompressedArray::<u64>::read_from(&mut cursor)?;
        let property_names = StringArrayContainer::read_from(&mut cursor)?;
        let property_values = StringContainer::read_from(&mut cursor)?;
        let property_maps = CompressedArray::<i32>::read_from(&mut cursor)?;

        let inflector = if options & HAS_INFLECTION_TABLE != 0 {
            Some(PatternStore::read_from(&mut cursor)?)
        } else {
            None
        };

        let data_layout = RecordLayout::from_header(DATA_FIELDS, [widths[0], widths[1]])?;
        let map_len_width = calculate_bit_width(property_names.size() as u64) as i8;
        let map_layout =
            RecordLayout::from_header(MAP_ENTRY_FIELDS, [widths[2], widths[3], map_len_width])?;

        let double_stage = !data_singletons.is_empty();
        let inflection_key = property_names.get_identifier_if_available(INFLECTION_KEY);

        tracing::debug!(
            language = %language,
            words = words.len(),
            encoding = words.encoding().name(),
            double_stage,
            inflections = inflector.is_some(),
            "loaded dictionary"
        );

        Ok(LexicalDictionary {
            language,
            types,
            data_layout,
            map_layout,
            words,
            type_singletons,
            data_singletons,
            property_names,
            property_values,
            property_maps,
            inflector,
            inflection_key,
            double_stage,
        })
    }

    pub(crate) fn from_sections(sections: LexiconSections) -> Self {
        let double_stage = !sections.data_singletons.is_empty();
        let inflection_key = sections
            .property_names
            .get_identifier_if_available(INFLECTION_KEY);
        LexicalDictionary {
            language: sections.language,
            types: sections.types,
            data_layout: sections.data_layout,
            map_layout: sections.map_layout,
            words: sections.words,
            type_singletons: PodArray::from_vec(sections.type_singletons),
            data_singletons: sections.data_singletons,
            property_names: sections.property_names,
            property_values: sections.property_values,
            property_maps: sections.property_maps,
            inflector: sections.inflector,
            inflection_key,
            double_stage,
        }
    }

    /// Write the complete file image.
    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        let code = self.language.as_bytes();
        if code.len() > LANGUAGE_CODE_LENGTH {
            return Err(DictError::Corrupt(format!(
                "language code `{}` longer than {LANGUAGE_CODE_LENGTH} bytes",
                self.language
            )));
        }
        let mut padded = [0u8; LANGUAGE_CODE_LENGTH];
        padded[..code.len()].copy_from_slice(code);
        let options = if self.inflector.is_some() {
            HAS_INFLECTION_TABLE
        } else {
            0
        };

        out.put(MAGIC_MARKER);
        out.put(VERSION);
        out.put(ENDIANNESS_MARKER);
        out.put(options);
        out.put(padded);
        self.types.serialize(out)?;
        let [type_bits, map_bits] = self.data_layout.header_widths();
        let [key_bits, values_bits, _] = self.map_layout.header_widths();
        out.put([type_bits, map_bits, key_bits, values_bits]);
        out.put_count(self.type_singletons.len())?;
        self.words.serialize(out)?;
        out.put_array(&self.type_singletons);
        self.data_singletons.serialize(out)?;
        self.property_names.serialize(out)?;
        self.property_values.serialize(out)?;
        self.property_maps.serialize(out)?;
        if let Some(store) = &self.inflector {
            store.serialize(out)?;
        }
        Ok(())
    }

    /// Language code from the file header.
    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn inflector(&self) -> Option<&PatternStore> {
        self.inflector.as_ref()
    }

    pub fn is_double_stage_lookup(&self) -> bool {
        self.double_stage
    }

    /// Key id of the property holding inflection pattern ids.
    pub fn inflection_key(&self) -> Option<usize> {
        self.inflection_key
    }

    fn data_word(&self, word: &str) -> Result<Option<u64>, DictError> {
        let Some(raw) = self.words.find(word)? else {
            return Ok(None);
        };
        if self.double_stage {
            return Ok(Some(self.data_singletons.read(raw as usize)?));
        }
        Ok(Some(raw))
    }

    /// Grammeme set of `word` as stored, without case normalization.
    pub fn word_type(&self, word: &str) -> Result<Option<GrammemeMask>, DictError> {
        let Some(data) = self.data_word(word)? else {
            return Ok(None);
        };
        let [type_index, _] = self.data_layout.decode(data)?;
        if type_index == 0 {
            return Ok(None);
        }
        let singleton = self.type_singletons.get(type_index as usize)?;
        Ok(Some(singleton as GrammemeMask))
    }

    /// Bit of the grammeme named `name`.
    pub fn value_of_type(&self, name: &str) -> Option<GrammemeMask> {
        self.types
            .get_identifier_if_available(name)
            .and_then(grammeme::identifier_to_bit)
    }

    /// Union of the bits of `names`; unknown names contribute nothing.
    pub fn values_of_types<S: AsRef<str>>(&self, names: &[S]) -> GrammemeMask {
        names
            .iter()
            .filter_map(|name| self.value_of_type(name.as_ref()))
            .fold(0, |mask, bit| mask | bit)
    }

    /// Name of the grammeme with the single bit `bit`.
    pub fn type_of_value(&self, bit: GrammemeMask) -> Option<String> {
        let id = grammeme::bit_to_identifier(bit)?;
        if id >= self.types.size() {
            return None;
        }
        self.types.get_string(id).ok()
    }

    /// Names of every grammeme in `mask`, lowest bit first.
    pub fn types_of_values(&self, mask: GrammemeMask) -> Vec<String> {
        grammeme::bits(mask)
            .filter_map(|bit| self.type_of_value(bit))
            .collect()
    }

    /// Number of registered grammemes.
    pub fn type_count(&self) -> usize {
        self.types.size()
    }

    /// Key id of a property name.
    pub fn property_key_id(&self, property: &str) -> Option<usize> {
        self.property_names.get_identifier_if_available(property)
    }

    /// Raw value ids stored for `word` under property `key_id`.
    pub fn word_property_ids(
        &self,
        word: &str,
        key_id: usize,
    ) -> Result<Option<Vec<usize>>, DictError> {
        let Some(data) = self.data_word(word)? else {
            return Ok(None);
        };
        let [_, offset] = self.data_layout.decode(data)?;
        if offset == 0 {
            return Ok(None);
        }
        let offset = offset as usize;
        let entry = |index: usize| -> Result<[u64; 3], DictError> {
            let raw = self.property_maps.read(index)?;
            self.map_layout.decode(u64::from(raw as u32))
        };

        let map_len = entry(offset)?[2] as usize;
        let mut values_start = offset + map_len;
        for index in offset..offset + map_len {
            let [key, values_len, _] = entry(index)?;
            let key = key as usize;
            let values_len = values_len as usize;
            if key > key_id {
                // Keys are sorted
                break;
            }
            if key == key_id {
                let ids = (values_start..values_start + values_len)
                    .map(|i| self.property_maps.read(i).map(|v| v as u32 as usize))
                    .collect::<Result<Vec<_>, _>>()?;
                return Ok(Some(ids));
            }
            values_start += values_len;
        }
        Ok(None)
    }

    /// Values of `property` for `word`, without case normalization.
    ///
    /// Values of the inflection property are pattern identifiers.
    pub fn word_property_values(
        &self,
        word: &str,
        property: &str,
    ) -> Result<Option<Vec<String>>, DictError> {
        let Some(key_id) = self.property_key_id(property) else {
            return Ok(None);
        };
        let Some(ids) = self.word_property_ids(word, key_id)? else {
            return Ok(None);
        };
        let patterns = self
            .inflector
            .as_ref()
            .filter(|_| Some(key_id) == self.inflection_key);
        let values = ids
            .into_iter()
            .map(|id| match patterns {
                Some(store) => store.pattern_name(id),
                None => self.property_values.get_string(id),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(values))
    }

    /// Every word, in trie order. Each call starts a fresh walk.
    pub fn all_words(&self) -> impl Iterator<Item = Result<String, DictError>> + '_ {
        self.words.iter_prefix("").map(|entry| entry.map(|(word, _)| word))
    }

    pub fn all_words_len(&self) -> usize {
        self.words.len()
    }
}
