// Trie-backed string table
//
// Used for large vocabularies (inflection suffixes, property values) where
// the sorted UTF-16 array would waste space. Key encoding is chosen at
// build time.

use inflection_core::grammeme::{self, GrammemeMask};

use crate::DictError;
use crate::bytes::{ByteWriter, Cursor};
use crate::encoding::Encoding;
use crate::interner::StringInterner;
use crate::louds::LoudsTrie;
use crate::trie::EncodedTrie;

/// Read-only string table with dense identifiers assigned by the trie.
#[derive(Debug, Clone)]
pub struct StringContainer {
    trie: EncodedTrie,
    encoded_size: usize,
}

impl StringContainer {
    /// Build a table from strings in any order; duplicates collapse.
    pub fn new<I, S>(strings: I) -> Result<Self, DictError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let strings: Vec<S> = strings.into_iter().collect();
        let trie = EncodedTrie::build(&strings);
        let mut sized = ByteWriter::new();
        trie.louds().serialize(&mut sized)?;
        Ok(StringContainer {
            trie,
            encoded_size: 8 + sized.position(),
        })
    }

    /// Read a table written by [`StringContainer::serialize`].
    pub fn read_from(cursor: &mut Cursor) -> Result<Self, DictError> {
        let start = cursor.position();
        let encoding = Encoding::from_raw(i16::from(cursor.read::<i8>()?))?;
        cursor.skip(3)?;
        let key_count = cursor.read_count()?;
        let louds = LoudsTrie::read_from(cursor)?;
        if louds.len() != key_count {
            return Err(DictError::Corrupt(format!(
                "string container declares {key_count} strings, trie holds {}",
                louds.len()
            )));
        }
        Ok(StringContainer {
            trie: EncodedTrie::from_parts(encoding, louds),
            encoded_size: cursor.position() - start,
        })
    }

    /// Serialized form: `i8 encoding`, 3 pad bytes, `i32 keyCount`, trie.
    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        // Discriminants are 0..=2
        out.put(self.trie.encoding().as_raw() as i8);
        out.put_slice(&[0u8; 3]);
        out.put_count(self.size())?;
        self.trie.louds().serialize(out)
    }

    pub fn encoding(&self) -> Encoding {
        self.trie.encoding()
    }

    pub fn size(&self) -> usize {
        self.trie.len()
    }

    pub fn get_string(&self, id: usize) -> Result<String, DictError> {
        self.trie.key(id)
    }

    pub fn get_identifier_if_available(&self, string: &str) -> Option<usize> {
        self.trie.lookup(string)
    }

    pub fn get_identifier(&self, string: &str) -> Result<usize, DictError> {
        self.get_identifier_if_available(string)
            .ok_or_else(|| DictError::NotFound(string.to_string()))
    }

    /// Every string with its identifier, in encoded byte order.
    pub fn strings(&self) -> impl Iterator<Item = Result<(String, usize), DictError>> + '_ {
        self.trie.prefix_iter("")
    }

    /// Bit for identifier `id`; `None` past the 64-bit mask.
    pub fn convert_identifier_to_bit(id: usize) -> Option<GrammemeMask> {
        grammeme::identifier_to_bit(id)
    }

    /// Identifier of the single bit set in `mask`; `None` when zero or
    /// several bits are set.
    pub fn convert_bit_to_identifier(mask: GrammemeMask) -> Option<usize> {
        grammeme::bit_to_identifier(mask)
    }
}

impl StringInterner for StringContainer {
    fn identifier(&self, string: &str) -> Option<usize> {
        self.get_identifier_if_available(string)
    }

    fn string(&self, id: usize) -> Result<String, DictError> {
        self.get_string(id)
    }

    fn len(&self) -> usize {
        self.size()
    }

    fn encoded_size(&self) -> usize {
        self.encoded_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reload(table: &StringContainer) -> StringContainer {
        let mut w = ByteWriter::new();
        table.serialize(&mut w).unwrap();
        let size = w.position();
        let table = StringContainer::read_from(&mut Cursor::new(w.into_view())).unwrap();
        assert_eq!(table.encoded_size(), size);
        table
    }

    #[test]
    fn lookup_both_ways() {
        let table = reload(&StringContainer::new(["", "s", "es", "ies", "s"]).unwrap());
        assert_eq!(table.size(), 4);
        for s in ["", "s", "es", "ies"] {
            let id = table.get_identifier(s).unwrap();
            assert_eq!(table.get_string(id).unwrap(), s);
        }
        assert!(matches!(table.get_identifier("en"), Err(DictError::NotFound(_))));
        assert!(table.get_string(4).is_err());
    }

    #[test]
    fn encoded_size_matches_before_and_after_reload() {
        let table = StringContainer::new(["ab", "abc"]).unwrap();
        let mut w = ByteWriter::new();
        table.serialize(&mut w).unwrap();
        assert_eq!(table.encoded_size(), w.position());
    }

    #[test]
    fn picks_compact_encoding() {
        let table = StringContainer::new(["ами", "ах", "ов", "ей"]).unwrap();
        assert_eq!(reload(&table).encoding(), Encoding::Bocu1);
        let table = StringContainer::new(["ing", "ed"]).unwrap();
        assert_eq!(reload(&table).encoding(), Encoding::Utf8);
    }

    #[test]
    fn long_strings_supported() {
        let long = "y".repeat(255);
        let table = reload(&StringContainer::new([long.as_str(), "z"]).unwrap());
        assert_eq!(table.get_string(table.get_identifier(&long).unwrap()).unwrap(), long);
    }

    #[test]
    fn bit_conversion() {
        assert_eq!(StringContainer::convert_identifier_to_bit(0), Some(1));
        assert_eq!(StringContainer::convert_identifier_to_bit(63), Some(1 << 63));
        assert_eq!(StringContainer::convert_identifier_to_bit(64), None);
        assert_eq!(StringContainer::convert_bit_to_identifier(1 << 5), Some(5));
        assert_eq!(StringContainer::convert_bit_to_identifier(0), None);
        assert_eq!(StringContainer::convert_bit_to_identifier(0b110), None);
    }

    #[test]
    fn strings_iterates_everything() {
        let table = StringContainer::new(["b", "a", "c"]).unwrap();
        let all: Vec<String> = table.strings().map(|r| r.unwrap().0).collect();
        assert_eq!(all, vec!["a", "b", "c"]);
    }

    proptest! {
        #[test]
        fn round_trip(strings in prop::collection::btree_set("\\PC{0,12}", 0..40)) {
            let table = reload(&StringContainer::new(&strings).unwrap());
            prop_assert_eq!(table.size(), strings.len());
            for s in &strings {
                let id = table.get_identifier(s).unwrap();
                prop_assert_eq!(&table.get_string(id).unwrap(), s);
            }
        }
    }
}
