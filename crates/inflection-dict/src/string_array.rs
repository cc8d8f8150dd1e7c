// Sorted UTF-16 string table with binary search lookup
//
// Each entry is a 32-bit value `(offset << 8) | length` pointing into one
// blob of NUL-terminated UTF-16 strings. Entries are sorted by code unit, so
// lookups are a binary search over the decoded substrings.

use std::cmp::Ordering;

use crate::bytes::{ByteWriter, Cursor, PodArray};
use crate::interner::StringInterner;
use crate::{DictError, SECTION_ALIGNMENT};

const LENGTH_BITS: u32 = 8;
const LENGTH_MASK: u32 = (1 << LENGTH_BITS) - 1;
const MAX_OFFSET: usize = (1 << (32 - LENGTH_BITS)) - 1;

/// Read-only string table mapping strings to dense identifiers.
#[derive(Debug, Clone)]
pub struct StringArrayContainer {
    entries: PodArray<u32>,
    units: PodArray<u16>,
}

fn split_entry(entry: u32) -> (usize, usize) {
    ((entry >> LENGTH_BITS) as usize, (entry & LENGTH_MASK) as usize)
}

impl StringArrayContainer {
    /// Build a table from strings in any order; duplicates collapse.
    ///
    /// Identifiers follow UTF-16 code unit order.
    pub fn new<I, S>(strings: I) -> Result<Self, DictError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut encoded: Vec<Vec<u16>> = strings
            .into_iter()
            .map(|s| s.as_ref().encode_utf16().collect())
            .collect();
        encoded.sort_unstable();
        encoded.dedup();

        let mut entries = Vec::with_capacity(encoded.len());
        let mut units = Vec::new();
        for string in &encoded {
            let offset = units.len();
            if string.len() > LENGTH_MASK as usize {
                return Err(DictError::StringTooLarge { len: string.len() });
            }
            if offset > MAX_OFFSET {
                return Err(DictError::OffsetOverflow);
            }
            entries.push(((offset as u32) << LENGTH_BITS) | string.len() as u32);
            units.extend_from_slice(string);
            units.push(0);
        }
        Ok(StringArrayContainer {
            entries: PodArray::from_vec(entries),
            units: PodArray::from_vec(units),
        })
    }

    /// Read a table written by [`StringArrayContainer::serialize`].
    pub fn read_from(cursor: &mut Cursor) -> Result<Self, DictError> {
        let count = cursor.read_count()?;
        let unit_count = cursor.read_count()?;
        let entries = cursor.read_pod_array::<u32>(count)?;
        let units = cursor.read_pod_array::<u16>(unit_count)?;
        cursor.skip_padding(SECTION_ALIGNMENT)?;
        for entry in entries.iter() {
            let (offset, len) = split_entry(entry?);
            if offset + len > unit_count {
                return Err(DictError::Corrupt(format!(
                    "string entry {offset}+{len} beyond {unit_count} code units"
                )));
            }
        }
        Ok(StringArrayContainer { entries, units })
    }

    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        let unit_count = self.units.len();
        out.put_count(self.entries.len())?;
        out.put_count(unit_count)?;
        out.put_array(&self.entries);
        out.put_array(&self.units);
        out.pad_to(SECTION_ALIGNMENT);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    fn units_at(&self, id: usize) -> Result<Vec<u16>, DictError> {
        let (offset, len) = split_entry(self.entries.get(id)?);
        self.units.get_range(offset..offset + len)
    }

    /// The string with identifier `id`.
    pub fn get_string(&self, id: usize) -> Result<String, DictError> {
        String::from_utf16(&self.units_at(id)?).map_err(|_| DictError::MalformedString)
    }

    /// Identifier of `string`, or `None` when the table does not contain it.
    pub fn get_identifier_if_available(&self, string: &str) -> Option<usize> {
        let needle: Vec<u16> = string.encode_utf16().collect();
        let mut low = 0usize;
        let mut high = self.entries.len();
        while low < high {
            let mid = low + (high - low) / 2;
            let candidate = self.units_at(mid).ok()?;
            match needle.as_slice().cmp(candidate.as_slice()) {
                Ordering::Less => high = mid,
                Ordering::Greater => low = mid + 1,
                Ordering::Equal => return Some(mid),
            }
        }
        None
    }

    /// Identifier of `string`; absence is a caller error.
    pub fn get_identifier(&self, string: &str) -> Result<usize, DictError> {
        self.get_identifier_if_available(string)
            .ok_or_else(|| DictError::NotFound(string.to_string()))
    }

    /// Every string in identifier order.
    pub fn strings(&self) -> impl Iterator<Item = Result<String, DictError>> + '_ {
        (0..self.size()).map(|id| self.get_string(id))
    }
}

impl StringInterner for StringArrayContainer {
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
        8 + self.entries.len() * 4 + self.units.len() * 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reload(table: &StringArrayContainer) -> StringArrayContainer {
        let mut w = ByteWriter::new();
        table.serialize(&mut w).unwrap();
        assert_eq!(w.position() % SECTION_ALIGNMENT, 0);
        StringArrayContainer::read_from(&mut Cursor::new(w.into_view())).unwrap()
    }

    #[test]
    fn identifiers_follow_sorted_order() {
        let table = StringArrayContainer::new(["noun", "adjective", "plural", "noun"]).unwrap();
        assert_eq!(table.size(), 3);
        assert_eq!(table.get_identifier("adjective").unwrap(), 0);
        assert_eq!(table.get_identifier("noun").unwrap(), 1);
        assert_eq!(table.get_identifier("plural").unwrap(), 2);
        assert_eq!(table.get_string(1).unwrap(), "noun");
    }

    #[test]
    fn missing_string() {
        let table = StringArrayContainer::new(["a", "c"]).unwrap();
        assert_eq!(table.get_identifier_if_available("b"), None);
        assert!(matches!(table.get_identifier("b"), Err(DictError::NotFound(s)) if s == "b"));
        assert!(matches!(
            table.get_string(2),
            Err(DictError::IndexOutOfBounds { index: 2, len: 2 })
        ));
    }

    #[test]
    fn mapped_lookup_matches_owned() {
        let table = StringArrayContainer::new(["genitive", "", "dative", "ablative", "ß"]).unwrap();
        let mapped = reload(&table);
        assert!(mapped.entries.is_mapped() && mapped.units.is_mapped());
        for s in ["genitive", "", "dative", "ablative", "ß"] {
            let id = table.get_identifier(s).unwrap();
            assert_eq!(mapped.get_identifier(s).unwrap(), id);
            assert_eq!(mapped.get_string(id).unwrap(), s);
        }
        assert_eq!(mapped.get_identifier_if_available("nominative"), None);
    }

    #[test]
    fn length_limit() {
        let ok = "x".repeat(255);
        let table = StringArrayContainer::new([ok.as_str()]).unwrap();
        assert_eq!(reload(&table).get_string(0).unwrap(), ok);

        let too_long = "x".repeat(256);
        let err = StringArrayContainer::new([too_long]).unwrap_err();
        assert!(matches!(err, DictError::StringTooLarge { len: 256 }));
    }

    #[test]
    fn surrogate_pairs_count_as_two_units() {
        let emoji = "\u{1F600}".repeat(128);
        assert!(matches!(
            StringArrayContainer::new([emoji]),
            Err(DictError::StringTooLarge { len: 256 })
        ));
    }

    #[test]
    fn empty_table() {
        let table = StringArrayContainer::new(Vec::<String>::new()).unwrap();
        let mapped = reload(&table);
        assert_eq!(mapped.size(), 0);
        assert_eq!(mapped.get_identifier_if_available(""), None);
    }

    proptest! {
        #[test]
        fn round_trip(strings in prop::collection::btree_set("\\PC{0,20}", 0..40)) {
            let table = reload(&StringArrayContainer::new(&strings).unwrap());
            prop_assert_eq!(table.size(), strings.len());
            for s in &strings {
                let id = table.get_identifier(s).unwrap();
                prop_assert_eq!(&table.get_string(id).unwrap(), s);
            }
        }
    }
}
