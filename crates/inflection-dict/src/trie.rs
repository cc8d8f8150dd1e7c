// Encoded string tries and string-to-value maps

use crate::DictError;
use crate::bytes::{ByteWriter, Cursor};
use crate::compressed::{CompressedArray, PackedValue};
use crate::encoding::Encoding;
use crate::louds::{LoudsTrie, PrefixIter};

/// A byte trie whose keys are strings stored in one [`Encoding`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTrie {
    encoding: Encoding,
    louds: LoudsTrie,
}

impl EncodedTrie {
    /// Build with the encoding that stores `keys` most compactly.
    pub fn build<S: AsRef<str>>(keys: &[S]) -> Self {
        let encoding = Encoding::select_smallest(keys.iter().map(AsRef::as_ref));
        Self::build_with_encoding(keys, encoding)
    }

    pub fn build_with_encoding<S: AsRef<str>>(keys: &[S], encoding: Encoding) -> Self {
        let louds = LoudsTrie::build(keys.iter().map(|k| encoding.encode(k.as_ref())));
        EncodedTrie { encoding, louds }
    }

    pub(crate) fn from_parts(encoding: Encoding, louds: LoudsTrie) -> Self {
        EncodedTrie { encoding, louds }
    }

    pub(crate) fn louds(&self) -> &LoudsTrie {
        &self.louds
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn len(&self) -> usize {
        self.louds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.louds.is_empty()
    }

    pub fn lookup(&self, key: &str) -> Option<usize> {
        self.louds.lookup(&self.encoding.encode(key))
    }

    pub fn key(&self, id: usize) -> Result<String, DictError> {
        self.encoding.decode(&self.louds.reverse(id)?)
    }

    /// Keys starting with `prefix` and their ids, in encoded byte order.
    pub fn prefix_iter(&self, prefix: &str) -> EncodedPrefixIter<'_> {
        EncodedPrefixIter {
            encoding: self.encoding,
            inner: Some(self.louds.prefix_iter(&self.encoding.encode(prefix))),
        }
    }
}

/// Decoding wrapper over [`PrefixIter`].
pub struct EncodedPrefixIter<'a> {
    encoding: Encoding,
    inner: Option<PrefixIter<'a>>,
}

impl EncodedPrefixIter<'_> {
    fn empty() -> Self {
        EncodedPrefixIter {
            encoding: Encoding::Utf8,
            inner: None,
        }
    }
}

impl Iterator for EncodedPrefixIter<'_> {
    type Item = Result<(String, usize), DictError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (bytes, id) = self.inner.as_mut()?.next()?;
        Some(self.encoding.decode(&bytes).map(|key| (key, id)))
    }
}

/// String keys mapped to packed integer values, indexed by key id.
///
/// Serialized form: `i32 keyCount`, `i16 encoding`, `i16 reserved`, the
/// value [`CompressedArray`], then the trie. A map without keys stores no
/// trie.
#[derive(Debug)]
pub struct TrieMap<T> {
    trie: Option<EncodedTrie>,
    values: CompressedArray<T>,
}

impl<T: PackedValue> TrieMap<T> {
    /// Build from key/value pairs. Duplicate keys are rejected.
    pub fn build<I, S>(entries: I) -> Result<Self, DictError>
    where
        I: IntoIterator<Item = (S, T)>,
        S: AsRef<str>,
    {
        let (keys, values): (Vec<S>, Vec<T>) = entries.into_iter().unzip();
        if keys.is_empty() {
            return Ok(TrieMap {
                trie: None,
                values: CompressedArray::from_values(&[])?,
            });
        }
        let trie = EncodedTrie::build(&keys);
        if trie.len() != keys.len() {
            return Err(DictError::Corrupt(format!(
                "{} duplicate keys in trie map",
                keys.len() - trie.len()
            )));
        }
        let mut by_id = vec![T::from_bits(0); keys.len()];
        for (key, value) in keys.iter().zip(values) {
            let id = trie
                .lookup(key.as_ref())
                .ok_or_else(|| DictError::NotFound(key.as_ref().to_string()))?;
            by_id[id] = value;
        }
        Ok(TrieMap {
            trie: Some(trie),
            values: CompressedArray::from_values(&by_id)?,
        })
    }

    /// Read a map written by [`TrieMap::serialize`].
    pub fn read_from(cursor: &mut Cursor) -> Result<Self, DictError> {
        let key_count = cursor.read_count()?;
        let encoding = Encoding::from_raw(cursor.read::<i16>()?)?;
        let _reserved: i16 = cursor.read()?;
        let values = CompressedArray::read_from(cursor)?;
        if key_count == 0 {
            return Ok(TrieMap { trie: None, values });
        }
        let louds = LoudsTrie::read_from(cursor)?;
        if louds.len() != key_count || values.len() < key_count {
            return Err(DictError::Corrupt(format!(
                "trie map declares {key_count} keys, trie holds {} and values {}",
                louds.len(),
                values.len()
            )));
        }
        Ok(TrieMap {
            trie: Some(EncodedTrie::from_parts(encoding, louds)),
            values,
        })
    }

    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        out.put_count(self.len())?;
        out.put(self.encoding().as_raw());
        out.put(0i16);
        self.values.serialize(out)?;
        if let Some(trie) = &self.trie {
            trie.louds().serialize(out)?;
        }
        Ok(())
    }

    /// Key encoding; UTF-8 for an empty map.
    pub fn encoding(&self) -> Encoding {
        self.trie.as_ref().map_or(Encoding::Utf8, EncodedTrie::encoding)
    }

    pub fn len(&self) -> usize {
        self.trie.as_ref().map_or(0, EncodedTrie::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn key_id(&self, key: &str) -> Option<usize> {
        self.trie.as_ref()?.lookup(key)
    }

    /// Value stored under `key`. A failed value read is an error, not a miss.
    pub fn find(&self, key: &str) -> Result<Option<T>, DictError> {
        self.key_id(key).map(|id| self.values.read(id)).transpose()
    }

    pub fn value(&self, id: usize) -> Result<T, DictError> {
        if id >= self.len() {
            return Err(DictError::IndexOutOfBounds {
                index: id,
                len: self.len(),
            });
        }
        self.values.read(id)
    }

    pub fn key(&self, id: usize) -> Result<String, DictError> {
        match &self.trie {
            Some(trie) => trie.key(id),
            None => Err(DictError::IndexOutOfBounds { index: id, len: 0 }),
        }
    }

    /// Keys starting with `prefix` and their ids. Restartable: every call
    /// walks from the prefix node again.
    pub fn iter_prefix(&self, prefix: &str) -> EncodedPrefixIter<'_> {
        match &self.trie {
            Some(trie) => trie.prefix_iter(prefix),
            None => EncodedPrefixIter::empty(),
        }
    }
}
