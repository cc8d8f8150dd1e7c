// Common contract of the string tables
//
// Two implementations exist: `StringArrayContainer` (sorted array, binary
// search) for small vocabularies such as grammeme names, and
// `StringContainer` (succinct trie) for large ones such as suffixes.

use crate::DictError;

/// Bidirectional mapping between strings and dense identifiers.
pub trait StringInterner {
    /// Identifier of `string`, or `None` when absent.
    fn identifier(&self, string: &str) -> Option<usize>;

    /// The string stored under `id`.
    fn string(&self, id: usize) -> Result<String, DictError>;

    /// Number of stored strings.
    fn len(&self) -> usize;

    /// Serialized size in bytes, without section padding.
    fn encoded_size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Identifier of `string`; absence is reported as [`DictError::NotFound`].
    fn get_identifier(&self, string: &str) -> Result<usize, DictError> {
        self.identifier(string)
            .ok_or_else(|| DictError::NotFound(string.to_string()))
    }
}
