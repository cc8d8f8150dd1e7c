//! Storage primitives for compiled inflection dictionaries.
//!
//! Every structure here has two lives: it is built once in memory by the
//! dictionary compiler and serialized with a [`ByteWriter`], then read back
//! at runtime from a memory-mapped file through a [`Cursor`] without copying
//! the packed data.
//!
//! # Architecture
//!
//! - [`bytes`] -- Shared byte views over mmapped or owned buffers, cursors, writers
//! - [`compressed`] -- Fixed-bit-width packed integer arrays
//! - [`layout`] -- Named bit-field schemas for packed records
//! - [`string_array`] -- Sorted UTF-16 string table with binary search
//! - [`bocu1`] -- BOCU-1 compressed Unicode encoding
//! - [`encoding`] -- Key encodings and build-time encoding selection
//! - [`bits`] -- Rank/select bit vector
//! - [`louds`] -- Succinct level-order trie over byte strings
//! - [`trie`] -- Encoded string tries and string-to-value maps
//! - [`string_container`] -- Trie-backed string table
//! - [`interner`] -- Common contract of the two string tables

pub mod bits;
pub mod bocu1;
pub mod bytes;
pub mod compressed;
pub mod encoding;
pub mod interner;
pub mod layout;
pub mod louds;
pub mod string_array;
pub mod string_container;
pub mod trie;

pub use bytes::{ByteView, ByteWriter, Cursor, PodArray};
pub use compressed::{CompressedArray, PackedValue};
pub use encoding::Encoding;
pub use interner::StringInterner;
pub use layout::RecordLayout;
pub use string_array::StringArrayContainer;
pub use string_container::StringContainer;
pub use trie::{EncodedTrie, TrieMap};

/// Error type for reading and building dictionary storage structures.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("data too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },
    #[error("invalid magic marker in dictionary header")]
    InvalidMagic,
    #[error("incompatible version {found}, expected version {expected}")]
    IncompatibleVersion { found: i64, expected: i64 },
    #[error("dictionary was built for a different architecture (endianness marker {found})")]
    EndiannessMismatch { found: i16 },
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("illegal bit range: start {start}, length {len}")]
    IllegalRange { start: u32, len: u32 },
    #[error("string not found: {0}")]
    NotFound(String),
    #[error("string of {len} code units exceeds the 255 unit limit")]
    StringTooLarge { len: usize },
    #[error("string table exceeds the 24-bit offset limit")]
    OffsetOverflow,
    #[error("unknown key encoding {0}")]
    InvalidEncoding(i16),
    #[error("malformed encoded string")]
    MalformedString,
    #[error("value {value} does not fit in the {width}-bit field `{field}`")]
    FieldOverflow {
        field: &'static str,
        value: u64,
        width: u32,
    },
    #[error("cannot modify a memory-mapped array")]
    ReadOnly,
    #[error("record layout is wider than 64 bits")]
    LayoutTooWide,
    #[error("corrupt dictionary data: {0}")]
    Corrupt(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alignment of every serialized section.
pub const SECTION_ALIGNMENT: usize = 8;
