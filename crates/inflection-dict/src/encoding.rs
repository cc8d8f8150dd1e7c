// Key encodings for trie-backed string tables
//
// The encoding of a table is chosen once, when the dictionary is compiled,
// by measuring which one stores the keys in the fewest bytes. Readers
// support all three and never re-derive the choice.

use crate::{DictError, bocu1};

/// Sampling shift for large key sets: with `n` keys, every
/// `(n >> SAMPLING_SHIFT) + 1`-th key is measured.
const SAMPLING_SHIFT: u32 = 17;

/// Byte encoding of trie keys, as stored in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum Encoding {
    Bocu1 = 0,
    Utf8 = 1,
    Utf16Le = 2,
}

impl Encoding {
    /// Parse the stored discriminant.
    pub fn from_raw(raw: i16) -> Result<Self, DictError> {
        match raw {
            0 => Ok(Encoding::Bocu1),
            1 => Ok(Encoding::Utf8),
            2 => Ok(Encoding::Utf16Le),
            other => Err(DictError::InvalidEncoding(other)),
        }
    }

    pub fn as_raw(self) -> i16 {
        self as i16
    }

    pub fn name(self) -> &'static str {
        match self {
            Encoding::Bocu1 => "BOCU-1",
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Encoding::Bocu1 => bocu1::encode(text),
            Encoding::Utf8 => text.as_bytes().to_vec(),
            Encoding::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }

    pub fn decode(self, bytes: &[u8]) -> Result<String, DictError> {
        match self {
            Encoding::Bocu1 => bocu1::decode(bytes),
            Encoding::Utf8 => {
                String::from_utf8(bytes.to_vec()).map_err(|_| DictError::MalformedString)
            }
            Encoding::Utf16Le => {
                if bytes.len() % 2 != 0 {
                    return Err(DictError::MalformedString);
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                    .collect();
                String::from_utf16(&units).map_err(|_| DictError::MalformedString)
            }
        }
    }

    /// Number of bytes `text` takes in this encoding.
    pub fn encoded_len(self, text: &str) -> usize {
        match self {
            Encoding::Bocu1 => bocu1::encoded_len(text),
            Encoding::Utf8 => text.len(),
            Encoding::Utf16Le => text.encode_utf16().count() * 2,
        }
    }

    /// Pick the encoding that stores `keys` in the fewest bytes.
    ///
    /// BOCU-1 or UTF-16LE must be strictly smaller than both alternatives to
    /// be chosen; otherwise UTF-8 wins, as it is the cheapest to decode.
    pub fn select_smallest<'a, I>(keys: I) -> Encoding
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: ExactSizeIterator,
    {
        let keys = keys.into_iter();
        let step = (keys.len() >> SAMPLING_SHIFT) + 1;
        let (mut bocu1, mut utf8, mut utf16) = (0usize, 0usize, 0usize);
        for key in keys.step_by(step) {
            bocu1 += Encoding::Bocu1.encoded_len(key);
            utf8 += Encoding::Utf8.encoded_len(key);
            utf16 += Encoding::Utf16Le.encoded_len(key);
        }
        if bocu1 < utf8 && bocu1 < utf16 {
            Encoding::Bocu1
        } else if utf16 < utf8 && utf16 < bocu1 {
            Encoding::Utf16Le
        } else {
            Encoding::Utf8
        }
    }
}
