// Fixed-bit-width packed integer arrays
//
// Values are packed back to back into 64-bit words, lowest bits first. A
// value may straddle two words; its low bits then come from word N and its
// high bits from word N+1.

use std::fmt;
use std::marker::PhantomData;

use crate::DictError;
use crate::bytes::{ByteView, ByteWriter, Cursor};

/// Number of bits in one storage word.
pub const DATA_WIDTH: u32 = 64;

/// Integer types that can be stored in a [`CompressedArray`].
///
/// Signed values are sign-extended to 64 bits, so a negative value always
/// forces a 64-bit width.
pub trait PackedValue: Copy + fmt::Debug {
    fn to_bits(self) -> u64;
    fn from_bits(bits: u64) -> Self;
}

macro_rules! impl_packed_value {
    ($($t:ty),*) => {
        $(
            impl PackedValue for $t {
                #[inline]
                fn to_bits(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_bits(bits: u64) -> Self {
                    bits as $t
                }
            }
        )*
    };
}

impl_packed_value!(i8, i16, i32, i64, u8, u16, u32, u64);

/// Minimal number of bits holding `bits`, never less than 1.
pub fn calculate_bit_width(bits: u64) -> u32 {
    (DATA_WIDTH - bits.leading_zeros()).max(1)
}

/// Extract `len` bits of `value` starting at bit `start`.
///
/// Fails when the range reaches past bit 64.
pub fn extract_value(value: u64, start: u32, len: u32) -> Result<u64, DictError> {
    if start + len > DATA_WIDTH {
        return Err(DictError::IllegalRange { start, len });
    }
    if len == 0 {
        return Ok(0);
    }
    Ok((value >> start) & select_mask(len))
}

#[inline]
fn select_mask(width: u32) -> u64 {
    if width >= DATA_WIDTH {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

enum Words {
    Owned(Vec<u64>),
    Mapped { view: ByteView, count: usize },
}

impl Words {
    fn count(&self) -> usize {
        match self {
            Words::Owned(words) => words.len(),
            Words::Mapped { count, .. } => *count,
        }
    }

    fn get(&self, idx: usize) -> Result<u64, DictError> {
        match self {
            Words::Owned(words) => words.get(idx).copied().ok_or(DictError::IndexOutOfBounds {
                index: idx,
                len: words.len(),
            }),
            Words::Mapped { view, .. } => view.read_at::<u64>(idx * size_of::<u64>()),
        }
    }
}

/// A packed array of `len` values, each `width` bits wide.
///
/// Arrays built from values own their buffer and can be written to. Arrays
/// read from a dictionary file view the mapped words directly.
pub struct CompressedArray<T> {
    words: Words,
    len: usize,
    width: u32,
    mask: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: PackedValue> CompressedArray<T> {
    /// Width needed to store every value of `values`.
    pub fn calculate_bit_width_of(values: &[T]) -> u32 {
        calculate_bit_width(values.iter().fold(0u64, |acc, v| acc | v.to_bits()))
    }

    /// Zero-filled owned array of `len` values of `width` bits.
    pub fn with_width(width: u32, len: usize) -> Result<Self, DictError> {
        if !(1..=DATA_WIDTH).contains(&width) {
            return Err(DictError::IllegalRange { start: 0, len: width });
        }
        let bits = len
            .checked_mul(width as usize)
            .ok_or(DictError::IndexOutOfBounds { index: len, len: 0 })?;
        let count = bits.div_ceil(DATA_WIDTH as usize);
        Ok(CompressedArray {
            words: Words::Owned(vec![0; count]),
            len,
            width,
            mask: select_mask(width),
            _marker: PhantomData,
        })
    }

    /// Pack `values` using the smallest width that holds all of them.
    pub fn from_values(values: &[T]) -> Result<Self, DictError> {
        let mut array = Self::with_width(Self::calculate_bit_width_of(values), values.len())?;
        for (idx, &value) in values.iter().enumerate() {
            array.write(idx, value)?;
        }
        Ok(array)
    }

    /// View an array serialized by [`CompressedArray::serialize`].
    ///
    /// The words are not copied. The readable length is the number of whole
    /// values that fit in the stored words.
    pub fn read_from(cursor: &mut Cursor) -> Result<Self, DictError> {
        let count = cursor.read_count()?;
        let width = cursor.read::<i32>()?;
        let width = u32::try_from(width)
            .ok()
            .filter(|w| (1..=DATA_WIDTH).contains(w))
            .ok_or_else(|| DictError::Corrupt(format!("invalid packed array width {width}")))?;
        let byte_len = count
            .checked_mul(size_of::<u64>())
            .ok_or_else(|| DictError::Corrupt(format!("packed array of {count} words")))?;
        let view = cursor.read_view(byte_len)?;
        Ok(CompressedArray {
            words: Words::Mapped { view, count },
            len: count * DATA_WIDTH as usize / width as usize,
            width,
            mask: select_mask(width),
            _marker: PhantomData,
        })
    }

    /// Write the word count, the width and the words.
    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        let count = self.words.count();
        out.put_count(count)?;
        out.put(self.width as i32);
        for idx in 0..count {
            out.put(self.words.get(idx)?);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no storage words exist.
    pub fn is_empty(&self) -> bool {
        self.words.count() == 0
    }

    /// Bits per value.
    pub fn width(&self) -> u32 {
        self.width
    }

    fn locate(&self, index: usize) -> Result<(usize, u32, usize), DictError> {
        if index >= self.len {
            return Err(DictError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let start_bit = index * self.width as usize;
        let word = start_bit / DATA_WIDTH as usize;
        let shift = (start_bit % DATA_WIDTH as usize) as u32;
        let end_word = (start_bit + self.width as usize - 1) / DATA_WIDTH as usize;
        if end_word >= self.words.count() {
            return Err(DictError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        Ok((word, shift, end_word))
    }

    pub fn read(&self, index: usize) -> Result<T, DictError> {
        let (word, shift, end_word) = self.locate(index)?;
        let mut bits = self.words.get(word)? >> shift;
        if end_word != word {
            bits |= self.words.get(end_word)? << (DATA_WIDTH - shift);
        }
        Ok(T::from_bits(bits & self.mask))
    }

    /// Store `value` at `index`, replacing the previous value.
    pub fn write(&mut self, index: usize, value: T) -> Result<(), DictError> {
        let bits = value.to_bits();
        if bits & !self.mask != 0 {
            return Err(DictError::FieldOverflow {
                field: "value",
                value: bits,
                width: self.width,
            });
        }
        let (word, shift, end_word) = self.locate(index)?;
        let mask = self.mask;
        let Words::Owned(words) = &mut self.words else {
            return Err(DictError::ReadOnly);
        };
        words[word] = (words[word] & !(mask << shift)) | (bits << shift);
        if end_word != word {
            let high = DATA_WIDTH - shift;
            words[end_word] = (words[end_word] & !(mask >> high)) | (bits >> high);
        }
        Ok(())
    }

    /// Copy every value out of the array.
    pub fn to_vec(&self) -> Result<Vec<T>, DictError> {
        (0..self.len).map(|idx| self.read(idx)).collect()
    }
}

impl<T> fmt::Debug for CompressedArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressedArray")
            .field("len", &self.len)
            .field("width", &self.width)
            .field("words", &self.words.count())
            .finish()
    }
}
