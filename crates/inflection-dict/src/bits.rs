// Rank/select bit vector
//
// Bits are packed into 64-bit words, lowest bit first. A rank directory with
// the number of set bits before each word is rebuilt at load time; select
// binary searches that directory and then scans one word.

use crate::DictError;
use crate::bytes::{ByteWriter, Cursor};

const WORD_BITS: usize = 64;

/// Immutable bit vector supporting rank and select queries.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
    len: usize,
    /// `ranks[i]` = number of set bits in `words[..i]`; one extra entry at the end.
    ranks: Vec<usize>,
}

/// Incremental builder for a [`BitVector`].
#[derive(Debug, Default)]
pub struct BitVectorBuilder {
    words: Vec<u64>,
    len: usize,
}

impl BitVectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bit: bool) {
        let offset = self.len % WORD_BITS;
        if offset == 0 {
            self.words.push(0);
        }
        if bit {
            if let Some(last) = self.words.last_mut() {
                *last |= 1 << offset;
            }
        }
        self.len += 1;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn finish(self) -> BitVector {
        BitVector::from_words(self.words, self.len)
    }
}

impl FromIterator<bool> for BitVector {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        let mut builder = BitVectorBuilder::new();
        for bit in iter {
            builder.push(bit);
        }
        builder.finish()
    }
}

impl BitVector {
    fn from_words(words: Vec<u64>, len: usize) -> Self {
        let mut ranks = Vec::with_capacity(words.len() + 1);
        let mut total = 0usize;
        for &word in &words {
            ranks.push(total);
            total += word.count_ones() as usize;
        }
        ranks.push(total);
        BitVector { words, len, ranks }
    }

    /// Read a vector written by [`BitVector::serialize`].
    pub fn read_from(cursor: &mut Cursor) -> Result<Self, DictError> {
        let len = cursor.read_count()?;
        let _reserved: i32 = cursor.read()?;
        let mut words = cursor.read_array::<u64>(len.div_ceil(WORD_BITS))?;
        // Bits past the end must not disturb rank counts
        if let Some(last) = words.last_mut() {
            let used = len % WORD_BITS;
            if used != 0 {
                *last &= (1u64 << used) - 1;
            }
        }
        Ok(Self::from_words(words, len))
    }

    /// Serialized form: `i32 bitCount`, `i32 reserved`, `ceil(bitCount / 64)` x `u64`.
    pub fn serialize(&self, out: &mut ByteWriter) -> Result<(), DictError> {
        out.put_count(self.len)?;
        out.put(0i32);
        out.put_slice(&self.words);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of set bits.
    pub fn count_ones(&self) -> usize {
        self.ranks.last().copied().unwrap_or(0)
    }

    pub fn get(&self, pos: usize) -> Option<bool> {
        if pos >= self.len {
            return None;
        }
        Some((self.words[pos / WORD_BITS] >> (pos % WORD_BITS)) & 1 == 1)
    }

    /// Number of set bits in `[0, pos)`. `pos` is clamped to the length.
    pub fn rank1(&self, pos: usize) -> usize {
        let pos = pos.min(self.len);
        let word = pos / WORD_BITS;
        let offset = pos % WORD_BITS;
        let mut rank = self.ranks[word];
        if offset != 0 {
            rank += (self.words[word] & ((1u64 << offset) - 1)).count_ones() as usize;
        }
        rank
    }

    /// Number of clear bits in `[0, pos)`. `pos` is clamped to the length.
    pub fn rank0(&self, pos: usize) -> usize {
        let pos = pos.min(self.len);
        pos - self.rank1(pos)
    }

    /// Position of the `k`-th set bit, counting from zero.
    pub fn select1(&self, k: usize) -> Option<usize> {
        if k >= self.count_ones() {
            return None;
        }
        // Last word whose preceding rank is <= k
        let word = self.ranks.partition_point(|&r| r <= k) - 1;
        let within = k - self.ranks[word];
        Some(word * WORD_BITS + select_in_word(self.words[word], within))
    }

    /// Position of the `k`-th clear bit, counting from zero.
    pub fn select0(&self, k: usize) -> Option<usize> {
        if k >= self.len - self.count_ones() {
            return None;
        }
        let zeros_before = |word: usize| word * WORD_BITS - self.ranks[word];
        let mut low = 0usize;
        let mut high = self.words.len();
        while high - low > 1 {
            let mid = low + (high - low) / 2;
            if zeros_before(mid) <= k {
                low = mid;
            } else {
                high = mid;
            }
        }
        let within = k - zeros_before(low);
        Some(low * WORD_BITS + select_in_word(!self.words[low], within))
    }
}

/// Position of the `k`-th set bit inside `word`; the caller guarantees it exists.
fn select_in_word(mut word: u64, k: usize) -> usize {
    for _ in 0..k {
        word &= word - 1;
    }
    word.trailing_zeros() as usize
}

impl std::fmt::Debug for BitVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitVector")
            .field("len", &self.len)
            .field("ones", &self.count_ones())
            .finish()
    }
}
