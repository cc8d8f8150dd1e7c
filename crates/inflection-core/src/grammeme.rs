// Grammeme bitset helpers
//
// A grammeme mask holds one bit per grammatical property registered when a
// dictionary was compiled. Bit meanings are local to one dictionary.

/// A set of grammemes, one bit per registered property.
pub type GrammemeMask = u64;

/// Maximum number of distinct grammemes a single dictionary can register.
pub const MAX_GRAMMEMES: usize = 64;

/// Returns `true` if every bit of `subset` is also set in `superset`.
#[inline]
pub fn contains_all(superset: GrammemeMask, subset: GrammemeMask) -> bool {
    superset & subset == subset
}

/// Returns `true` if the two masks share at least one bit.
#[inline]
pub fn intersects(a: GrammemeMask, b: GrammemeMask) -> bool {
    a & b != 0
}

/// Number of grammemes in the mask.
#[inline]
pub fn count(mask: GrammemeMask) -> u32 {
    mask.count_ones()
}

/// Maps a dense identifier to its single-bit mask.
///
/// Returns `None` for identifiers that do not fit in a 64-bit mask.
#[inline]
pub fn identifier_to_bit(id: usize) -> Option<GrammemeMask> {
    (id < MAX_GRAMMEMES).then(|| 1u64 << id)
}

/// Maps a single-bit mask back to its identifier.
///
/// Returns `None` when the mask is empty or has more than one bit set.
#[inline]
pub fn bit_to_identifier(mask: GrammemeMask) -> Option<usize> {
    if mask.count_ones() != 1 {
        return None;
    }
    Some(mask.trailing_zeros() as usize)
}

/// Iterator over the single-bit masks of a grammeme set, lowest bit first.
#[derive(Debug, Clone)]
pub struct Bits {
    remaining: GrammemeMask,
}

impl Iterator for Bits {
    type Item = GrammemeMask;

    fn next(&mut self) -> Option<GrammemeMask> {
        if self.remaining == 0 {
            return None;
        }
        let lowest = self.remaining & self.remaining.wrapping_neg();
        self.remaining &= self.remaining - 1;
        Some(lowest)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining.count_ones() as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Bits {}

/// Splits a mask into its single-bit components.
pub fn bits(mask: GrammemeMask) -> Bits {
    Bits { remaining: mask }
}

/// Folds an ordered list of masks into a priority score.
///
/// Each mask contributes one bit, set when `grammemes` intersects it. Earlier
/// masks land in higher bits, so a match on an earlier mask outranks any
/// combination of later ones.
pub fn priority_score(grammemes: GrammemeMask, ordered: &[GrammemeMask]) -> i64 {
    ordered.iter().fold(0i64, |score, &mask| {
        (score << 1) | i64::from(intersects(grammemes, mask))
    })
}
