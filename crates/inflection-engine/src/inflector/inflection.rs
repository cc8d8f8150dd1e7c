// One suffix of an inflection pattern with its grammemes

use std::fmt;

use inflection_core::grammeme::GrammemeMask;

use super::pattern::InflectionPattern;

/// A form of a pattern: the suffix that ends it and what it expresses.
#[derive(Clone)]
pub struct Inflection<'a> {
    pattern: InflectionPattern<'a>,
    suffix_id: usize,
    suffix: String,
    grammemes: GrammemeMask,
}

impl<'a> Inflection<'a> {
    pub(crate) fn new(
        pattern: InflectionPattern<'a>,
        suffix_id: usize,
        suffix: String,
        grammemes: GrammemeMask,
    ) -> Self {
        Inflection {
            pattern,
            suffix_id,
            suffix,
            grammemes,
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn suffix_id(&self) -> usize {
        self.suffix_id
    }

    pub fn grammemes(&self) -> GrammemeMask {
        self.grammemes
    }

    /// The pattern this inflection belongs to.
    pub fn pattern(&self) -> &InflectionPattern<'a> {
        &self.pattern
    }
}

impl PartialEq for Inflection<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.suffix_id == other.suffix_id
            && self.grammemes == other.grammemes
    }
}

impl Eq for Inflection<'_> {}

impl fmt::Debug for Inflection<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inflection")
            .field("pattern", &self.pattern.id())
            .field("suffix", &self.suffix)
            .field("grammemes", &format_args!("{:#x}", self.grammemes))
            .finish()
    }
}
