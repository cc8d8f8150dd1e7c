// Case type detection and locale-aware case conversion

use crate::locale::Locale;

/// Classification of character casing within a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseType {
    /// No cased letters in the word (only digits, punctuation, etc.).
    NoLetters,
    /// All letters are lowercase: "cat".
    AllLower,
    /// First letter is uppercase, rest are lowercase: "Cat".
    FirstUpper,
    /// Mixed case that does not fit other patterns: "iPhone".
    Complex,
    /// All letters are uppercase: "CAT".
    AllUpper,
}

/// Detect the case pattern of a word.
///
/// Characters without case (digits, punctuation) are ignored.
pub fn detect_case(word: &str) -> CaseType {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return CaseType::NoLetters;
    };

    let first_uc = first.is_uppercase();
    let mut no_letters = !(first.is_uppercase() || first.is_lowercase());
    let mut all_uc = !first.is_lowercase();
    let mut rest_lc = true;

    for c in chars {
        if c.is_uppercase() {
            no_letters = false;
            rest_lc = false;
        }
        if c.is_lowercase() {
            no_letters = false;
            all_uc = false;
        }
    }

    if no_letters {
        CaseType::NoLetters
    } else if all_uc {
        CaseType::AllUpper
    } else if !rest_lc {
        CaseType::Complex
    } else if first_uc {
        CaseType::FirstUpper
    } else {
        CaseType::AllLower
    }
}

/// True for a non-empty word that lowercasing leaves unchanged.
pub fn is_all_lower(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.to_lowercase().eq(std::iter::once(c)))
}

/// True for a non-empty word that uppercasing leaves unchanged.
pub fn is_all_upper(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.to_uppercase().eq(std::iter::once(c)))
}

/// True when the first character is an uppercase letter.
pub fn starts_upper(word: &str) -> bool {
    word.chars().next().is_some_and(char::is_uppercase)
}

/// Lowercase `word` using the casing rules of `locale`.
///
/// This is the normalization applied before retrying a dictionary lookup.
pub fn lowercase(word: &str, locale: &Locale) -> String {
    if !locale.has_turkic_casing() {
        return word.to_lowercase();
    }
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        match c {
            'I' => out.push('\u{0131}'),
            '\u{0130}' => out.push('i'),
            _ => out.extend(c.to_lowercase()),
        }
    }
    out
}

/// Uppercase `word` using the casing rules of `locale`.
pub fn uppercase(word: &str, locale: &Locale) -> String {
    if !locale.has_turkic_casing() {
        return word.to_uppercase();
    }
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        match c {
            'i' => out.push('\u{0130}'),
            '\u{0131}' => out.push('I'),
            _ => out.extend(c.to_uppercase()),
        }
    }
    out
}

/// Uppercase the first character of `word`, leaving the rest untouched.
pub fn capitalize_first(word: &str, locale: &Locale) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if !first.is_uppercase() => {
            let mut out = uppercase(first.encode_utf8(&mut [0u8; 4]), locale);
            out.push_str(chars.as_str());
            out
        }
        _ => word.to_string(),
    }
}
