// Language tags and dictionary language fallbacks

use std::fmt;
use std::str::FromStr;

/// Longest language subtag stored in a compiled dictionary header.
pub const MAX_LANGUAGE_CODE_LENGTH: usize = 4;

/// Error type for malformed locale identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LocaleError {
    #[error("empty locale identifier")]
    Empty,
    #[error("invalid language subtag: {0}")]
    InvalidLanguage(String),
}

/// A parsed locale identifier such as `en`, `en-US` or `pt_BR`.
///
/// Only the language subtag selects a dictionary; the remaining subtags are
/// kept for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale {
    language: String,
    rest: Vec<String>,
}

impl Locale {
    /// Parse a BCP 47 or POSIX style identifier.
    pub fn parse(tag: &str) -> Result<Self, LocaleError> {
        let mut parts = tag.split(['-', '_']).filter(|p| !p.is_empty());
        let language = parts.next().ok_or(LocaleError::Empty)?;
        if language.len() < 2
            || language.len() > MAX_LANGUAGE_CODE_LENGTH
            || !language.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(LocaleError::InvalidLanguage(language.to_string()));
        }
        Ok(Locale {
            language: language.to_ascii_lowercase(),
            rest: parts.map(str::to_string).collect(),
        })
    }

    /// The lowercase language subtag.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Locale made of the language subtag only.
    pub fn generic(&self) -> Locale {
        Locale {
            language: self.language.clone(),
            rest: Vec::new(),
        }
    }

    /// Language whose dictionary serves this one when it has none of its own.
    ///
    /// Cantonese and Shanghainese share the Chinese dictionary.
    pub fn fallback_language(&self) -> Option<&'static str> {
        match self.language.as_str() {
            "yue" | "wuu" => Some("zh"),
            _ => None,
        }
    }

    /// Languages using the Turkic dotted/dotless i casing rules.
    pub fn has_turkic_casing(&self) -> bool {
        matches!(self.language.as_str(), "tr" | "az")
    }
}

impl FromStr for Locale {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::parse(s)
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.language)?;
        for part in &self.rest {
            write!(f, "_{part}")?;
        }
        Ok(())
    }
}
