//! Shared vocabulary for the inflection engine crates.
//!
//! # Architecture
//!
//! - [`grammeme`] -- 64-bit grammeme bitset helpers
//! - [`case`] -- Case detection and locale-aware case conversion
//! - [`locale`] -- Language tags and dictionary fallbacks

pub mod case;
pub mod grammeme;
pub mod locale;

pub use grammeme::GrammemeMask;
pub use locale::Locale;
