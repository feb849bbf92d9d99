//! Public models for the vocabulary module.
//!
//! These are transport-agnostic data structures that define the contract
//! between the vocabulary module and its consumers.

use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// A registered account. The password digest never leaves the module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: OffsetDateTime,
    pub is_super: bool,
    pub settings: Option<UserSettings>,
}

/// Registration input; `password` is plaintext and is hashed before storage.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for NewUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUser")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Per-user preferences, one-to-one with [`User`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSettings {
    pub id: i64,
    pub user_id: i64,
    pub language: String,
}

/// A named, directional word list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    pub id: i64,
    pub name: String,
    pub owner_id: i64,
    pub lang_from: String,
    pub lang_to: String,
    pub created_at: OffsetDateTime,
    pub pdf_url: Option<String>,
    /// Attached on read; not stored with the collection record.
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCollection {
    pub name: String,
    pub lang_from: String,
    pub lang_to: String,
}

/// Only the name of a collection is mutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionPatch {
    pub name: String,
}

/// A vocabulary entry stored in the search index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Assigned by the search store.
    pub id: String,
    pub collection_id: i64,
    pub word: String,
    pub translation: String,
    pub part_of_speech: String,
    pub sentence: String,
    pub created_at: OffsetDateTime,
}

impl Word {
    /// Longest origin term, in characters, kept in the exact-term index.
    pub const MAX_TERM_CHARS: usize = 256;
    /// Longest document id the search store accepts.
    pub const MAX_ID_LEN: usize = 512;

    /// Ids are opaque URL-safe tokens: ASCII alphanumerics, `-` and `_`.
    #[must_use]
    pub fn is_valid_id(id: &str) -> bool {
        !id.is_empty()
            && id.len() <= Self::MAX_ID_LEN
            && id
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWord {
    pub collection_id: i64,
    pub word: String,
    pub translation: String,
    pub part_of_speech: String,
    pub sentence: String,
}

/// Replacement values for an existing word. Its id and collection stay fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPatch {
    pub word: String,
    pub translation: String,
    pub part_of_speech: String,
    pub sentence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordsPage {
    pub words: Vec<Word>,
    pub total: u64,
}

/// Word field a search is run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchField {
    Word,
    Translation,
    Sentence,
}

impl FromStr for SearchField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "word" => Ok(Self::Word),
            "translation" => Ok(Self::Translation),
            "sentence" | "scentance" => Ok(Self::Sentence),
            other => Err(format!("unsupported search field '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    pub text: String,
    pub search_by: SearchField,
    /// Empty means no part-of-speech restriction.
    pub parts_of_speech: Vec<String>,
}

/// Requested slice of a word listing.
///
/// `size = 0, page = 0` selects the unpaged mode, otherwise both values are
/// positive and `page` is 1-based. A page may not reach past
/// [`PageRequest::MAX_WINDOW`] hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    size: u64,
    page: u64,
}

impl PageRequest {
    pub const UNPAGED: Self = Self { size: 0, page: 0 };
    /// Deepest hit a paged listing may reach (`offset + size`).
    pub const MAX_WINDOW: u64 = 10_000;

    /// Returns `None` for combinations that would produce a negative offset
    /// or reach past [`Self::MAX_WINDOW`].
    #[must_use]
    pub fn new(size: u64, page: u64) -> Option<Self> {
        match (size, page) {
            (0, 0) => Some(Self::UNPAGED),
            (s, p) if s > 0 && p > 0 && s.saturating_mul(p) <= Self::MAX_WINDOW => {
                Some(Self { size: s, page: p })
            }
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unpaged(&self) -> bool {
        self.size == 0
    }

    #[must_use]
    pub fn offset(&self) -> u64 {
        if self.is_unpaged() {
            0
        } else {
            self.size.saturating_mul(self.page - 1)
        }
    }

    /// Page size, or `cap` in unpaged mode.
    #[must_use]
    pub fn limit(&self, cap: u64) -> u64 {
        if self.is_unpaged() { cap } else { self.size }
    }
}

/// Result of a stateless translation, echoing the caller's ordering index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedWord {
    pub word: String,
    pub index: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub name: String,
    pub email: String,
}

/// A global search hit with its owner, when the owner could be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatorWord {
    pub word: Word,
    pub creator: Option<Creator>,
}

/// Calendar granularity for word statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatInterval {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

impl StatInterval {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }
}

impl FromStr for StatInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            other => Err(format!("unsupported time interval '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBucket {
    pub date: String,
    pub count: u64,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn page_offsets_are_one_based() {
        let first = PageRequest::new(10, 1).unwrap();
        let second = PageRequest::new(10, 2).unwrap();
        assert_eq!(first.offset(), 0);
        assert_eq!(second.offset(), 10);
        assert_eq!(second.limit(1000), 10);
    }

    #[test]
    fn zero_size_and_page_is_unpaged() {
        let req = PageRequest::new(0, 0).unwrap();
        assert!(req.is_unpaged());
        assert_eq!(req.offset(), 0);
        assert_eq!(req.limit(1000), 1000);
    }

    #[test]
    fn half_zero_combinations_are_rejected() {
        assert_eq!(PageRequest::new(10, 0), None);
        assert_eq!(PageRequest::new(0, 3), None);
    }

    #[test]
    fn pages_past_the_result_window_are_rejected() {
        let last = PageRequest::new(100, 100).unwrap();
        assert_eq!(last.offset() + last.limit(0), PageRequest::MAX_WINDOW);
        assert_eq!(PageRequest::new(10_000, 2), None);
        assert_eq!(PageRequest::new(10_001, 1), None);
        assert_eq!(PageRequest::new(1, u64::MAX), None);
    }

    #[test]
    fn word_ids_are_url_safe_tokens() {
        assert!(Word::is_valid_id("aB3_x-9"));
        assert!(!Word::is_valid_id(""));
        assert!(!Word::is_valid_id("../../collection_words-5/_doc/victim"));
        assert!(!Word::is_valid_id("a/b"));
        assert!(!Word::is_valid_id("a?refresh=false"));
        assert!(!Word::is_valid_id("%2e%2e"));
        assert!(!Word::is_valid_id(&"x".repeat(Word::MAX_ID_LEN + 1)));
    }

    #[test]
    fn search_field_accepts_legacy_sentence_name() {
        assert_eq!("scentance".parse::<SearchField>(), Ok(SearchField::Sentence));
        assert!("created_at".parse::<SearchField>().is_err());
    }

    #[test]
    fn new_user_debug_hides_password() {
        let user = NewUser {
            name: "a".to_owned(),
            email: "a@b.c".to_owned(),
            password: "hunter22".to_owned(),
        };
        assert!(!format!("{user:?}").contains("hunter22"));
    }
}
