//! Vocabulary SDK
//!
//! Transport-agnostic types shared by the vocabulary module and its consumers:
//! - Model types for users, collections, words and statistics
//! - Error type (`VocabularyError`)

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod errors;
pub mod models;

pub use errors::VocabularyError;
pub use models::{
    Collection, CollectionPatch, Creator, CreatorWord, NewCollection, NewUser, NewWord,
    PageRequest, SearchField, SearchSettings, StatInterval, TimeBucket, TranslatedWord, User,
    UserSettings, Word, WordPatch, WordsPage,
};
