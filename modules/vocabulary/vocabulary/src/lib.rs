//! Vocabulary Module Implementation
//!
//! Users, word collections and words, with per-user search indices,
//! translation and PDF export. Public models live in `vocabulary-sdk`
//! and are re-exported here.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub use vocabulary_sdk::{
    Collection, NewCollection, NewUser, NewWord, User, UserSettings, VocabularyError, Word,
};

pub mod config;
pub mod module;
pub use config::VocabularyConfig;
pub use module::VocabularyModule;

#[doc(hidden)]
pub mod api;
#[doc(hidden)]
pub mod domain;
#[doc(hidden)]
pub mod infra;
