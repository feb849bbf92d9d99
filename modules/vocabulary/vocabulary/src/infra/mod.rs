//! Adapters behind the domain repository and collaborator traits.

pub mod auth;
pub mod aws;
pub mod object_storage;
pub mod pdf;
pub mod search;
pub mod storage;
pub mod translate;
