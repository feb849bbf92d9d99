//! SeaORM entities for the relational store.

pub mod collection;
pub mod user;
pub mod user_settings;
