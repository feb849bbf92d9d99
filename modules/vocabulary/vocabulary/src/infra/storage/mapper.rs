//! Entity to domain model mappers.

use vocabulary_sdk::{Collection, User, UserSettings};

use super::entity::{collection, user, user_settings};
use crate::domain::repos::StoredUser;

impl From<user_settings::Model> for UserSettings {
    fn from(model: user_settings::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            language: model.language,
        }
    }
}

/// Collections are loaded without their words.
impl From<collection::Model> for Collection {
    fn from(model: collection::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            owner_id: model.owner_id,
            lang_from: model.lang_from,
            lang_to: model.lang_to,
            created_at: model.created_at,
            pdf_url: model.pdf_url,
            words: Vec::new(),
        }
    }
}

/// Split a user row into the public account and its password digest.
pub fn stored_user(model: user::Model, settings: Option<user_settings::Model>) -> StoredUser {
    StoredUser {
        user: User {
            id: model.id,
            name: model.name,
            email: model.email,
            created_at: model.created_at,
            is_super: model.is_super,
            settings: settings.map(Into::into),
        },
        password_hash: model.password,
    }
}
