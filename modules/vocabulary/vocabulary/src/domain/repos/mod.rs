mod collections_repo;
mod users_repo;
mod words_repo;

pub use collections_repo::CollectionsRepository;
pub use users_repo::{StoredUser, UsersRepository};
pub use words_repo::{SearchIndexProvisioner, WordScope, WordsRepository};
