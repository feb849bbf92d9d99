use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use vocabulary_sdk::{NewUser, User, UserSettings};

use super::{ServiceConfig, require_non_empty};
use crate::domain::error::DomainError;
use crate::domain::ports::{CredentialHasher, TokenService};
use crate::domain::repos::{SearchIndexProvisioner, UsersRepository};

/// Accounts, credentials and per-request authentication.
pub struct UsersService {
    repo: Arc<dyn UsersRepository>,
    index: Arc<dyn SearchIndexProvisioner>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn TokenService>,
    config: Arc<ServiceConfig>,
}

impl UsersService {
    pub fn new(
        repo: Arc<dyn UsersRepository>,
        index: Arc<dyn SearchIndexProvisioner>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn TokenService>,
        config: Arc<ServiceConfig>,
    ) -> Self {
        Self {
            repo,
            index,
            hasher,
            tokens,
            config,
        }
    }

    /// Create the account, its settings row and its search index.
    ///
    /// # Errors
    /// Validation failures, `Conflict` for a taken email, and store or index failures.
    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn register(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Registering user");
        self.validate_registration(&new_user)?;

        let email = new_user.email.trim().to_owned();
        let existing = self
            .repo
            .find_by_email(&email)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;
        if existing.is_some() {
            return Err(DomainError::conflict(format!(
                "user with email '{email}' already exists"
            )));
        }

        let digest = self.hash_password(new_user.password).await?;
        let user = self
            .repo
            .create_with_settings(new_user.name.trim(), &email, &digest)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;

        self.index
            .ensure_user_index(user.id)
            .await
            .map_err(|e| DomainError::search(format!("failed to provision user index: {e:#}")))?;

        info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    /// `Unauthorized` for an unknown email or wrong password.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, DomainError> {
        let stored = self
            .repo
            .find_by_email(email.trim())
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?;

        let Some(stored) = stored else {
            debug!("Login for unknown email");
            return Err(DomainError::unauthorized("invalid email or password"));
        };

        if !self.verify_password(password, &stored.password_hash).await? {
            debug!(user_id = stored.user.id, "Login with wrong password");
            return Err(DomainError::unauthorized("invalid email or password"));
        }

        let token = self
            .tokens
            .issue(stored.user.id, self.config.token_ttl)
            .map_err(|e| DomainError::internal(format!("failed to issue token: {e:#}")))?;

        info!(user_id = stored.user.id, "User logged in");
        Ok(token)
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    /// `Unauthorized` when the token is invalid or names an unknown user.
    pub async fn authenticate(&self, token: &str) -> Result<User, DomainError> {
        let user_id = self.tokens.parse(token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            DomainError::unauthorized("invalid token")
        })?;

        self.repo
            .find_by_id(user_id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| {
                warn!(user_id, "Token subject does not match any user");
                DomainError::unauthorized("unknown user")
            })
    }

    /// # Errors
    /// `NotFound` if the user no longer exists.
    pub async fn get(&self, user_id: i64) -> Result<User, DomainError> {
        self.repo
            .find_by_id(user_id)
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::not_found("User", user_id))
    }

    /// # Errors
    /// Validation failure for an empty language, `NotFound` without a settings row.
    #[instrument(skip(self))]
    pub async fn update_language(
        &self,
        user_id: i64,
        language: &str,
    ) -> Result<UserSettings, DomainError> {
        require_non_empty("language", language)?;

        let settings = self
            .repo
            .update_language(user_id, language.trim())
            .await
            .map_err(|e| DomainError::database(format!("{e:#}")))?
            .ok_or_else(|| DomainError::not_found("UserSettings", user_id))?;

        info!(user_id, "User language updated");
        Ok(settings)
    }

    fn validate_registration(&self, new_user: &NewUser) -> Result<(), DomainError> {
        require_non_empty("name", &new_user.name)?;
        if new_user.name.trim().chars().count() > self.config.max_name_length {
            return Err(DomainError::validation(
                "name",
                format!("must be at most {} characters", self.config.max_name_length),
            ));
        }

        let email = new_user.email.trim();
        require_non_empty("email", email)?;
        let well_formed = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
        if !well_formed {
            return Err(DomainError::validation("email", "must be a valid email address"));
        }

        if new_user.password.chars().count() < self.config.min_password_length {
            return Err(DomainError::validation(
                "password",
                format!(
                    "must be at least {} characters",
                    self.config.min_password_length
                ),
            ));
        }
        Ok(())
    }

    async fn hash_password(&self, password: String) -> Result<String, DomainError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::internal(format!("hashing task failed: {e}")))?
            .map_err(|e| DomainError::internal(format!("failed to hash password: {e:#}")))
    }

    async fn verify_password(&self, password: &str, digest: &str) -> Result<bool, DomainError> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();
        let digest = digest.to_owned();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &digest))
            .await
            .map_err(|e| DomainError::internal(format!("verification task failed: {e}")))
    }
}
