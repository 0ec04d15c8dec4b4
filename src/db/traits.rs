//! Database abstraction traits
//!
//! This module provides the `DatabaseClient` trait that abstracts over different
//! database backends (in-memory SQLite, file-based SQLite, remote Turso).
//!
//! # Example
//!
//! ```rust,ignore
//! use liftlog::db::{DatabaseClient, DatabaseProvider};
//!
//! // Use in-memory database (default for development/testing)
//! let db = DatabaseProvider::Memory.create_client().await?;
//!
//! // Use file-based SQLite
//! let db = DatabaseProvider::SQLite { path: "data.db".into() }.create_client().await?;
//!
//! // Use remote Turso (requires `turso` feature)
//! let db = DatabaseProvider::Turso { url, auth_token }.create_client().await?;
//! ```

use crate::auth::password::PasswordHash;
use crate::auth::tokens::{Scope, TokenFingerprint, TokenRecord};
use crate::types::{AppError, NewUser, ProfileUpdate, Result, User, Workout, WorkoutInput};
use crate::utils::toml_config::DatabaseConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Database provider configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DatabaseProvider {
    /// In-memory SQLite database (ephemeral, lost on restart)
    #[default]
    Memory,
    /// File-based SQLite database
    SQLite {
        /// Path to the SQLite database file
        path: String,
    },
    /// Remote Turso database (requires network access)
    #[cfg(feature = "turso")]
    Turso {
        /// The Turso database URL (e.g., `libsql://your-db.turso.io`)
        url: String,
        /// Authentication token for the Turso database
        auth_token: String,
    },
}

impl DatabaseProvider {
    /// Create a database client from this provider configuration
    pub async fn create_client(&self) -> Result<Box<dyn DatabaseClient>> {
        match self {
            DatabaseProvider::Memory => {
                let client = super::turso::TursoClient::new_memory().await?;
                Ok(Box::new(client))
            }
            DatabaseProvider::SQLite { path } => {
                let client = super::turso::TursoClient::new_local(path).await?;
                Ok(Box::new(client))
            }
            #[cfg(feature = "turso")]
            DatabaseProvider::Turso { url, auth_token } => {
                let client =
                    super::turso::TursoClient::new_remote(url.clone(), auth_token.clone()).await?;
                Ok(Box::new(client))
            }
        }
    }

    /// Picks a provider from the `[database]` section.
    ///
    /// Turso wins when the feature is enabled and both referenced environment
    /// variables are set. Otherwise `":memory:"` selects the in-memory database
    /// and any other url is treated as a file path.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        #[cfg(feature = "turso")]
        {
            if let (Some(url_env), Some(token_env)) =
                (config.turso_url_env.as_deref(), config.turso_token_env.as_deref())
            {
                if let (Ok(url), Ok(token)) = (std::env::var(url_env), std::env::var(token_env)) {
                    if !url.is_empty() && !token.is_empty() {
                        return Ok(DatabaseProvider::Turso {
                            url,
                            auth_token: token,
                        });
                    }
                }
            }
        }

        let url = config.url.trim();
        if url.is_empty() {
            return Err(AppError::Internal("database url must not be empty".to_string()));
        }

        if url == ":memory:" {
            return Ok(DatabaseProvider::Memory);
        }

        let path = url.strip_prefix("file:").unwrap_or(url);
        Ok(DatabaseProvider::SQLite {
            path: path.to_string(),
        })
    }
}

/// Abstract trait for database operations
///
/// The store is the only place users, tokens and workouts live. Nothing above
/// it caches their state, so a write acknowledged here is visible to every
/// later read.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    // ============== User Operations ==============

    /// Insert a user and return the stored row.
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn get_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Replace username, email and bio. `NotFound` when the user does not exist.
    async fn update_user_profile(&self, id: i64, update: &ProfileUpdate) -> Result<User>;

    /// Replace the stored password hash. `NotFound` when the user does not exist.
    async fn update_password_hash(&self, id: i64, hash: &PasswordHash) -> Result<()>;

    // ============== Token Operations ==============

    /// Store a token fingerprint. Fingerprints are unique.
    async fn insert_token(&self, token: &TokenRecord) -> Result<()>;

    /// Find the owner of a token with this fingerprint and scope whose expiry
    /// is strictly after `now`.
    async fn get_user_for_token(
        &self,
        scope: Scope,
        fingerprint: &TokenFingerprint,
        now: DateTime<Utc>,
    ) -> Result<Option<User>>;

    /// Delete every token of `user_id` in `scope`.
    async fn delete_all_tokens_for_user(&self, user_id: i64, scope: Scope) -> Result<()>;

    /// Delete tokens that expired at or before `now`, returning how many were removed.
    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64>;

    // ============== Workout Operations ==============

    /// Insert a workout and its entries owned by `owner_id`.
    async fn create_workout(&self, owner_id: i64, workout: &WorkoutInput) -> Result<Workout>;

    async fn get_workout_by_id(&self, id: i64) -> Result<Option<Workout>>;

    /// Owner id of a workout, `None` when it does not exist.
    async fn get_workout_owner(&self, id: i64) -> Result<Option<i64>>;

    /// Replace a workout's fields and entries. `NotFound` when it does not exist.
    async fn update_workout(&self, id: i64, workout: &WorkoutInput) -> Result<Workout>;

    /// `NotFound` when the workout does not exist.
    async fn delete_workout(&self, id: i64) -> Result<()>;
}
