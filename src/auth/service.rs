//! Password hashing and token lifecycle on top of the store.

use super::clock::Clock;
use super::password::{self, PasswordHash, PlaintextPassword};
use super::tokens::{self, IssuedToken, Scope, TokenFingerprint};
use super::AuthError;
use crate::db::DatabaseClient;
use crate::types::{Result, User};
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};

/// Authentication service for password hashing and opaque token management.
///
/// Owns no state of its own beyond the injected store and clock; every
/// resolution goes to the store so revocation and expiry take effect on the
/// very next request.
pub struct AuthService {
    db: Arc<dyn DatabaseClient>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Creates a new AuthService backed by `db`, reading time from `clock`.
    pub fn new(db: Arc<dyn DatabaseClient>, clock: Arc<dyn Clock>) -> Self {
        Self { db, clock }
    }

    /// Hashes a password using Argon2id.
    pub fn hash_password(&self, password: &PlaintextPassword) -> Result<PasswordHash> {
        Ok(password::derive(password)?)
    }

    /// Verifies a password against a stored hash. A mismatch is `Ok(false)`.
    pub fn verify_password(&self, password: &PlaintextPassword, hash: &PasswordHash) -> Result<bool> {
        Ok(password::verify(hash, password)?)
    }

    /// Checks a username/password pair.
    ///
    /// Unknown usernames and wrong passwords both fail with
    /// [`AuthError::CredentialMismatch`].
    pub async fn check_credentials(
        &self,
        username: &str,
        password: &PlaintextPassword,
    ) -> Result<User> {
        let Some(user) = self.db.get_user_by_username(username).await? else {
            debug!("login attempt for unknown username");
            return Err(AuthError::CredentialMismatch.into());
        };

        if !self.verify_password(password, &user.password_hash)? {
            debug!(user_id = user.id, "login attempt with wrong password");
            return Err(AuthError::CredentialMismatch.into());
        }

        Ok(user)
    }

    /// Mints a token without persisting it.
    pub fn issue(&self, user_id: i64, ttl: Duration, scope: Scope) -> Result<IssuedToken> {
        Ok(tokens::generate(user_id, ttl, scope, self.clock.now())?)
    }

    /// Stores the fingerprint of an issued token. The secret is not passed on.
    pub async fn persist(&self, token: &IssuedToken) -> Result<()> {
        self.db.insert_token(&token.record()).await
    }

    /// Issues and persists a token in one step.
    pub async fn create_token(&self, user_id: i64, ttl: Duration, scope: Scope) -> Result<IssuedToken> {
        let token = self.issue(user_id, ttl, scope)?;
        self.persist(&token).await?;

        info!(user_id, scope = %scope, expiry = %token.expiry, "issued token");
        Ok(token)
    }

    /// Deletes every stored token for `user_id` in `scope`.
    pub async fn revoke_all(&self, user_id: i64, scope: Scope) -> Result<()> {
        self.db.delete_all_tokens_for_user(user_id, scope).await?;

        info!(user_id, scope = %scope, "revoked all tokens");
        Ok(())
    }

    /// Deletes tokens whose expiry has passed. Lookups already ignore them,
    /// so this only keeps the table small.
    pub async fn purge_expired(&self) -> Result<u64> {
        let removed = self.db.delete_expired_tokens(self.clock.now()).await?;
        if removed > 0 {
            debug!(removed, "purged expired tokens");
        }
        Ok(removed)
    }

    /// Resolves a presented bearer secret to the user that owns it.
    ///
    /// Never-issued, expired, revoked and wrong-scope tokens all fail with
    /// [`AuthError::TokenNotFound`].
    pub async fn resolve(&self, scope: Scope, presented_secret: &str) -> Result<User> {
        let fingerprint = TokenFingerprint::of(presented_secret);

        self.db
            .get_user_for_token(scope, &fingerprint, self.clock.now())
            .await?
            .ok_or_else(|| AuthError::TokenNotFound.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::clock::ManualClock;
    use crate::auth::tokens::auth_token_ttl;
    use crate::db::TursoClient;
    use crate::types::{AppError, NewUser};
    use chrono::DateTime;

    async fn create_test_service() -> (AuthService, Arc<ManualClock>, User) {
        let db: Arc<dyn DatabaseClient> = Arc::new(
            TursoClient::new_memory()
                .await
                .expect("should create in-memory database"),
        );
        let clock = Arc::new(ManualClock::starting_now());
        let service = AuthService::new(db.clone(), clock.clone());

        let password_hash = service
            .hash_password(&PlaintextPassword::new("secret123"))
            .expect("should hash password");
        let user = db
            .create_user(&NewUser {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password_hash,
                bio: String::new(),
            })
            .await
            .expect("should create user");

        (service, clock, user)
    }

    fn is_token_not_found(result: &Result<User>) -> bool {
        matches!(result, Err(AppError::Auth(AuthError::TokenNotFound)))
    }

    #[tokio::test]
    async fn test_check_credentials() {
        let (service, _, user) = create_test_service().await;

        let found = service
            .check_credentials("alice", &PlaintextPassword::new("secret123"))
            .await
            .expect("correct credentials should pass");
        assert_eq!(found.id, user.id);

        let wrong = service
            .check_credentials("alice", &PlaintextPassword::new("wrong"))
            .await;
        assert!(matches!(wrong, Err(AppError::Auth(AuthError::CredentialMismatch))));

        let unknown = service
            .check_credentials("bob", &PlaintextPassword::new("secret123"))
            .await;
        assert!(matches!(unknown, Err(AppError::Auth(AuthError::CredentialMismatch))));
    }

    #[tokio::test]
    async fn test_issued_token_resolves_to_owner() {
        let (service, _, user) = create_test_service().await;

        let token = service
            .create_token(user.id, auth_token_ttl(), Scope::Authentication)
            .await
            .expect("should create token");

        let resolved = service
            .resolve(Scope::Authentication, token.secret.expose())
            .await
            .expect("fresh token should resolve");
        assert_eq!(resolved.id, user.id);
        assert_eq!(resolved.username, "alice");
    }

    #[tokio::test]
    async fn test_unpersisted_token_does_not_resolve() {
        let (service, _, user) = create_test_service().await;

        let token = service
            .issue(user.id, auth_token_ttl(), Scope::Authentication)
            .unwrap();

        let result = service.resolve(Scope::Authentication, token.secret.expose()).await;
        assert!(is_token_not_found(&result));
    }

    #[tokio::test]
    async fn test_fingerprint_as_secret_does_not_resolve() {
        let (service, _, user) = create_test_service().await;

        let token = service
            .create_token(user.id, auth_token_ttl(), Scope::Authentication)
            .await
            .unwrap();

        let result = service
            .resolve(Scope::Authentication, token.fingerprint.as_str())
            .await;
        assert!(is_token_not_found(&result));
    }

    #[tokio::test]
    async fn test_token_expires_exactly_at_expiry() {
        let (service, clock, user) = create_test_service().await;
        clock.set(DateTime::from_timestamp(1_700_000_000, 0).unwrap());

        let token = service
            .create_token(user.id, Duration::seconds(60), Scope::Authentication)
            .await
            .unwrap();

        clock.advance(Duration::seconds(59));
        assert!(service
            .resolve(Scope::Authentication, token.secret.expose())
            .await
            .is_ok());

        clock.advance(Duration::seconds(1));
        let result = service.resolve(Scope::Authentication, token.secret.expose()).await;
        assert!(is_token_not_found(&result), "token must be invalid once now == expiry");
    }

    #[tokio::test]
    async fn test_token_invalid_after_24_hours() {
        let (service, clock, user) = create_test_service().await;

        let token = service
            .create_token(user.id, auth_token_ttl(), Scope::Authentication)
            .await
            .unwrap();

        clock.advance(Duration::hours(24) + Duration::seconds(1));

        let result = service.resolve(Scope::Authentication, token.secret.expose()).await;
        assert!(is_token_not_found(&result));
    }

    #[tokio::test]
    async fn test_revoke_all_invalidates_every_token() {
        let (service, _, user) = create_test_service().await;

        let first = service
            .create_token(user.id, auth_token_ttl(), Scope::Authentication)
            .await
            .unwrap();
        let second = service
            .create_token(user.id, auth_token_ttl(), Scope::Authentication)
            .await
            .unwrap();
        assert_ne!(first.fingerprint, second.fingerprint);

        service
            .revoke_all(user.id, Scope::Authentication)
            .await
            .expect("should revoke");

        for token in [&first, &second] {
            let result = service.resolve(Scope::Authentication, token.secret.expose()).await;
            assert!(is_token_not_found(&result));
        }
    }

    #[tokio::test]
    async fn test_purge_expired_leaves_live_tokens() {
        let (service, clock, user) = create_test_service().await;

        service
            .create_token(user.id, Duration::hours(1), Scope::Authentication)
            .await
            .unwrap();
        let live = service
            .create_token(user.id, auth_token_ttl(), Scope::Authentication)
            .await
            .unwrap();

        assert_eq!(service.purge_expired().await.unwrap(), 0);

        clock.advance(Duration::hours(2));
        assert_eq!(service.purge_expired().await.unwrap(), 1);

        let resolved = service
            .resolve(Scope::Authentication, live.secret.expose())
            .await
            .expect("live token should survive the purge");
        assert_eq!(resolved.id, user.id);
    }
}
