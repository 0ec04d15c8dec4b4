//! Authentication and Authorization
//!
//! This module turns a bearer secret on an incoming request into an
//! [`Identity`], and decides which identities may mutate which resources.
//!
//! # Module Structure
//!
//! - [`auth::password`](crate::auth::password) - Argon2id password hashing and verification
//! - [`auth::tokens`](crate::auth::tokens) - Opaque bearer token generation and fingerprinting
//! - [`auth::clock`](crate::auth::clock) - Injectable time source
//! - [`auth::service`](crate::auth::service) - Issuing, persisting, resolving and revoking tokens
//! - [`auth::identity`](crate::auth::identity) - The request principal
//! - [`auth::middleware`](crate::auth::middleware) - Axum middleware and extractors
//! - [`auth::ownership`](crate::auth::ownership) - Owner-only mutation checks
//!
//! # Security Features
//!
//! - **Password Hashing**: Argon2id with a random salt per hash, stored as a PHC string
//! - **Bearer Tokens**: 256 random bits, only the SHA-256 fingerprint is persisted
//! - **Revocation**: Tokens are looked up on every request, so deleting them takes effect immediately
//!
//! # Usage
//!
//! ```ignore
//! use liftlog::auth::{tokens::{auth_token_ttl, Scope}, AuthService};
//!
//! let token = auth_service
//!     .create_token(user.id, auth_token_ttl(), Scope::Authentication)
//!     .await?;
//! // token.secret is returned to the client exactly once
//! ```

/// Injectable time source.
pub mod clock;
/// The principal a request runs as.
pub mod identity;
/// Authentication middleware and extractors.
pub mod middleware;
/// Owner-only mutation checks.
pub mod ownership;
/// Argon2id password hashing.
pub mod password;
/// Token issuance, resolution and revocation.
pub mod service;
/// Opaque bearer tokens.
pub mod tokens;

pub use clock::{Clock, ManualClock, SystemClock};
pub use identity::Identity;
pub use service::AuthService;

use thiserror::Error;

/// Errors raised while authenticating a request or handling credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    HashingFailure(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("invalid credentials")]
    CredentialMismatch,

    #[error("invalid or expired authentication token")]
    TokenNotFound,

    #[error("invalid or missing authentication token")]
    MalformedHeader,

    #[error("you must be authenticated to access this resource")]
    AuthenticationRequired,

    #[error("Token lifetime must be positive")]
    InvalidTtl,
}
