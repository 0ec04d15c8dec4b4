//! Opaque bearer token generation and fingerprinting.
//!
//! A bearer secret is 32 random bytes encoded as URL-safe Base64 without
//! padding. Only its SHA-256 fingerprint is ever stored; the secret itself is
//! handed to the client once and then dropped.

use super::AuthError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Lifetime of a login token.
pub const AUTH_TOKEN_TTL_HOURS: i64 = 24;

/// Length of the random part of a bearer secret in bytes
const TOKEN_RANDOM_BYTES: usize = 32;

/// Returns the fixed lifetime of authentication tokens.
pub fn auth_token_ttl() -> Duration {
    Duration::hours(AUTH_TOKEN_TTL_HOURS)
}

/// What a token may be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Authentication,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Authentication => "authentication",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "authentication" => Ok(Scope::Authentication),
            other => Err(format!("unknown token scope '{}'", other)),
        }
    }
}

/// The secret half of a token. Possession implies authorization.
pub struct BearerSecret(String);

impl BearerSecret {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for BearerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerSecret([REDACTED])")
    }
}

/// SHA-256 of a bearer secret, hex encoded. This is what the store keeps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenFingerprint(String);

impl TokenFingerprint {
    /// Fingerprints a presented secret.
    pub fn of(secret: &str) -> Self {
        Self(hex::encode(Sha256::digest(secret.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The persisted shape of a token: everything except the secret.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub fingerprint: TokenFingerprint,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: Scope,
}

/// A freshly minted token, before and after it is persisted.
#[derive(Debug)]
pub struct IssuedToken {
    pub secret: BearerSecret,
    pub fingerprint: TokenFingerprint,
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    pub scope: Scope,
}

impl IssuedToken {
    pub fn record(&self) -> TokenRecord {
        TokenRecord {
            fingerprint: self.fingerprint.clone(),
            user_id: self.user_id,
            expiry: self.expiry,
            scope: self.scope,
        }
    }
}

/// Mints a new token for `user_id` that expires `ttl` after `now`.
///
/// The expiry is rounded up to the next whole second so the value returned
/// to the client matches what the store compares against and still lies
/// after `now`.
pub fn generate(
    user_id: i64,
    ttl: Duration,
    scope: Scope,
    now: DateTime<Utc>,
) -> Result<IssuedToken, AuthError> {
    if ttl <= Duration::zero() {
        return Err(AuthError::InvalidTtl);
    }

    let random_bytes: [u8; TOKEN_RANDOM_BYTES] = rand::random();
    let secret = URL_SAFE_NO_PAD.encode(random_bytes);
    let fingerprint = TokenFingerprint::of(&secret);

    let exact = now + ttl;
    let mut seconds = exact.timestamp();
    if exact.timestamp_subsec_nanos() != 0 {
        seconds += 1;
    }
    let expiry = DateTime::from_timestamp(seconds, 0).ok_or(AuthError::InvalidTtl)?;

    Ok(IssuedToken {
        secret: BearerSecret(secret),
        fingerprint,
        user_id,
        expiry,
        scope,
    })
}
