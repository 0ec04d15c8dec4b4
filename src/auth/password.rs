//! Password hashing and verification.
//!
//! Plaintext and hashed passwords are distinct types. [`PlaintextPassword`]
//! can be deserialized from a request body but never serialized or printed,
//! and [`PasswordHash`] holds the Argon2id PHC string that gets persisted.

use super::AuthError;
use argon2::{
    password_hash::{
        rand_core::OsRng, Error as PhcError, PasswordHash as PhcHash, PasswordHasher,
        PasswordVerifier, SaltString,
    },
    Argon2,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;

/// A plaintext password as received from a client.
///
/// Lives only for the duration of a request. It has no `Serialize` impl and
/// its `Debug` output is redacted, so it cannot end up in a response body,
/// the database, or a log line by accident.
#[derive(Deserialize)]
#[serde(from = "String")]
pub struct PlaintextPassword(SecretString);

impl PlaintextPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(SecretString::new(password.into().into_boxed_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.expose_secret().is_empty()
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.expose_secret().as_bytes()
    }
}

impl From<String> for PlaintextPassword {
    fn from(password: String) -> Self {
        Self::new(password)
    }
}

impl fmt::Debug for PlaintextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextPassword([REDACTED])")
    }
}

/// A salted Argon2id hash in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wraps a hash that was previously produced by [`derive`] and read back
    /// from storage.
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Hashes a password using Argon2id with a fresh random salt.
///
/// Only fails when the hasher itself cannot run (salt generation or
/// parameter errors), never because of the password's content.
pub fn derive(password: &PlaintextPassword) -> Result<PasswordHash, AuthError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| PasswordHash(hash.to_string()))
        .map_err(|e| AuthError::HashingFailure(e.to_string()))
}

/// Verifies a password against a stored hash.
///
/// A wrong password is `Ok(false)`. An `Err` means the stored hash could not
/// be parsed or the verifier failed for reasons unrelated to the password.
/// The digest comparison inside `argon2` is constant time.
pub fn verify(hash: &PasswordHash, password: &PlaintextPassword) -> Result<bool, AuthError> {
    let parsed = PhcHash::new(hash.as_str()).map_err(|e| AuthError::MalformedHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(PhcError::Password) => Ok(false),
        Err(e) => Err(AuthError::MalformedHash(e.to_string())),
    }
}
