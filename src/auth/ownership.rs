//! Ownership checks for mutating owned resources.
//!
//! Creation is not checked here: a new workout is bound to the caller.
//! Reads of workouts are public. Updates and deletes must pass
//! [`ensure_workout_owner`] first.
//!
//! A missing workout and a workout owned by someone else produce the same
//! 404 response so callers cannot probe which ids exist.

use super::Identity;
use crate::db::DatabaseClient;
use crate::types::{AppError, Result};
use tracing::{debug, warn};

/// Outcome of an ownership check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied,
}

/// Allows the mutation only when `identity` is authenticated as `owner_id`.
pub fn authorize_mutation(identity: &Identity, owner_id: i64) -> Decision {
    match identity {
        Identity::Authenticated(user) if user.id == owner_id => Decision::Allowed,
        Identity::Authenticated(_) | Identity::Anonymous => Decision::Denied,
    }
}

fn workout_not_found() -> AppError {
    AppError::NotFound("workout not found".to_string())
}

/// Loads the owner of `workout_id` and checks it against `identity`.
///
/// Anonymous callers get `AuthenticationRequired` (401) before any lookup.
/// Unknown workouts and foreign workouts both map to `NotFound` (404).
pub async fn ensure_workout_owner(
    db: &dyn DatabaseClient,
    identity: &Identity,
    workout_id: i64,
) -> Result<()> {
    let user = identity.require_user().map_err(AppError::from)?;

    let Some(owner_id) = db.get_workout_owner(workout_id).await? else {
        debug!(workout_id, user_id = user.id, "mutation on unknown workout");
        return Err(workout_not_found());
    };

    match authorize_mutation(identity, owner_id) {
        Decision::Allowed => Ok(()),
        Decision::Denied => {
            warn!(
                workout_id,
                user_id = user.id,
                "denied mutation of workout owned by another user"
            );
            Err(workout_not_found())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::PasswordHash;
    use crate::types::User;
    use chrono::Utc;

    fn authenticated(id: i64) -> Identity {
        Identity::Authenticated(User {
            id,
            username: format!("user{}", id),
            email: format!("user{}@example.com", id),
            password_hash: PasswordHash::from_stored("$argon2id$stub"),
            bio: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn test_owner_is_allowed() {
        assert_eq!(authorize_mutation(&authenticated(1), 1), Decision::Allowed);
    }

    #[test]
    fn test_other_user_is_denied() {
        assert_eq!(authorize_mutation(&authenticated(1), 2), Decision::Denied);
        assert_eq!(authorize_mutation(&authenticated(2), 1), Decision::Denied);
    }

    #[test]
    fn test_anonymous_is_always_denied() {
        for owner_id in [0, 1, -1, i64::MAX] {
            assert_eq!(
                authorize_mutation(&Identity::Anonymous, owner_id),
                Decision::Denied
            );
        }
    }
}
