//! The principal a request runs as.

use super::AuthError;
use crate::types::User;

/// Who is making the request.
///
/// Handlers receive this explicitly and decide per operation whether
/// `Anonymous` is acceptable. Anonymous is a real variant rather than an
/// absent value, so every check has to name it.
#[derive(Debug, Clone, Default)]
pub enum Identity {
    #[default]
    Anonymous,
    Authenticated(User),
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::Authenticated(user) => Some(user),
            Identity::Anonymous => None,
        }
    }

    /// Returns the authenticated user or [`AuthError::AuthenticationRequired`].
    pub fn require_user(&self) -> Result<&User, AuthError> {
        self.user().ok_or(AuthError::AuthenticationRequired)
    }
}

impl From<User> for Identity {
    fn from(user: User) -> Self {
        Identity::Authenticated(user)
    }
}
