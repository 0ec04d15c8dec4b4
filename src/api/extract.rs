//! Request body extraction.

use crate::types::AppError;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::debug;
use validator::Validate;

/// JSON body that has been deserialized and validated.
///
/// Unparseable bodies and failed validation both become
/// [`AppError::InvalidInput`] with a generic message, so the client never
/// learns which field was wrong.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                debug!(error = %rejection.body_text(), "rejected request body");
                AppError::InvalidInput("invalid request body".to_string())
            })?;

        value.validate()?;

        Ok(ValidatedJson(value))
    }
}
