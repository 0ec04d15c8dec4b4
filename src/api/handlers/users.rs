//! Registration and profile handlers.

use crate::{
    api::extract::ValidatedJson,
    auth::{middleware::AuthUser, tokens::Scope, AuthError},
    types::{
        AppError, ChangePasswordRequest, NewUser, RegisterRequest, Result, UpdateProfileRequest,
        UserEnvelope,
    },
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};
use tracing::info;

const ACCOUNT_TAKEN: &str = "username or email already taken";

/// Fails when `username` or `email` belongs to a user other than `except_id`.
async fn ensure_available(
    state: &AppState,
    username: &str,
    email: &str,
    except_id: Option<i64>,
) -> Result<()> {
    let by_username = state.db.get_user_by_username(username).await?;
    let by_email = state.db.get_user_by_email(email).await?;

    let taken = [by_username, by_email]
        .into_iter()
        .flatten()
        .any(|existing| Some(existing.id) != except_id);

    if taken {
        return Err(AppError::InvalidInput(ACCOUNT_TAKEN.to_string()));
    }

    Ok(())
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/users",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "User registered successfully", body = UserEnvelope),
        (status = 400, description = "Invalid input or account already taken")
    ),
    tag = "users"
)]
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<Json<UserEnvelope>> {
    ensure_available(&state, &payload.username, &payload.email, None).await?;

    let password_hash = state.auth_service.hash_password(&payload.password)?;

    let user = state
        .db
        .create_user(&NewUser {
            username: payload.username,
            email: payload.email,
            password_hash,
            bio: payload.bio.unwrap_or_default(),
        })
        .await?;

    info!(user_id = user.id, "registered user");
    Ok(Json(UserEnvelope::from(&user)))
}

/// Current user's profile
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Profile of the authenticated user", body = UserEnvelope),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserEnvelope> {
    Json(UserEnvelope::from(&user))
}

/// Update the current user's profile
#[utoipa::path(
    put,
    path = "/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserEnvelope),
        (status = 400, description = "Invalid input or account already taken"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<UserEnvelope>> {
    let update = payload.merge_into(&user);
    ensure_available(&state, &update.username, &update.email, Some(user.id)).await?;

    let updated = state.db.update_user_profile(user.id, &update).await?;

    info!(user_id = user.id, "updated profile");
    Ok(Json(UserEnvelope::from(&updated)))
}

/// Change the current user's password and sign out every session
#[utoipa::path(
    put,
    path = "/users/me/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed, all authentication tokens revoked"),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated or current password wrong")
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<StatusCode> {
    if !state
        .auth_service
        .verify_password(&payload.current_password, &user.password_hash)?
    {
        return Err(AuthError::CredentialMismatch.into());
    }

    let new_hash = state.auth_service.hash_password(&payload.new_password)?;
    state.db.update_password_hash(user.id, &new_hash).await?;
    state
        .auth_service
        .revoke_all(user.id, Scope::Authentication)
        .await?;

    info!(user_id = user.id, "changed password");
    Ok(StatusCode::NO_CONTENT)
}
