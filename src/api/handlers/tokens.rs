use crate::{
    api::extract::ValidatedJson,
    auth::{
        middleware::AuthUser,
        tokens::{auth_token_ttl, Scope},
    },
    types::{LoginRequest, Result, TokenResponse},
    AppState,
};
use axum::{extract::State, http::StatusCode, Json};

/// Log in and receive an authentication token
///
/// The token is valid for 24 hours. Its secret appears only in this response.
#[utoipa::path(
    post,
    path = "/tokens/authentication",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "tokens"
)]
pub async fn create_authentication_token(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<(StatusCode, Json<TokenResponse>)> {
    let user = state
        .auth_service
        .check_credentials(&payload.username, &payload.password)
        .await?;

    let token = state
        .auth_service
        .create_token(user.id, auth_token_ttl(), Scope::Authentication)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            expiry: token.expiry,
            scope: token.scope,
            auth_token: token.secret.into_inner(),
        }),
    ))
}

/// Log out everywhere by revoking all of the caller's authentication tokens
#[utoipa::path(
    delete,
    path = "/tokens/authentication",
    responses(
        (status = 204, description = "All authentication tokens revoked"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "tokens"
)]
pub async fn revoke_authentication_tokens(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode> {
    state
        .auth_service
        .revoke_all(user.id, Scope::Authentication)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
