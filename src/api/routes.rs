use crate::api::handlers::{health, tokens, users, workouts};
use crate::api::openapi::ApiDoc;
use crate::auth::middleware::authenticate;
use crate::AppState;
use axum::{
    middleware,
    routing::{get, post, put},
    Json, Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Builds the application router.
///
/// Every route sits behind the authentication gate; which identities a route
/// accepts is decided by the extractors its handler takes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/users", post(users::register))
        .route("/users/me", get(users::get_me).put(users::update_me))
        .route("/users/me/password", put(users::change_password))
        .route(
            "/tokens/authentication",
            post(tokens::create_authentication_token)
                .delete(tokens::revoke_authentication_tokens),
        )
        .route("/workouts", post(workouts::create_workout))
        .route(
            "/workouts/{id}",
            get(workouts::get_workout)
                .put(workouts::update_workout)
                .delete(workouts::delete_workout),
        )
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            authenticate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
