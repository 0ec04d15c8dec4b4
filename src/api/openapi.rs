//! OpenAPI document for the REST API.
//!
//! Served as JSON at `/api-docs/openapi.json`. When adding an endpoint, annotate
//! the handler with `#[utoipa::path(...)]` and list it under `paths(...)` here.

use crate::auth::tokens::Scope;
use crate::types::{
    ChangePasswordRequest, LoginRequest, RegisterRequest, TokenResponse, UpdateProfileRequest,
    UpdateWorkoutRequest, UserEnvelope, UserResponse, Workout, WorkoutEntry, WorkoutEntryInput,
    WorkoutEnvelope, WorkoutInput,
};
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the opaque bearer token scheme referenced by `security(("bearer" = []))`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Liftlog API",
        description = "Workout tracking with opaque bearer-token authentication. \
                       Send `Authorization: Bearer <auth_token>` on authenticated requests."
    ),
    tags(
        (name = "health", description = "Liveness"),
        (name = "users", description = "Registration and profiles"),
        (name = "tokens", description = "Login and logout"),
        (name = "workouts", description = "Workouts, owner-only mutations")
    ),
    components(
        schemas(
            RegisterRequest,
            UpdateProfileRequest,
            ChangePasswordRequest,
            LoginRequest,
            TokenResponse,
            Scope,
            UserResponse,
            UserEnvelope,
            Workout,
            WorkoutEntry,
            WorkoutInput,
            WorkoutEntryInput,
            UpdateWorkoutRequest,
            WorkoutEnvelope,
        )
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::users::register,
        crate::api::handlers::users::get_me,
        crate::api::handlers::users::update_me,
        crate::api::handlers::users::change_password,
        crate::api::handlers::tokens::create_authentication_token,
        crate::api::handlers::tokens::revoke_authentication_tokens,
        crate::api::handlers::workouts::get_workout,
        crate::api::handlers::workouts::create_workout,
        crate::api::handlers::workouts::update_workout,
        crate::api::handlers::workouts::delete_workout,
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_spec_lists_every_route() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(json.contains("Liftlog API"));
        for path in [
            "/health",
            "/users",
            "/users/me",
            "/users/me/password",
            "/tokens/authentication",
            "/workouts",
            "/workouts/{id}",
        ] {
            assert!(json.contains(&format!("\"{}\"", path)), "missing path {}", path);
        }
    }

    #[test]
    fn test_openapi_has_bearer_scheme_and_no_hash_field() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();

        assert!(json.contains("\"bearer\""));
        assert!(!json.contains("password_hash"));
    }
}
