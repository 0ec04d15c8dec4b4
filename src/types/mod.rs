//! Domain types, request and response bodies, and the HTTP error type.

use crate::auth::password::{PasswordHash, PlaintextPassword};
use crate::auth::tokens::Scope;
use crate::auth::AuthError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

/// Message returned for every rejected request body. Which field failed is
/// only logged.
pub const VALIDATION_FAILED: &str = "invalid request parameters";

// ============= User Types =============

/// A registered user as stored.
///
/// Not `Serialize`: responses go through [`UserResponse`], which has no
/// password hash field.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub bio: String,
}

/// Replacement profile values for an existing user.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub email: String,
    pub bio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub bio: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            bio: user.bio.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    pub user: UserResponse,
}

impl From<&User> for UserEnvelope {
    fn from(user: &User) -> Self {
        Self {
            user: UserResponse::from(user),
        }
    }
}

// ============= Workout Types =============

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkoutEntry {
    pub id: i64,
    pub exercise_name: String,
    pub sets: i64,
    pub reps: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub weight: Option<f64>,
    pub notes: String,
    pub order_index: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Workout {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub duration_minutes: i64,
    pub calories_burned: i64,
    pub entries: Vec<WorkoutEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WorkoutEnvelope {
    pub workout: Workout,
}

fn validate_entry_measure(entry: &WorkoutEntryInput) -> std::result::Result<(), ValidationError> {
    match (entry.reps, entry.duration_seconds) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        _ => Err(ValidationError::new("entry_measure")
            .with_message("exactly one of reps or duration_seconds is required".into())),
    }
}

/// One exercise line of a workout as submitted by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_entry_measure"))]
pub struct WorkoutEntryInput {
    #[validate(length(min = 1, max = 200))]
    pub exercise_name: String,
    #[validate(range(min = 1))]
    pub sets: i64,
    #[validate(range(min = 1))]
    pub reps: Option<i64>,
    #[validate(range(min = 1))]
    pub duration_seconds: Option<i64>,
    #[validate(range(min = 0.0))]
    pub weight: Option<f64>,
    #[serde(default)]
    pub notes: String,
    pub order_index: Option<i64>,
}

impl From<&WorkoutEntry> for WorkoutEntryInput {
    fn from(entry: &WorkoutEntry) -> Self {
        Self {
            exercise_name: entry.exercise_name.clone(),
            sets: entry.sets,
            reps: entry.reps,
            duration_seconds: entry.duration_seconds,
            weight: entry.weight,
            notes: entry.notes.clone(),
            order_index: Some(entry.order_index),
        }
    }
}

/// A complete workout body, used both to create a workout and as the merged
/// result of a partial update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct WorkoutInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub duration_minutes: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub calories_burned: i64,
    #[serde(default)]
    #[validate(nested)]
    pub entries: Vec<WorkoutEntryInput>,
}

impl From<&Workout> for WorkoutInput {
    fn from(workout: &Workout) -> Self {
        Self {
            title: workout.title.clone(),
            description: workout.description.clone(),
            duration_minutes: workout.duration_minutes,
            calories_burned: workout.calories_burned,
            entries: workout.entries.iter().map(WorkoutEntryInput::from).collect(),
        }
    }
}

/// Partial update of a workout. Absent fields keep their current value;
/// `entries`, when present, replaces the whole list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateWorkoutRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub duration_minutes: Option<i64>,
    #[validate(range(min = 0))]
    pub calories_burned: Option<i64>,
    #[validate(nested)]
    pub entries: Option<Vec<WorkoutEntryInput>>,
}

impl UpdateWorkoutRequest {
    /// Applies the present fields on top of `current`.
    pub fn merge_into(self, current: WorkoutInput) -> WorkoutInput {
        WorkoutInput {
            title: self.title.unwrap_or(current.title),
            description: self.description.unwrap_or(current.description),
            duration_minutes: self.duration_minutes.unwrap_or(current.duration_minutes),
            calories_burned: self.calories_burned.unwrap_or(current.calories_burned),
            entries: self.entries.unwrap_or(current.entries),
        }
    }
}

// ============= Authentication Types =============

fn password_required() -> ValidationError {
    ValidationError::new("password_empty").with_message("password is required".into())
}

fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

fn validate_register_password(request: &RegisterRequest) -> std::result::Result<(), ValidationError> {
    if request.password.is_empty() {
        return Err(password_required());
    }
    Ok(())
}

fn validate_login_password(request: &LoginRequest) -> std::result::Result<(), ValidationError> {
    if request.password.is_empty() {
        return Err(password_required());
    }
    Ok(())
}

fn validate_password_change(request: &ChangePasswordRequest) -> std::result::Result<(), ValidationError> {
    if request.current_password.is_empty() || request.new_password.is_empty() {
        return Err(password_required());
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_register_password"))]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub username: String,
    #[validate(email)]
    pub email: String,
    #[schema(value_type = String, format = Password)]
    pub password: PlaintextPassword,
    pub bio: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50), custom(function = "validate_not_blank"))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    pub fn merge_into(self, user: &User) -> ProfileUpdate {
        ProfileUpdate {
            username: self.username.unwrap_or_else(|| user.username.clone()),
            email: self.email.unwrap_or_else(|| user.email.clone()),
            bio: self.bio.unwrap_or_else(|| user.bio.clone()),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_password_change"))]
pub struct ChangePasswordRequest {
    #[schema(value_type = String, format = Password)]
    pub current_password: PlaintextPassword,
    #[schema(value_type = String, format = Password)]
    pub new_password: PlaintextPassword,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_login_password"))]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: String,
    #[schema(value_type = String, format = Password)]
    pub password: PlaintextPassword,
}

/// Returned once at login. `auth_token` is the only copy of the bearer secret.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub auth_token: String,
    pub expiry: DateTime<Utc>,
    pub scope: Scope,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(
                AuthError::HashingFailure(_) | AuthError::MalformedHash(_) | AuthError::InvalidTtl,
            ) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        tracing::debug!(fields = ?errors.field_errors().keys().collect::<Vec<_>>(), "request validation failed");
        AppError::InvalidInput(VALIDATION_FAILED.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            match self {
                AppError::Auth(e) => e.to_string(),
                AppError::NotFound(msg) | AppError::InvalidInput(msg) => msg,
                other => other.to_string(),
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
