//! Workout handlers.
//!
//! Reads are public. Creation binds the workout to the caller. Updates and
//! deletes go through [`ensure_workout_owner`] before touching the store.

use crate::{
    api::extract::ValidatedJson,
    auth::{
        middleware::{AuthUser, CurrentIdentity},
        ownership::ensure_workout_owner,
    },
    types::{AppError, Result, UpdateWorkoutRequest, WorkoutEnvelope, WorkoutInput},
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;
use validator::Validate;

fn parse_workout_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| AppError::InvalidInput("invalid workout id".to_string()))
}

/// Get a workout by id
#[utoipa::path(
    get,
    path = "/workouts/{id}",
    params(("id" = i64, Path, description = "Workout id")),
    responses(
        (status = 200, description = "Workout found", body = WorkoutEnvelope),
        (status = 400, description = "Invalid workout id"),
        (status = 404, description = "Workout not found")
    ),
    tag = "workouts"
)]
pub async fn get_workout(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<WorkoutEnvelope>> {
    let id = parse_workout_id(&id)?;

    let workout = state
        .db
        .get_workout_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("workout not found".to_string()))?;

    Ok(Json(WorkoutEnvelope { workout }))
}

/// Create a workout owned by the caller
#[utoipa::path(
    post,
    path = "/workouts",
    request_body = WorkoutInput,
    responses(
        (status = 201, description = "Workout created", body = WorkoutEnvelope),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated")
    ),
    security(("bearer" = [])),
    tag = "workouts"
)]
pub async fn create_workout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidatedJson(payload): ValidatedJson<WorkoutInput>,
) -> Result<(StatusCode, Json<WorkoutEnvelope>)> {
    let workout = state.db.create_workout(user.id, &payload).await?;

    info!(workout_id = workout.id, user_id = user.id, "created workout");
    Ok((StatusCode::CREATED, Json(WorkoutEnvelope { workout })))
}

/// Update a workout the caller owns
///
/// Absent fields are left unchanged. A present `entries` list replaces the
/// existing entries.
#[utoipa::path(
    put,
    path = "/workouts/{id}",
    params(("id" = i64, Path, description = "Workout id")),
    request_body = UpdateWorkoutRequest,
    responses(
        (status = 200, description = "Workout updated", body = WorkoutEnvelope),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Workout not found or not owned by the caller")
    ),
    security(("bearer" = [])),
    tag = "workouts"
)]
pub async fn update_workout(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<UpdateWorkoutRequest>,
) -> Result<Json<WorkoutEnvelope>> {
    let id = parse_workout_id(&id)?;
    ensure_workout_owner(state.db.as_ref(), &identity, id).await?;

    let existing = state
        .db
        .get_workout_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("workout not found".to_string()))?;

    let merged = payload.merge_into(WorkoutInput::from(&existing));
    merged.validate()?;

    let workout = state.db.update_workout(id, &merged).await?;

    info!(workout_id = id, user_id = workout.user_id, "updated workout");
    Ok(Json(WorkoutEnvelope { workout }))
}

/// Delete a workout the caller owns
#[utoipa::path(
    delete,
    path = "/workouts/{id}",
    params(("id" = i64, Path, description = "Workout id")),
    responses(
        (status = 204, description = "Workout deleted"),
        (status = 400, description = "Invalid workout id"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Workout not found or not owned by the caller")
    ),
    security(("bearer" = [])),
    tag = "workouts"
)]
pub async fn delete_workout(
    State(state): State<AppState>,
    CurrentIdentity(identity): CurrentIdentity,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_workout_id(&id)?;
    ensure_workout_owner(state.db.as_ref(), &identity, id).await?;

    state.db.delete_workout(id).await?;

    info!(workout_id = id, "deleted workout");
    Ok(StatusCode::NO_CONTENT)
}
