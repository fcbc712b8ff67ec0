use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::{
    state::AppState,
    users::{
        dto::{CreateUserRequest, UpdateUserRequest, UserResponse},
        error::ApiError,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(create_user).get(list_users))
        .route(
            "/user/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    let id = raw
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest("Invalid ID format".into()))?;
    if id <= 0 {
        return Err(ApiError::BadRequest("ID must be a positive integer".into()));
    }
    Ok(id)
}

/// Decodes a JSON body whatever `Content-Type` the client sent.
fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        warn!(error = %e, "request body rejected");
        ApiError::BadRequest("Invalid request body".into())
    })
}

#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let mut payload: CreateUserRequest = decode_body(&body)?;
    payload.normalize();
    debug!(?payload, "create request decoded");

    state.validator.validate_create(&payload)?;

    let user = state
        .users
        .create_user(payload.into_new_user(OffsetDateTime::now_utc()))
        .await?;

    info!(user_id = user.id, username = %user.username, "user created");
    Ok((
        StatusCode::CREATED,
        Json(UserResponse::one("User created", user)),
    ))
}

#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> Result<Json<UserResponse>, ApiError> {
    let users = state.users.get_all_users().await?;
    info!(count = users.len(), "users listed");
    Ok(Json(UserResponse::many("Users fetched", users)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let user = state.users.get_user_by_id(id).await?;
    Ok(Json(UserResponse::one("User fetched", user)))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    let mut payload: UpdateUserRequest = decode_body(&body)?;
    payload.normalize();
    debug!(?payload, "update request decoded");

    state.validator.validate_update(&payload)?;

    let user = state
        .users
        .update_user_by_id(id, payload.into_changes())
        .await?;

    info!(user_id = id, "user updated");
    Ok(Json(UserResponse::one("User updated", user)))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&raw_id)?;
    state.users.delete_by_id(id).await?;

    info!(user_id = id, "user deleted");
    Ok(Json(UserResponse::empty("User deleted")))
}
