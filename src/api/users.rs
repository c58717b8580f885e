use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::error::ApiError;
use super::types::*;
use crate::db::{User, UserRepo};
use crate::server::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let Json(req) = payload?;

    let mut required = Required::default();
    let email = required.take("email", req.email);
    let name = required.take("name", req.name);
    required.finish()?;

    let user = User::new(&email, &name);
    state.db.create_user(&user).await?;

    info!(user_id = %user.id, "Registered user {}", user.email);

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<User>, ApiError> {
    // Registration stores the trimmed address.
    let user = state.db.get_user_by_email(email.trim()).await?;
    Ok(Json(user))
}
