//! The older `/api/user-content` surface, kept for clients that still use
//! it. It reads and writes the same `user_shows` table but only deals in
//! content ids.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::error::ApiError;
use super::types::*;
use crate::db::{ListType, UserShow, UserShowRepo};
use crate::server::AppState;

fn validate(req: UserContentRequest) -> Result<(String, String, ListType), ApiError> {
    let mut required = Required::default();
    let user_id = required.take("userId", req.user_id);
    let content_id = required.take("contentId", req.content_id);
    let status = required.take("status", req.status);
    required.finish()?;

    Ok((user_id, content_id, parse_list_type(&status)?))
}

/// Duplicates are ignored rather than rejected.
pub async fn add_user_content(
    State(state): State<AppState>,
    payload: Result<Json<UserContentRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let (user_id, content_id, status) = validate(req)?;

    if state
        .db
        .find_user_show(&user_id, &content_id, status)
        .await?
        .is_none()
    {
        let show = UserShow::new(&user_id, &content_id, status, None, None);
        state.db.add_user_show(&show).await?;
    }

    Ok(Json(MessageResponse::new("Content added")))
}

pub async fn remove_user_content(
    State(state): State<AppState>,
    payload: Result<Json<UserContentRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let (user_id, content_id, status) = validate(req)?;

    state
        .db
        .remove_user_show(&user_id, &content_id, status)
        .await?;

    Ok(Json(MessageResponse::new("Content removed")))
}

pub async fn list_content_ids(
    State(state): State<AppState>,
    Path((user_id, status)): Path<(String, String)>,
) -> Result<Json<Vec<String>>, ApiError> {
    let status = parse_list_type(&status)?;
    let shows = state.db.list_user_shows_by_type(&user_id, status).await?;
    Ok(Json(shows.into_iter().map(|s| s.show_id).collect()))
}

pub async fn list_grouped_content(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<GroupedLists>, ApiError> {
    let shows = state.db.list_user_shows(&user_id).await?;

    let mut lists = GroupedLists::default();
    for show in shows {
        lists.push(show.list_type, show.show_id);
    }

    Ok(Json(lists))
}
