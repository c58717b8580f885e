use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use tracing::{debug, info};

use super::error::ApiError;
use super::types::*;
use crate::db::{ListType, UserShow, UserShowRepo};
use crate::server::AppState;

struct ValidShow {
    user_id: String,
    show_id: String,
    list_type: ListType,
    media_type: Option<String>,
    progress: Option<String>,
}

fn validate(req: UserShowRequest) -> Result<ValidShow, ApiError> {
    let mut required = Required::default();
    let user_id = required.take("userId", req.user_id);
    let show_id = required.take("showId", req.show_id);
    let list_type = required.take("type", req.list_type);
    required.finish()?;

    Ok(ValidShow {
        user_id,
        show_id,
        list_type: parse_list_type(&list_type)?,
        media_type: req
            .media_type
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty()),
        progress: req.progress,
    })
}

impl ValidShow {
    fn into_user_show(self) -> UserShow {
        UserShow::new(
            &self.user_id,
            &self.show_id,
            self.list_type,
            self.media_type.as_deref(),
            self.progress.as_deref(),
        )
    }
}

/// Add a title to a list, refusing to add it twice.
pub async fn add_user_show(
    State(state): State<AppState>,
    payload: Result<Json<UserShowRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let valid = validate(req)?;

    if state
        .db
        .find_user_show(&valid.user_id, &valid.show_id, valid.list_type)
        .await?
        .is_some()
    {
        return Err(ApiError::Conflict(format!(
            "Show {} is already in {}",
            valid.show_id, valid.list_type
        )));
    }

    let show = valid.into_user_show();
    state.db.add_user_show(&show).await?;

    info!(user_id = %show.user_id, show_id = %show.show_id, list = %show.list_type, "Added show");

    Ok(Json(MessageResponse::new("Show added to list")))
}

/// Add a title to a list, replacing every existing entry for the same
/// user, title and list. The newest entry's id is kept.
pub async fn put_user_show(
    State(state): State<AppState>,
    payload: Result<Json<UserShowRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let valid = validate(req)?;

    let existing = state
        .db
        .find_user_show(&valid.user_id, &valid.show_id, valid.list_type)
        .await?;

    let mut show = valid.into_user_show();
    if let Some(existing) = existing {
        show.id = existing.id;
    }
    state.db.replace_user_show(&show).await?;

    info!(user_id = %show.user_id, show_id = %show.show_id, list = %show.list_type, "Saved show");

    Ok(Json(MessageResponse::new("Show saved to list")))
}

pub async fn remove_user_show(
    State(state): State<AppState>,
    payload: Result<Json<UserShowRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let valid = validate(req)?;

    let removed = state
        .db
        .remove_user_show(&valid.user_id, &valid.show_id, valid.list_type)
        .await?;

    debug!(user_id = %valid.user_id, show_id = %valid.show_id, removed, "Removed show");

    Ok(Json(MessageResponse::new("Show removed from list")))
}

pub async fn list_user_shows_by_type(
    State(state): State<AppState>,
    Path((user_id, list_type)): Path<(String, String)>,
) -> Result<Json<Vec<UserShow>>, ApiError> {
    let list_type = parse_list_type(&list_type)?;
    let shows = state.db.list_user_shows_by_type(&user_id, list_type).await?;
    Ok(Json(shows))
}

pub async fn list_user_shows(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<UserShow>>, ApiError> {
    let shows = state.db.list_user_shows(&user_id).await?;
    Ok(Json(shows))
}

pub async fn check_user_show(
    State(state): State<AppState>,
    Path((user_id, show_id, list_type)): Path<(String, String, String)>,
) -> Result<Json<MembershipResponse>, ApiError> {
    let list_type = parse_list_type(&list_type)?;
    let found = state
        .db
        .find_user_show(&user_id, &show_id, list_type)
        .await?;
    Ok(Json(MembershipResponse {
        is_in_list: found.is_some(),
    }))
}
