use serde::{Deserialize, Serialize};

use super::error::ApiError;
use crate::db::ListType;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserShowRequest {
    pub user_id: Option<String>,
    pub show_id: Option<String>,
    #[serde(rename = "type")]
    pub list_type: Option<String>,
    pub media_type: Option<String>,
    pub progress: Option<String>,
}

/// Body of the older `/api/user-content` endpoints.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContentRequest {
    pub user_id: Option<String>,
    pub content_id: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipResponse {
    pub is_in_list: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct GroupedLists {
    pub watchlist: Vec<String>,
    pub watched: Vec<String>,
    pub favorites: Vec<String>,
    pub watching: Vec<String>,
}

impl GroupedLists {
    pub fn push(&mut self, list_type: ListType, show_id: String) {
        match list_type {
            ListType::Watchlist => self.watchlist.push(show_id),
            ListType::Watched => self.watched.push(show_id),
            ListType::Favorites => self.favorites.push(show_id),
            ListType::Watching => self.watching.push(show_id),
        }
    }
}

/// Collects required string fields. Absent and blank values both count
/// as missing; all missing names are reported together.
#[derive(Default)]
pub struct Required {
    missing: Vec<&'static str>,
}

impl Required {
    pub fn take(&mut self, name: &'static str, value: Option<String>) -> String {
        match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            Some(v) => v,
            None => {
                self.missing.push(name);
                String::new()
            }
        }
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!(
                "Missing required fields: {}",
                self.missing.join(", ")
            )))
        }
    }
}

pub fn parse_list_type(value: &str) -> Result<ListType, ApiError> {
    value.parse().map_err(|_| {
        ApiError::BadRequest(format!(
            "Invalid type '{}', expected one of: watchlist, watched, favorites, watching",
            value
        ))
    })
}
