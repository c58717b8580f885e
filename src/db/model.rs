use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::util::generate_id;

pub const DEFAULT_MEDIA_TYPE: &str = "series";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(email: &str, name: &str) -> Self {
        Self {
            id: generate_id(),
            email: email.to_string(),
            name: name.to_string(),
            created_at: Some(Utc::now()),
        }
    }
}

/// One title on one of a user's lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserShow {
    pub id: String,
    pub user_id: String,
    pub show_id: String,
    #[serde(rename = "type")]
    pub list_type: ListType,
    pub media_type: String,
    pub added_at: Option<DateTime<Utc>>,
    pub progress: Option<String>,
}

impl UserShow {
    pub fn new(
        user_id: &str,
        show_id: &str,
        list_type: ListType,
        media_type: Option<&str>,
        progress: Option<&str>,
    ) -> Self {
        Self {
            id: generate_id(),
            user_id: user_id.to_string(),
            show_id: show_id.to_string(),
            list_type,
            media_type: media_type.unwrap_or(DEFAULT_MEDIA_TYPE).to_string(),
            added_at: Some(Utc::now()),
            progress: progress.map(|p| p.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Watchlist,
    Watched,
    Favorites,
    Watching,
}

impl ListType {
    pub const ALL: [ListType; 4] = [
        ListType::Watchlist,
        ListType::Watched,
        ListType::Favorites,
        ListType::Watching,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Watchlist => "watchlist",
            ListType::Watched => "watched",
            ListType::Favorites => "favorites",
            ListType::Watching => "watching",
        }
    }
}

impl fmt::Display for ListType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ListType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "watchlist" => Ok(ListType::Watchlist),
            "watched" => Ok(ListType::Watched),
            "favorites" => Ok(ListType::Favorites),
            "watching" => Ok(ListType::Watching),
            other => Err(DbError::InvalidData(format!("Invalid list type: {}", other))),
        }
    }
}

/// Timestamps are written in SQLite's `CURRENT_TIMESTAMP` layout plus a
/// fixed microsecond fraction, so rows stamped by us and rows stamped by the
/// column default sort chronologically as text.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Accepts our own format, SQLite's `CURRENT_TIMESTAMP` format and RFC 3339.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Remote database error: {0}")]
    Libsql(#[from] libsql::Error),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type DbResult<T> = Result<T, DbError>;
