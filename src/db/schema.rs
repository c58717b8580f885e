//! SQL shared by both store backends. Placeholders are positional `?`,
//! which sqlx's SQLite driver and the libsql client both accept.

pub const CREATE_USERS: &str = "CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    name TEXT NOT NULL,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP
)";

pub const CREATE_USER_SHOWS: &str = "CREATE TABLE IF NOT EXISTS user_shows (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    show_id TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('watchlist', 'watched', 'favorites', 'watching')),
    media_type TEXT DEFAULT 'series',
    added_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    progress TEXT,
    FOREIGN KEY (user_id) REFERENCES users(id)
)";

pub const INSERT_USER: &str =
    "INSERT INTO users (id, email, name, created_at) VALUES (?, ?, ?, ?)";

pub const SELECT_USER_BY_EMAIL: &str =
    "SELECT id, email, name, created_at FROM users WHERE email = ?";

pub const INSERT_USER_SHOW: &str = "INSERT INTO user_shows
    (id, user_id, show_id, type, media_type, added_at, progress)
    VALUES (?, ?, ?, ?, ?, ?, ?)";

pub const DELETE_USER_SHOW: &str =
    "DELETE FROM user_shows WHERE user_id = ? AND show_id = ? AND type = ?";

const USER_SHOW_COLUMNS: &str =
    "SELECT id, user_id, show_id, type, media_type, added_at, progress FROM user_shows";

// rowid breaks ties between rows added within the same microsecond.
pub fn select_user_show() -> String {
    format!(
        "{} WHERE user_id = ? AND show_id = ? AND type = ? ORDER BY added_at DESC, rowid DESC LIMIT 1",
        USER_SHOW_COLUMNS
    )
}

pub fn select_user_shows_by_type() -> String {
    format!(
        "{} WHERE user_id = ? AND type = ? ORDER BY added_at DESC, rowid DESC",
        USER_SHOW_COLUMNS
    )
}

pub fn select_user_shows() -> String {
    format!(
        "{} WHERE user_id = ? ORDER BY added_at DESC, rowid DESC",
        USER_SHOW_COLUMNS
    )
}
