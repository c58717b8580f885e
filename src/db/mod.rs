pub mod model;
pub mod remote;
pub mod repo;
pub mod schema;
pub mod sqlite;

use std::sync::Arc;

pub use model::*;
pub use remote::RemoteRepository;
pub use repo::*;
pub use sqlite::SqliteRepository;

/// Pick a backend from the URL scheme: `libsql://` and `http(s)://` go to
/// the libSQL remote client, everything else is handed to sqlx as a SQLite
/// connection string.
pub async fn open_repository(
    url: &str,
    auth_token: Option<String>,
) -> DbResult<Arc<dyn Repository>> {
    if url.starts_with("libsql://") || url.starts_with("https://") || url.starts_with("http://") {
        Ok(Arc::new(RemoteRepository::new(url, auth_token).await?))
    } else {
        Ok(Arc::new(SqliteRepository::new(url).await?))
    }
}
