use std::str::FromStr;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::model::*;
use super::repo::*;
use super::schema;

type UserRow = (String, String, String, Option<String>);

type UserShowRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
);

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_url: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // Every connection to an in-memory database gets its own database,
        // so keep exactly one and never let it expire.
        let in_memory = db_url.contains(":memory:") || db_url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await?;

        info!("Opened SQLite database at {}", db_url);

        Ok(Self { pool })
    }
}

fn map_unique_violation(e: sqlx::Error, what: String) -> DbError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => DbError::AlreadyExists(what),
        _ => DbError::Sqlx(e),
    }
}

fn user_from_row(r: UserRow) -> User {
    User {
        id: r.0,
        email: r.1,
        name: r.2,
        created_at: r.3.as_deref().and_then(parse_timestamp),
    }
}

fn user_show_from_row(r: UserShowRow) -> DbResult<UserShow> {
    Ok(UserShow {
        id: r.0,
        user_id: r.1,
        show_id: r.2,
        list_type: r.3.parse()?,
        media_type: r.4.unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
        added_at: r.5.as_deref().and_then(parse_timestamp),
        progress: r.6,
    })
}

fn insert_user_show(show: &UserShow) -> Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(schema::INSERT_USER_SHOW)
        .bind(&show.id)
        .bind(&show.user_id)
        .bind(&show.show_id)
        .bind(show.list_type.as_str())
        .bind(&show.media_type)
        .bind(show.added_at.as_ref().map(format_timestamp))
        .bind(&show.progress)
}

#[async_trait]
impl UserRepo for SqliteRepository {
    async fn create_user(&self, user: &User) -> DbResult<()> {
        sqlx::query(schema::INSERT_USER)
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.name)
            .bind(user.created_at.as_ref().map(format_timestamp))
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, format!("User with email {}", user.email)))?;
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        sqlx::query_as::<_, UserRow>(schema::SELECT_USER_BY_EMAIL)
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map(user_from_row)
            .map_err(|e| match e {
                sqlx::Error::RowNotFound => DbError::NotFound(format!("User not found: {}", email)),
                _ => DbError::Sqlx(e),
            })
    }
}

#[async_trait]
impl UserShowRepo for SqliteRepository {
    async fn add_user_show(&self, show: &UserShow) -> DbResult<()> {
        insert_user_show(show).execute(&self.pool).await?;
        Ok(())
    }

    async fn replace_user_show(&self, show: &UserShow) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(schema::DELETE_USER_SHOW)
            .bind(&show.user_id)
            .bind(&show.show_id)
            .bind(show.list_type.as_str())
            .execute(&mut *tx)
            .await?;
        insert_user_show(show).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove_user_show(
        &self,
        user_id: &str,
        show_id: &str,
        list_type: ListType,
    ) -> DbResult<u64> {
        let result = sqlx::query(schema::DELETE_USER_SHOW)
            .bind(user_id)
            .bind(show_id)
            .bind(list_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn find_user_show(
        &self,
        user_id: &str,
        show_id: &str,
        list_type: ListType,
    ) -> DbResult<Option<UserShow>> {
        let row = sqlx::query_as::<_, UserShowRow>(&schema::select_user_show())
            .bind(user_id)
            .bind(show_id)
            .bind(list_type.as_str())
            .fetch_optional(&self.pool)
            .await?;
        row.map(user_show_from_row).transpose()
    }

    async fn list_user_shows_by_type(
        &self,
        user_id: &str,
        list_type: ListType,
    ) -> DbResult<Vec<UserShow>> {
        let rows = sqlx::query_as::<_, UserShowRow>(&schema::select_user_shows_by_type())
            .bind(user_id)
            .bind(list_type.as_str())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(user_show_from_row).collect()
    }

    async fn list_user_shows(&self, user_id: &str) -> DbResult<Vec<UserShow>> {
        let rows = sqlx::query_as::<_, UserShowRow>(&schema::select_user_shows())
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(user_show_from_row).collect()
    }
}

#[async_trait]
impl Repository for SqliteRepository {
    async fn init_schema(&self) -> DbResult<()> {
        sqlx::query(schema::CREATE_USERS).execute(&self.pool).await?;
        sqlx::query(schema::CREATE_USER_SHOWS).execute(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open() -> SqliteRepository {
        let repo = SqliteRepository::new("sqlite::memory:").await.unwrap();
        repo.init_schema().await.unwrap();
        repo
    }

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let repo = open().await;
        repo.init_schema().await.unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_email() {
        let repo = open().await;
        repo.create_user(&User::new("a@example.com", "A")).await.unwrap();
        let err = repo
            .create_user(&User::new("a@example.com", "Other"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_get_user_by_email() {
        let repo = open().await;
        let user = User::new("b@example.com", "B");
        repo.create_user(&user).await.unwrap();

        let found = repo.get_user_by_email("b@example.com").await.unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.name, "B");
        assert!(found.created_at.is_some());

        let err = repo.get_user_by_email("nobody@example.com").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_keeps_single_row() {
        let repo = open().await;
        let user = User::new("c@example.com", "C");
        repo.create_user(&user).await.unwrap();

        let mut show = UserShow::new(&user.id, "81189", ListType::Watching, None, Some("S01E01"));
        repo.replace_user_show(&show).await.unwrap();
        show.progress = Some("S01E02".to_string());
        repo.replace_user_show(&show).await.unwrap();

        let shows = repo.list_user_shows(&user.id).await.unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].progress.as_deref(), Some("S01E02"));
    }

    #[tokio::test]
    async fn test_replace_collapses_duplicates() {
        let repo = open().await;
        let user = User::new("dup@example.com", "Dup");
        repo.create_user(&user).await.unwrap();

        for _ in 0..2 {
            repo.add_user_show(&UserShow::new(&user.id, "42", ListType::Watchlist, None, None))
                .await
                .unwrap();
        }
        repo.add_user_show(&UserShow::new(&user.id, "42", ListType::Watched, None, None))
            .await
            .unwrap();

        let show = UserShow::new(&user.id, "42", ListType::Watchlist, Some("movie"), None);
        repo.replace_user_show(&show).await.unwrap();

        let watchlist = repo
            .list_user_shows_by_type(&user.id, ListType::Watchlist)
            .await
            .unwrap();
        assert_eq!(watchlist.len(), 1);
        assert_eq!(watchlist[0].id, show.id);
        assert_eq!(watchlist[0].media_type, "movie");
        assert_eq!(repo.list_user_shows(&user.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_order_mixes_default_and_app_timestamps() {
        let repo = open().await;
        let user = User::new("mix@example.com", "Mix");
        repo.create_user(&user).await.unwrap();

        let mut older = UserShow::new(&user.id, "older", ListType::Watchlist, None, None);
        older.added_at = Some(chrono::Utc::now() - chrono::Duration::hours(1));
        repo.add_user_show(&older).await.unwrap();

        // Stamped by the column default in CURRENT_TIMESTAMP format.
        sqlx::query("INSERT INTO user_shows (id, user_id, show_id, type) VALUES ('n', ?, 'newer', 'watchlist')")
            .bind(&user.id)
            .execute(&repo.pool)
            .await
            .unwrap();

        let shows = repo
            .list_user_shows_by_type(&user.id, ListType::Watchlist)
            .await
            .unwrap();
        let ids: Vec<&str> = shows.iter().map(|s| s.show_id.as_str()).collect();
        assert_eq!(ids, vec!["newer", "older"]);
    }

    #[tokio::test]
    async fn test_unknown_user_violates_foreign_key() {
        let repo = open().await;
        let err = repo
            .add_user_show(&UserShow::new("ghost", "1", ListType::Watched, None, None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlx(_)));
    }

    #[tokio::test]
    async fn test_column_defaults() {
        let repo = open().await;
        let user = User::new("d@example.com", "D");
        repo.create_user(&user).await.unwrap();

        sqlx::query("INSERT INTO user_shows (id, user_id, show_id, type) VALUES ('x', ?, '1', 'watched')")
            .bind(&user.id)
            .execute(&repo.pool)
            .await
            .unwrap();

        let show = repo
            .find_user_show(&user.id, "1", ListType::Watched)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(show.media_type, "series");
        assert!(show.added_at.is_some());
    }

    #[tokio::test]
    async fn test_type_check_constraint() {
        let repo = open().await;
        let user = User::new("e@example.com", "E");
        repo.create_user(&user).await.unwrap();

        let res = sqlx::query("INSERT INTO user_shows (id, user_id, show_id, type) VALUES ('y', ?, '1', 'queue')")
            .bind(&user.id)
            .execute(&repo.pool)
            .await;
        assert!(res.is_err());
    }
}
