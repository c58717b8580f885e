//! Store backend for libSQL / Turso databases reached over the network.

use async_trait::async_trait;
use libsql::{params_from_iter, Connection, Value};
use tracing::info;

use super::model::*;
use super::repo::*;
use super::schema;

pub struct RemoteRepository {
    conn: Connection,
}

impl RemoteRepository {
    pub async fn new(db_url: &str, auth_token: Option<String>) -> DbResult<Self> {
        if auth_token.is_none() {
            info!("No database auth token configured");
        }

        let db = libsql::Builder::new_remote(db_url.to_string(), auth_token.unwrap_or_default())
            .build()
            .await?;
        let conn = db.connect()?;

        info!("Using remote database at {}", db_url);

        Ok(Self { conn })
    }

    async fn query_rows(&self, sql: &str, args: Vec<Value>) -> DbResult<ResultRows> {
        let mut rows = self.conn.query(sql, params_from_iter(args)).await?;

        let columns: Vec<String> = (0..rows.column_count())
            .map(|i| rows.column_name(i).unwrap_or_default().to_string())
            .collect();

        let mut cells = Vec::new();
        while let Some(row) = rows.next().await? {
            let values = (0..columns.len() as i32)
                .map(|i| row.get_value(i))
                .collect::<Result<Vec<_>, _>>()?;
            cells.push(values);
        }

        Ok(ResultRows { columns, cells })
    }
}

/// Rows copied out of a libsql result, addressed by column name.
struct ResultRows {
    columns: Vec<String>,
    cells: Vec<Vec<Value>>,
}

impl ResultRows {
    fn map<T>(&self, f: impl Fn(&RowRef<'_>) -> DbResult<T>) -> DbResult<Vec<T>> {
        self.cells
            .iter()
            .map(|cells| {
                f(&RowRef {
                    columns: &self.columns,
                    cells,
                })
            })
            .collect()
    }
}

struct RowRef<'a> {
    columns: &'a [String],
    cells: &'a [Value],
}

impl RowRef<'_> {
    fn opt_text(&self, col: &str) -> DbResult<Option<String>> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == col)
            .ok_or_else(|| DbError::InvalidData(format!("Missing column: {}", col)))?;
        match self.cells.get(idx) {
            Some(Value::Text(s)) => Ok(Some(s.clone())),
            Some(Value::Integer(n)) => Ok(Some(n.to_string())),
            Some(Value::Real(f)) => Ok(Some(f.to_string())),
            Some(Value::Null) | None => Ok(None),
            Some(Value::Blob(_)) => Err(DbError::InvalidData(format!(
                "Unexpected blob in column {}",
                col
            ))),
        }
    }

    fn text(&self, col: &str) -> DbResult<String> {
        self.opt_text(col)?
            .ok_or_else(|| DbError::InvalidData(format!("Unexpected NULL in column {}", col)))
    }
}

fn user_from_row(row: &RowRef<'_>) -> DbResult<User> {
    Ok(User {
        id: row.text("id")?,
        email: row.text("email")?,
        name: row.text("name")?,
        created_at: row.opt_text("created_at")?.as_deref().and_then(parse_timestamp),
    })
}

fn user_show_from_row(row: &RowRef<'_>) -> DbResult<UserShow> {
    Ok(UserShow {
        id: row.text("id")?,
        user_id: row.text("user_id")?,
        show_id: row.text("show_id")?,
        list_type: row.text("type")?.parse()?,
        media_type: row
            .opt_text("media_type")?
            .unwrap_or_else(|| DEFAULT_MEDIA_TYPE.to_string()),
        added_at: row.opt_text("added_at")?.as_deref().and_then(parse_timestamp),
        progress: row.opt_text("progress")?,
    })
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn opt_text(s: Option<String>) -> Value {
    s.map(Value::Text).unwrap_or(Value::Null)
}

fn user_show_args(show: &UserShow) -> Vec<Value> {
    vec![
        text(&show.id),
        text(&show.user_id),
        text(&show.show_id),
        text(show.list_type.as_str()),
        text(&show.media_type),
        opt_text(show.added_at.as_ref().map(format_timestamp)),
        opt_text(show.progress.clone()),
    ]
}

fn triple_args(user_id: &str, show_id: &str, list_type: ListType) -> Vec<Value> {
    vec![text(user_id), text(show_id), text(list_type.as_str())]
}

fn is_unique_violation(e: &libsql::Error) -> bool {
    let msg = e.to_string();
    msg.contains("UNIQUE constraint failed") || msg.contains("SQLITE_CONSTRAINT_UNIQUE")
}

#[async_trait]
impl UserRepo for RemoteRepository {
    async fn create_user(&self, user: &User) -> DbResult<()> {
        let args = vec![
            text(&user.id),
            text(&user.email),
            text(&user.name),
            opt_text(user.created_at.as_ref().map(format_timestamp)),
        ];
        match self.conn.execute(schema::INSERT_USER, params_from_iter(args)).await {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(DbError::AlreadyExists(format!(
                "User with email {}",
                user.email
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_user_by_email(&self, email: &str) -> DbResult<User> {
        self.query_rows(schema::SELECT_USER_BY_EMAIL, vec![text(email)])
            .await?
            .map(user_from_row)?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound(format!("User not found: {}", email)))
    }
}

#[async_trait]
impl UserShowRepo for RemoteRepository {
    async fn add_user_show(&self, show: &UserShow) -> DbResult<()> {
        self.conn
            .execute(schema::INSERT_USER_SHOW, params_from_iter(user_show_args(show)))
            .await?;
        Ok(())
    }

    async fn replace_user_show(&self, show: &UserShow) -> DbResult<()> {
        let tx = self.conn.transaction().await?;
        tx.execute(
            schema::DELETE_USER_SHOW,
            params_from_iter(triple_args(&show.user_id, &show.show_id, show.list_type)),
        )
        .await?;
        tx.execute(schema::INSERT_USER_SHOW, params_from_iter(user_show_args(show)))
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn remove_user_show(
        &self,
        user_id: &str,
        show_id: &str,
        list_type: ListType,
    ) -> DbResult<u64> {
        let removed = self
            .conn
            .execute(
                schema::DELETE_USER_SHOW,
                params_from_iter(triple_args(user_id, show_id, list_type)),
            )
            .await?;
        Ok(removed)
    }

    async fn find_user_show(
        &self,
        user_id: &str,
        show_id: &str,
        list_type: ListType,
    ) -> DbResult<Option<UserShow>> {
        let rows = self
            .query_rows(
                &schema::select_user_show(),
                triple_args(user_id, show_id, list_type),
            )
            .await?;
        Ok(rows.map(user_show_from_row)?.into_iter().next())
    }

    async fn list_user_shows_by_type(
        &self,
        user_id: &str,
        list_type: ListType,
    ) -> DbResult<Vec<UserShow>> {
        self.query_rows(
            &schema::select_user_shows_by_type(),
            vec![text(user_id), text(list_type.as_str())],
        )
        .await?
        .map(user_show_from_row)
    }

    async fn list_user_shows(&self, user_id: &str) -> DbResult<Vec<UserShow>> {
        self.query_rows(&schema::select_user_shows(), vec![text(user_id)])
            .await?
            .map(user_show_from_row)
    }
}

#[async_trait]
impl Repository for RemoteRepository {
    async fn init_schema(&self) -> DbResult<()> {
        self.conn.execute(schema::CREATE_USERS, ()).await?;
        self.conn.execute(schema::CREATE_USER_SHOWS, ()).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "libsql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn show_rows(cells: Vec<Vec<Value>>) -> ResultRows {
        ResultRows {
            columns: [
                "id",
                "user_id",
                "show_id",
                "type",
                "media_type",
                "added_at",
                "progress",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            cells,
        }
    }

    #[test]
    fn test_decode_user_show_rows() {
        let rows = show_rows(vec![vec![
            text("r1"),
            text("u1"),
            Value::Integer(121361),
            text("favorites"),
            Value::Null,
            text("2024-01-02 03:04:05"),
            Value::Null,
        ]]);
        let shows = rows.map(user_show_from_row).unwrap();
        assert_eq!(shows.len(), 1);
        assert_eq!(shows[0].show_id, "121361");
        assert_eq!(shows[0].list_type, ListType::Favorites);
        assert_eq!(shows[0].media_type, "series");
        assert!(shows[0].added_at.is_some());
        assert_eq!(shows[0].progress, None);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let rows = show_rows(vec![vec![
            text("r1"),
            text("u1"),
            text("1"),
            text("queue"),
            Value::Null,
            Value::Null,
            Value::Null,
        ]]);
        assert!(matches!(
            rows.map(user_show_from_row),
            Err(DbError::InvalidData(_))
        ));
    }

    #[test]
    fn test_decode_user_missing_column() {
        let rows = ResultRows {
            columns: vec!["id".to_string(), "email".to_string()],
            cells: vec![vec![text("u1"), text("a@example.com")]],
        };
        assert!(matches!(
            rows.map(user_from_row),
            Err(DbError::InvalidData(_))
        ));
    }

    #[test]
    fn test_user_show_args() {
        let show = UserShow::new("u1", "9", ListType::Watching, Some("movie"), None);
        let args = user_show_args(&show);
        assert_eq!(args.len(), 7);
        assert!(matches!(&args[3], Value::Text(t) if t == "watching"));
        assert!(matches!(&args[4], Value::Text(t) if t == "movie"));
        assert!(matches!(args[6], Value::Null));
    }

    // Integration tests against a real libSQL server:
    // LIBSQL_TEST_URL=http://127.0.0.1:8080 cargo test -- --ignored

    async fn open() -> RemoteRepository {
        let url = std::env::var("LIBSQL_TEST_URL").expect("LIBSQL_TEST_URL required");
        let token = std::env::var("LIBSQL_TEST_TOKEN").ok();
        let repo = RemoteRepository::new(&url, token).await.expect("connect failed");
        repo.init_schema().await.expect("schema failed");
        repo
    }

    async fn new_user(repo: &RemoteRepository) -> User {
        let user = User::new(&format!("{}@example.com", crate::util::generate_id()), "Remote");
        repo.create_user(&user).await.expect("create user failed");
        user
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn remote_duplicate_email() {
        let repo = open().await;
        let user = new_user(&repo).await;
        let err = repo
            .create_user(&User::new(&user.email, "Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::AlreadyExists(_)));

        let found = repo.get_user_by_email(&user.email).await.unwrap();
        assert_eq!(found.id, user.id);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn remote_user_show_lifecycle() {
        let repo = open().await;
        let user = new_user(&repo).await;

        let mut older = UserShow::new(&user.id, "a", ListType::Watchlist, None, None);
        older.added_at = Some(Utc::now() - Duration::hours(1));
        repo.add_user_show(&older).await.unwrap();
        repo.add_user_show(&UserShow::new(&user.id, "b", ListType::Watchlist, None, None))
            .await
            .unwrap();
        repo.add_user_show(&UserShow::new(&user.id, "c", ListType::Favorites, None, None))
            .await
            .unwrap();

        let watchlist = repo
            .list_user_shows_by_type(&user.id, ListType::Watchlist)
            .await
            .unwrap();
        let ids: Vec<&str> = watchlist.iter().map(|s| s.show_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(repo.list_user_shows(&user.id).await.unwrap().len(), 3);

        let found = repo
            .find_user_show(&user.id, "c", ListType::Favorites)
            .await
            .unwrap();
        assert!(found.is_some());

        let mut replacement = UserShow::new(&user.id, "a", ListType::Watchlist, None, Some("S02E01"));
        replacement.id = older.id.clone();
        repo.replace_user_show(&replacement).await.unwrap();
        let a = repo
            .find_user_show(&user.id, "a", ListType::Watchlist)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(a.progress.as_deref(), Some("S02E01"));

        let removed = repo
            .remove_user_show(&user.id, "c", ListType::Favorites)
            .await
            .unwrap();
        assert_eq!(removed, 1);
        let removed = repo
            .remove_user_show(&user.id, "c", ListType::Favorites)
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }
}
