use std::path::Path;

use {
    anyhow::Result,
    async_trait::async_trait,
    sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions},
    tracing::warn,
};

use crate::{Session, session::now_ms, store::SessionBackend};

/// One row per session, state stored as a JSON document.
pub struct SqliteSessionBackend {
    pool: SqlitePool,
}

impl SqliteSessionBackend {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if needed) a database file and make sure the table exists.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::init(&pool).await?;
        Ok(Self::new(pool))
    }

    /// Create the `decoy_sessions` table if it doesn't exist.
    pub async fn init(pool: &SqlitePool) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS decoy_sessions (
                id         TEXT PRIMARY KEY,
                data       TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )"#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionBackend for SqliteSessionBackend {
    async fn load_all(&self) -> Result<Vec<Session>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT id, data FROM decoy_sessions ORDER BY updated_at ASC")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(id, data)| match serde_json::from_str(&data) {
                Ok(session) => Some(session),
                Err(e) => {
                    warn!(session_id = %id, error = %e, "skipping unreadable session row");
                    None
                },
            })
            .collect())
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let data = serde_json::to_string(session)?;
        sqlx::query(
            r#"INSERT INTO decoy_sessions (id, data, updated_at)
               VALUES (?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                 data = excluded.data,
                 updated_at = excluded.updated_at"#,
        )
        .bind(&session.id)
        .bind(data)
        .bind(now_ms() as i64)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM decoy_sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
