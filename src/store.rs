use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::types::User;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://tokentui.db";

#[async_trait]
pub trait UserRepository: Send + Sync + std::fmt::Debug {
    /// Insert a user with this email unless one already exists. Never overwrites.
    async fn ensure_seeded(&self, email: &str) -> Result<()>;

    /// Exact email match. A miss is `Ok(None)`.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    timeout: Duration,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open the database at `uri` (falling back to [`DEFAULT_DATABASE_URL`] when
    /// empty) and make sure the users table exists. Every step is bounded by `timeout`.
    pub async fn connect(uri: &str, timeout: Duration) -> Result<Self> {
        let uri = if uri.trim().is_empty() {
            DEFAULT_DATABASE_URL
        } else {
            uri
        };
        debug!(uri, ?timeout, "opening store");

        let options = SqliteConnectOptions::from_str(uri)?.create_if_missing(true);
        // A single connection keeps in-memory databases alive and SQLite has one writer anyway.
        let pool = bounded(
            timeout,
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .acquire_timeout(timeout)
                .connect_with(options),
        )
        .await??;

        let store = Self { pool, timeout };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Liveness check against the open pool.
    pub async fn ping(&self) -> Result<()> {
        let _: i64 = bounded(
            self.timeout,
            sqlx::query_scalar::<_, i64>("SELECT 1").fetch_one(&self.pool),
        )
        .await??;
        Ok(())
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id    TEXT PRIMARY KEY NOT NULL,
                email TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[cfg(test)]
    async fn count_by_email(&self, email: &str) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[async_trait]
impl UserRepository for SqliteStore {
    async fn ensure_seeded(&self, email: &str) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO users (id, email) VALUES (?, ?) ON CONFLICT(email) DO NOTHING",
        )
        .bind(Uuid::new_v4().simple().to_string())
        .bind(email)
        .execute(&self.pool)
        .await?;
        debug!(email, inserted = result.rows_affected(), "seeded user");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Store(format!("failed searching user by email: {}", e)))?;

        row.map(|row| -> Result<User> {
            Ok(User {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
            })
        })
        .transpose()
    }
}

async fn bounded<F: std::future::Future>(timeout: Duration, fut: F) -> Result<F::Output> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| AppError::Timeout(timeout))
}
