//! Postgres-backed user store.
//!
//! One table, `users`, holding a profile row per known user: a text primary
//! key, a display name, and a free-form JSONB preferences blob. The store
//! owns a connection pool and exposes the two operations the server needs:
//! schema bootstrap and profile lookup.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use thiserror::Error;
use tracing::instrument;

/// Profile row for a single user.
///
/// `preferences` is whatever JSON the row carries; a SQL `NULL` is
/// normalized to an empty object so downstream consumers never see null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub preferences: Value,
}

impl UserProfile {
    /// Render the profile as a JSON value, as embedded in prompts and
    /// forwarded to agents through run state.
    pub fn to_value(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "preferences": self.preferences,
        })
    }
}

/// Errors from the user store.
#[derive(Error, Debug, Diagnostic)]
pub enum StoreError {
    /// The database rejected an operation or the connection failed.
    #[error("database error: {message}")]
    #[diagnostic(
        code(agentloom::store::backend),
        help("Check DATABASE_URL and that Postgres is reachable.")
    )]
    Backend { message: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend {
            message: err.to_string(),
        }
    }
}

/// Connection pool plus the queries the server runs against it.
#[derive(Debug, Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    /// Connect to Postgres at `database_url` with a small pool.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool, for tests that manage their own connections.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the `users` table if missing and seed the development row.
    ///
    /// Idempotent: the seed insert does nothing when the row already
    /// exists, so this is safe to run on every boot.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT,
                preferences JSONB
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "INSERT INTO users (id, name, preferences)
             VALUES ($1, $2, $3)
             ON CONFLICT (id) DO NOTHING",
        )
        .bind("user_123")
        .bind("コパイロットキッズ")
        .bind(json!({"theme": "dark", "language": "ja"}))
        .execute(&self.pool)
        .await?;

        tracing::info!("user store schema ready");
        Ok(())
    }

    /// Look up a user's profile. `None` when no row matches.
    #[instrument(skip(self), err)]
    pub async fn fetch_profile(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        let row = sqlx::query("SELECT id, name, preferences FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| {
            let id: String = row.try_get("id")?;
            let name: Option<String> = row.try_get("name")?;
            let preferences: Option<Value> = row.try_get("preferences")?;
            Ok(UserProfile {
                id,
                name: name.unwrap_or_default(),
                preferences: preferences.unwrap_or_else(|| json!({})),
            })
        })
        .transpose()
    }
}
