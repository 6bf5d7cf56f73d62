use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use tracing::{debug, info};

use crate::inventory::{InventoryEntry, InventoryMeta, InventoryStore};

type EntryRow = (String, String, String, DateTime<Utc>);

/// Initialize the database schema
pub async fn init_database_schema(pool: &PgPool) -> Result<()> {
    info!("Initializing database schema...");

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS inventory_entries (
            id BIGSERIAL PRIMARY KEY,
            telegram_id BIGINT NOT NULL,
            uid TEXT NOT NULL,
            password TEXT NOT NULL DEFAULT '',
            cookie TEXT NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )",
    )
    .execute(pool)
    .await
    .context("Failed to create inventory_entries table")?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS inventory_entries_telegram_id_idx
         ON inventory_entries (telegram_id, id)",
    )
    .execute(pool)
    .await
    .context("Failed to create inventory index")?;

    info!("Database schema initialized successfully");
    Ok(())
}

fn entry_from_row((uid, password, cookie, created_at): EntryRow) -> InventoryEntry {
    InventoryEntry {
        uid,
        password,
        cookie,
        created_at,
    }
}

/// Inventory staging table backed by Postgres, shared across bot restarts
#[derive(Debug, Clone)]
pub struct PgInventoryStore {
    pool: PgPool,
}

impl PgInventoryStore {
    /// Connect and make sure the schema exists
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        init_database_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InventoryStore for PgInventoryStore {
    async fn add_entry(
        &self,
        user_id: i64,
        uid: &str,
        password: &str,
        cookie: &str,
    ) -> Result<InventoryEntry> {
        let row: EntryRow = sqlx::query_as(
            "INSERT INTO inventory_entries (telegram_id, uid, password, cookie)
             VALUES ($1, $2, $3, $4)
             RETURNING uid, password, cookie, created_at",
        )
        .bind(user_id)
        .bind(uid)
        .bind(password)
        .bind(cookie)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert inventory entry")?;

        debug!(user_id, "Inventory entry stored");
        Ok(entry_from_row(row))
    }

    async fn entries(&self, user_id: i64) -> Result<Vec<InventoryEntry>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT uid, password, cookie, created_at FROM inventory_entries
             WHERE telegram_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list inventory entries")?;

        Ok(rows.into_iter().map(entry_from_row).collect())
    }

    async fn meta(&self, user_id: i64) -> Result<InventoryMeta> {
        let latest: Option<EntryRow> = sqlx::query_as(
            "SELECT uid, password, cookie, created_at FROM inventory_entries
             WHERE telegram_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to read latest inventory entry")?;

        Ok(latest
            .map(|(uid, password, _, created_at)| InventoryMeta {
                last_uid: uid,
                last_password_empty: password.is_empty(),
                last_input_at: Some(created_at),
            })
            .unwrap_or_default())
    }

    async fn count(&self, user_id: i64) -> Result<usize> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM inventory_entries WHERE telegram_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .context("Failed to count inventory entries")?;

        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn clear(&self, user_id: i64) -> Result<()> {
        let result = sqlx::query("DELETE FROM inventory_entries WHERE telegram_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .context("Failed to clear inventory")?;

        info!(user_id, removed = result.rows_affected(), "Inventory cleared");
        Ok(())
    }
}
