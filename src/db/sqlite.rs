//! SQLite-backed document store.
//!
//! All collections share one `documents` table; the body is JSON text and the
//! `sort_key` column mirrors the body's `name` for ordered range reads.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;
use std::str::FromStr;

use super::{validate_flat, Collection, Document, DocumentStore, Fields, SortKey, StoreError};

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(std::time::Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            sort_key TEXT NOT NULL DEFAULT '',
            body TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_documents_order ON documents(collection, sort_key, id);",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Document store over a SQLite pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for SqliteStore {
    async fn insert(&self, collection: Collection, fields: Fields) -> Result<String, StoreError> {
        validate_flat(&fields)?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();
        let key = SortKey::of(&fields, &id);
        let body = serde_json::Value::Object(fields).to_string();

        sqlx::query(
            "INSERT INTO documents (collection, id, sort_key, body, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(&key.name)
        .bind(&body)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<(), StoreError> {
        validate_flat(&fields)?;

        let now = Utc::now().to_rfc3339();
        let key = SortKey::of(&fields, id);
        let body = serde_json::Value::Object(fields).to_string();

        let result = sqlx::query(
            "UPDATE documents SET sort_key = ?, body = ?, updated_at = ? WHERE collection = ? AND id = ?",
        )
        .bind(&key.name)
        .bind(&body)
        .bind(&now)
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "{} {} not found",
                collection.as_str(),
                id
            )));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!(
                "{} {} not found",
                collection.as_str(),
                id
            )));
        }
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query("SELECT id, sort_key, body FROM documents WHERE collection = ? AND id = ?")
            .bind(collection.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(document_from_row))
    }

    async fn page_after(
        &self,
        collection: Collection,
        after: Option<&SortKey>,
        limit: usize,
    ) -> Result<Vec<Document>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = match after {
            Some(key) => {
                sqlx::query(
                    r#"SELECT id, sort_key, body FROM documents
                       WHERE collection = ? AND (sort_key > ? OR (sort_key = ? AND id > ?))
                       ORDER BY sort_key, id LIMIT ?"#,
                )
                .bind(collection.as_str())
                .bind(&key.name)
                .bind(&key.name)
                .bind(&key.id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, sort_key, body FROM documents WHERE collection = ? ORDER BY sort_key, id LIMIT ?",
                )
                .bind(collection.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.iter().map(document_from_row).collect())
    }

    async fn scan(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, sort_key, body FROM documents WHERE collection = ? ORDER BY sort_key, id",
        )
        .bind(collection.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(document_from_row).collect())
    }

    async fn count(&self, collection: Collection) -> Result<usize, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS total FROM documents WHERE collection = ?")
            .bind(collection.as_str())
            .fetch_one(&self.pool)
            .await?;
        let total: i64 = row.get("total");
        Ok(usize::try_from(total).unwrap_or_default())
    }
}

// A body that no longer parses reads as an empty document; the record
// adapters fill every field with its default. The key always comes from the
// indexed column so cursors match the row's place in the index.
fn document_from_row(row: &SqliteRow) -> Document {
    let id: String = row.get("id");
    let sort_key: String = row.get("sort_key");
    let body: String = row.get("body");
    let fields = match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(_) | Err(_) => {
            tracing::warn!("Document {} has a corrupt body, reading it as empty", id);
            Fields::new()
        }
    };
    Document {
        key: SortKey::new(sort_key, id),
        fields,
    }
}
