use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use super::model::*;
use super::repo::*;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn new(db_path: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;

        info!("Analytics database initialized at {}", db_path);

        Ok(store)
    }

    /// Single-connection in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> StoreResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsStore for SqliteStore {
    async fn find_by_term(&self, term: &str) -> StoreResult<Option<SearchTerm>> {
        let record = sqlx::query_as::<_, SearchTerm>(
            "SELECT id, search_term AS term, count, movie_id, poster_url
             FROM search_terms WHERE search_term = ?",
        )
        .bind(term)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn top_by_count(&self, limit: usize) -> StoreResult<Vec<SearchTerm>> {
        let records = sqlx::query_as::<_, SearchTerm>(
            "SELECT id, search_term AS term, count, movie_id, poster_url
             FROM search_terms ORDER BY count DESC, rowid ASC LIMIT ?",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn create(&self, record: &NewSearchTerm) -> StoreResult<SearchTerm> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO search_terms (id, search_term, count, movie_id, poster_url, created)
             VALUES (?, ?, 1, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&record.term)
        .bind(record.movie_id)
        .bind(&record.poster_url)
        .bind(record.created.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(SearchTerm {
            id,
            term: record.term.clone(),
            count: 1,
            movie_id: record.movie_id,
            poster_url: record.poster_url.clone(),
        })
    }

    async fn update_count(&self, id: &str, count: i64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE search_terms SET count = ?, updated = ? WHERE id = ?")
            .bind(count)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("Search term not found: {}", id)));
        }
        Ok(())
    }
}
