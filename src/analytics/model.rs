use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One record per distinct search term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SearchTerm {
    pub id: String,
    pub term: String,
    pub count: i64,
    pub movie_id: i64,
    pub poster_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSearchTerm {
    pub term: String,
    pub movie_id: i64,
    pub poster_url: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Store returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Already exists: {0}")]
    Duplicate(String),
    #[error("Invalid store configuration: {0}")]
    Config(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
