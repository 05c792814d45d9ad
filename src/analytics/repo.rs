use async_trait::async_trait;

use super::model::*;

/// The document-store primitives search analytics needs.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Equality lookup on the term key.
    async fn find_by_term(&self, term: &str) -> StoreResult<Option<SearchTerm>>;
    /// Highest counts first; equal counts keep insertion order.
    async fn top_by_count(&self, limit: usize) -> StoreResult<Vec<SearchTerm>>;
    async fn create(&self, record: &NewSearchTerm) -> StoreResult<SearchTerm>;
    async fn update_count(&self, id: &str, count: i64) -> StoreResult<()>;
}
