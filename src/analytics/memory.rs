use async_trait::async_trait;
use tokio::sync::RwLock;

use super::model::*;
use super::repo::*;

/// Process-local store, used when no persistent backend is configured.
/// Records live in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<SearchTerm>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl AnalyticsStore for MemoryStore {
    async fn find_by_term(&self, term: &str) -> StoreResult<Option<SearchTerm>> {
        let records = self.records.read().await;
        Ok(records.iter().find(|r| r.term == term).cloned())
    }

    async fn top_by_count(&self, limit: usize) -> StoreResult<Vec<SearchTerm>> {
        let mut records = self.records.read().await.clone();
        // sort_by is stable, so ties stay in insertion order.
        records.sort_by(|a, b| b.count.cmp(&a.count));
        records.truncate(limit);
        Ok(records)
    }

    async fn create(&self, record: &NewSearchTerm) -> StoreResult<SearchTerm> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.term == record.term) {
            return Err(StoreError::Duplicate(format!("Search term exists: {}", record.term)));
        }
        let created = SearchTerm {
            id: uuid::Uuid::new_v4().to_string(),
            term: record.term.clone(),
            count: 1,
            movie_id: record.movie_id,
            poster_url: record.poster_url.clone(),
        };
        records.push(created.clone());
        Ok(created)
    }

    async fn update_count(&self, id: &str, count: i64) -> StoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("Search term not found: {}", id)))?;
        record.count = count;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn new_term(term: &str) -> NewSearchTerm {
        NewSearchTerm {
            term: term.to_string(),
            movie_id: 1,
            poster_url: String::new(),
            created: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ties_keep_insertion_order() {
        let store = MemoryStore::new();
        let a = store.create(&new_term("a")).await.unwrap();
        store.create(&new_term("b")).await.unwrap();
        store.create(&new_term("c")).await.unwrap();
        store.update_count(&a.id, 2).await.unwrap();

        let top: Vec<String> = store
            .top_by_count(10)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.term)
            .collect();
        assert_eq!(top, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_term_is_unique() {
        let store = MemoryStore::new();
        store.create(&new_term("dune")).await.unwrap();
        let err = store.create(&new_term("dune")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
        assert_eq!(store.len().await, 1);

        let top = store.top_by_count(5).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].term, "dune");
    }

    #[tokio::test]
    async fn test_update_unknown_id() {
        let store = MemoryStore::new();
        let err = store.update_count("nope", 3).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
