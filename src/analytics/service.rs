use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error};

use super::model::*;
use super::repo::AnalyticsStore;
use crate::catalog::Movie;

/// Best-effort search-count tracking on top of an `AnalyticsStore`.
/// Nothing here returns an error: failures are logged and swallowed.
pub struct SearchAnalytics {
    store: Arc<dyn AnalyticsStore>,
    image_base: String,
    trending_limit: usize,
}

impl SearchAnalytics {
    pub fn new(store: Arc<dyn AnalyticsStore>, image_base: &str, trending_limit: usize) -> Self {
        Self {
            store,
            image_base: image_base.to_string(),
            trending_limit,
        }
    }

    pub fn poster_url(&self, movie: &Movie) -> String {
        // A movie without a poster yields the bare prefix.
        format!("{}{}", self.image_base, movie.poster_path.as_deref().unwrap_or_default())
    }

    /// Count one search of `term`, creating its record on first use.
    pub async fn record_search(&self, term: &str, top_movie: &Movie) {
        if let Err(e) = self.try_record_search(term, top_movie).await {
            error!(term = %term, "Failed to record search: {}", e);
        }
    }

    // Read-then-write: concurrent writers can under-count.
    async fn try_record_search(&self, term: &str, top_movie: &Movie) -> StoreResult<()> {
        match self.store.find_by_term(term).await? {
            Some(existing) => {
                let count = existing.count + 1;
                self.store.update_count(&existing.id, count).await?;
                debug!(term = %term, count = count, "search count incremented");
            }
            None => {
                let record = NewSearchTerm {
                    term: term.to_string(),
                    movie_id: top_movie.id,
                    poster_url: self.poster_url(top_movie),
                    created: Utc::now(),
                };
                let created = self.store.create(&record).await?;
                debug!(term = %term, id = %created.id, "search term created");
            }
        }
        Ok(())
    }

    /// The most searched terms, or `None` if the store could not be read.
    pub async fn fetch_trending(&self) -> Option<Vec<SearchTerm>> {
        match self.store.top_by_count(self.trending_limit).await {
            Ok(terms) => Some(terms),
            Err(e) => {
                error!("Failed to fetch trending searches: {}", e);
                None
            }
        }
    }
}
