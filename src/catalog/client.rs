use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use tracing::{debug, warn};

use super::types::*;
use crate::config::CatalogConfig;

/// Read access to the movie catalog. One call is one attempt: no retries,
/// no shared state.
#[async_trait]
pub trait MovieCatalog: Send + Sync {
    async fn query(&self, term: &str) -> QueryOutcome;
}

pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let api_key = config.apikey.as_deref().unwrap_or_default();

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| CatalogError::InvalidApiKey)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.baseurl.trim_end_matches('/').to_string(),
        })
    }
}

/// Discover mode for an empty term, search mode otherwise.
pub fn build_url(base: &str, term: &str) -> String {
    let base = base.trim_end_matches('/');
    if term.is_empty() {
        format!("{}/discover/movie?sort_by=popularity.desc", base)
    } else {
        format!("{}/search/movie?query={}", base, urlencoding::encode(term))
    }
}

#[async_trait]
impl MovieCatalog for CatalogClient {
    async fn query(&self, term: &str) -> QueryOutcome {
        let url = build_url(&self.base_url, term);
        debug!(url = %url, "catalog query");

        let fetched = async {
            let response = self.http.get(&url).send().await?;
            let status = response.status().as_u16();
            let body = response.bytes().await?;
            Ok::<_, reqwest::Error>((status, body))
        }
        .await;

        let outcome = match fetched {
            Ok((status, body)) => interpret_response(status, &body),
            Err(e) => Err(CatalogError::Request(e)),
        };
        if let Err(ref e) = outcome {
            warn!(term = %term, "catalog query failed: {}", e);
        }
        outcome
    }
}
