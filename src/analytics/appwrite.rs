use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::model::*;
use super::repo::*;
use crate::config::AppwriteConfig;

/// Remote document store speaking the Appwrite databases REST API.
pub struct AppwriteStore {
    http: reqwest::Client,
    documents_url: String,
}

#[derive(Debug, Deserialize)]
struct DocumentList {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "searchTerm")]
    search_term: String,
    count: i64,
    #[serde(default)]
    movie_id: i64,
    #[serde(default)]
    poster_url: String,
}

impl From<Document> for SearchTerm {
    fn from(doc: Document) -> Self {
        SearchTerm {
            id: doc.id,
            term: doc.search_term,
            count: doc.count,
            movie_id: doc.movie_id,
            poster_url: doc.poster_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

impl AppwriteStore {
    pub fn new(config: &AppwriteConfig) -> StoreResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-appwrite-project", header_value(&config.project)?);
        if let Some(ref key) = config.apikey {
            let mut value = header_value(key)?;
            value.set_sensitive(true);
            headers.insert("x-appwrite-key", value);
        }

        let http = reqwest::Client::builder().default_headers(headers).build()?;

        let documents_url = format!(
            "{}/databases/{}/collections/{}/documents",
            config.endpoint.trim_end_matches('/'),
            urlencoding::encode(&config.database),
            urlencoding::encode(&config.collection),
        );

        Ok(Self {
            http,
            documents_url,
        })
    }

    async fn list(&self, queries: &[serde_json::Value]) -> StoreResult<Vec<SearchTerm>> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_string()))
            .collect();

        let response = self.http.get(&self.documents_url).query(&params).send().await?;
        let list: DocumentList = check(response).await?.json().await?;
        Ok(list.documents.into_iter().map(SearchTerm::from).collect())
    }
}

fn header_value(value: &str) -> StoreResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| StoreError::Config(format!("invalid header value {:?}", value)))
}

/// Map non-success replies to a `StoreError`, keeping the server's message.
async fn check(response: reqwest::Response) -> StoreResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .await
        .map(|b| b.message)
        .unwrap_or_default();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(message));
    }
    Err(StoreError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl AnalyticsStore for AppwriteStore {
    async fn find_by_term(&self, term: &str) -> StoreResult<Option<SearchTerm>> {
        let queries = [json!({"method": "equal", "attribute": "searchTerm", "values": [term]})];
        Ok(self.list(&queries).await?.into_iter().next())
    }

    async fn top_by_count(&self, limit: usize) -> StoreResult<Vec<SearchTerm>> {
        let queries = [
            json!({"method": "orderDesc", "attribute": "count"}),
            json!({"method": "limit", "values": [limit]}),
        ];
        self.list(&queries).await
    }

    async fn create(&self, record: &NewSearchTerm) -> StoreResult<SearchTerm> {
        let body = json!({
            "documentId": "unique()",
            "data": {
                "searchTerm": record.term,
                "count": 1,
                "movie_id": record.movie_id,
                "poster_url": record.poster_url,
            }
        });

        let response = self.http.post(&self.documents_url).json(&body).send().await?;
        let doc: Document = check(response).await?.json().await?;
        debug!(id = %doc.id, term = %doc.search_term, "created search term document");
        Ok(doc.into())
    }

    async fn update_count(&self, id: &str, count: i64) -> StoreResult<()> {
        let url = format!("{}/{}", self.documents_url, urlencoding::encode(id));
        let body = json!({ "data": { "count": count } });

        let response = self.http.patch(&url).json(&body).send().await?;
        check(response).await?;
        Ok(())
    }
}
