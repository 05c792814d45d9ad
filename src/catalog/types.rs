use serde::{Deserialize, Deserializer, Serialize};

/// Shown for failures the catalog did not explain itself.
pub const GENERIC_ERROR_MESSAGE: &str = "Error fetching movies. Please try again later.";
/// Used when the catalog flags a failure but leaves `Error` empty.
pub const APPLICATION_ERROR_FALLBACK: &str = "Failed to fetch movies";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub original_language: String,
}

// The catalog sends `null` for some text fields; treat it like a missing key.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Movie {
    /// Release year, if the catalog gave a usable date.
    pub fn year(&self) -> Option<&str> {
        self.release_date.as_deref().and_then(|d| d.get(..4))
    }
}

#[derive(Debug, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub results: Vec<Movie>,
    #[serde(rename = "Response", default)]
    pub response: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog returned HTTP {0}")]
    Status(u16),
    #[error("Catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Failed to decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{0}")]
    Application(String),
    #[error("API key is not a valid header value")]
    InvalidApiKey,
    #[error("Catalog query did not complete")]
    Interrupted,
}

impl CatalogError {
    /// The message to put in front of the user.
    pub fn user_message(&self) -> String {
        match self {
            CatalogError::Application(msg) => msg.clone(),
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

pub type QueryOutcome = Result<Vec<Movie>, CatalogError>;

/// Turn a raw catalog reply into a `QueryOutcome`.
pub fn interpret_response(status: u16, body: &[u8]) -> QueryOutcome {
    if !(200..300).contains(&status) {
        return Err(CatalogError::Status(status));
    }

    let response: CatalogResponse = serde_json::from_slice(body)?;

    // HTTP 200 can still carry an application-level failure.
    if response.response.as_deref() == Some("False") {
        let message = response
            .error
            .filter(|e| !e.trim().is_empty())
            .unwrap_or_else(|| APPLICATION_ERROR_FALLBACK.to_string());
        return Err(CatalogError::Application(message));
    }

    Ok(response.results)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_decoded() {
        let body = br#"{
            "page": 1,
            "results": [
                {"id": 27205, "title": "Inception", "poster_path": "/inc.jpg",
                 "vote_average": 8.4, "release_date": "2010-07-15", "original_language": "en"},
                {"id": 1, "title": "No Poster", "poster_path": null, "release_date": ""}
            ]
        }"#;
        let movies = interpret_response(200, body).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "Inception");
        assert_eq!(movies[0].year(), Some("2010"));
        assert_eq!(movies[1].poster_path, None);
        assert_eq!(movies[1].vote_average, None);
        assert_eq!(movies[1].year(), None);
        assert_eq!(movies[1].original_language, "");
    }

    #[test]
    fn test_null_text_fields_decode_empty() {
        let body = br#"{"results": [
            {"id": 7, "title": null, "original_language": null, "poster_path": null},
            {"id": 8, "title": "Alien", "original_language": "en"}
        ]}"#;
        let movies = interpret_response(200, body).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[0].title, "");
        assert_eq!(movies[0].original_language, "");
        assert_eq!(movies[1].title, "Alien");
    }

    #[test]
    fn test_zero_matches_is_ok() {
        let movies = interpret_response(200, br#"{"results": []}"#).unwrap();
        assert!(movies.is_empty());
    }

    #[test]
    fn test_application_error_uses_server_message() {
        let body = br#"{"Response": "False", "Error": "Request limit reached"}"#;
        let err = interpret_response(200, body).unwrap_err();
        assert!(matches!(err, CatalogError::Application(_)));
        assert_eq!(err.user_message(), "Request limit reached");
    }

    #[test]
    fn test_application_error_fallback() {
        let body = br#"{"Response": "False", "results": []}"#;
        let err = interpret_response(200, body).unwrap_err();
        assert_eq!(err.user_message(), APPLICATION_ERROR_FALLBACK);
    }

    #[test]
    fn test_http_status_error_is_generic() {
        let body = br#"{"status_message": "Invalid API key", "Error": "ignored"}"#;
        let err = interpret_response(401, body).unwrap_err();
        assert!(matches!(err, CatalogError::Status(401)));
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_garbage_body_is_decode_error() {
        let err = interpret_response(200, b"<html>").unwrap_err();
        assert!(matches!(err, CatalogError::Decode(_)));
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }
}
