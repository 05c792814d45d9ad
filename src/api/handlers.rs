use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use super::types::*;
use crate::analytics::SearchTerm;
use crate::controller::search_and_record;
use crate::server::AppState;

/// Search when `query` is non-empty, discover otherwise. Counts the search
/// the same way the interactive browser does.
pub async fn search_movies(
    State(state): State<AppState>,
    Query(params): Query<MovieQuery>,
) -> Response {
    match search_and_record(state.catalog.as_ref(), &state.analytics, &params.query).await {
        Ok(movies) => Json(MoviesResponse { movies }).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.user_message(),
            }),
        )
            .into_response(),
    }
}

pub async fn trending(State(state): State<AppState>) -> Json<Vec<SearchTerm>> {
    Json(state.analytics.fetch_trending().await.unwrap_or_default())
}
