use serde::{Deserialize, Serialize};

use crate::catalog::Movie;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieQuery {
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoviesResponse {
    pub movies: Vec<Movie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
