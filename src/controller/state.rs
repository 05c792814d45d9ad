use serde::Serialize;

use crate::analytics::SearchTerm;
use crate::catalog::{Movie, QueryOutcome};

/// Everything the browser shows. Only the controller mutates it, and only
/// through the transition methods below.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiState {
    pub raw_input: String,
    pub settled_term: String,
    pub movies: Vec<Movie>,
    pub trending: Vec<SearchTerm>,
    pub is_loading: bool,
    pub error_message: String,
}

/// What to render, in precedence order: loading, then error, then results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayState<'a> {
    Loading,
    Error(&'a str),
    Results(&'a [Movie]),
}

impl UiState {
    pub fn set_input(&mut self, text: String) {
        self.raw_input = text;
    }

    pub fn settle(&mut self, term: String) {
        self.settled_term = term;
    }

    pub fn begin_query(&mut self) {
        self.is_loading = true;
        self.error_message.clear();
    }

    pub fn apply_outcome(&mut self, outcome: QueryOutcome) {
        match outcome {
            Ok(movies) => self.movies = movies,
            Err(e) => {
                self.error_message = e.user_message();
                self.movies.clear();
            }
        }
    }

    pub fn finish_query(&mut self) {
        self.is_loading = false;
    }

    /// `None` means the load failed; the previous list stays.
    pub fn set_trending(&mut self, trending: Option<Vec<SearchTerm>>) {
        if let Some(trending) = trending {
            self.trending = trending;
        }
    }

    pub fn display(&self) -> DisplayState<'_> {
        if self.is_loading {
            DisplayState::Loading
        } else if !self.error_message.is_empty() {
            DisplayState::Error(&self.error_message)
        } else {
            DisplayState::Results(&self.movies)
        }
    }
}
