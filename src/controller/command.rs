use crate::analytics::SearchTerm;
use crate::catalog::QueryOutcome;

/// Input to the controller task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// The search box now holds this text.
    SetInput(String),
    Shutdown,
}

/// Result of a background task, fed back into the controller loop.
#[derive(Debug)]
pub enum Completion {
    Query {
        seq: u64,
        term: String,
        outcome: QueryOutcome,
    },
    Trending(Option<Vec<SearchTerm>>),
}

#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Controller has stopped")]
    Stopped,
}
