use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::analytics::SearchTerm;
use crate::catalog::Movie;
use crate::controller::{search_and_record, Controller, DisplayState, UiState};
use crate::{AppError, Services};

pub fn format_movie(movie: &Movie) -> String {
    let rating = movie
        .vote_average
        .map(|r| format!("{:.1}", r))
        .unwrap_or_else(|| "N/A".to_string());
    let year = movie.year().unwrap_or("N/A");
    let lang = if movie.original_language.is_empty() {
        "?"
    } else {
        movie.original_language.as_str()
    };
    format!("{} ({}) rating {} [{}]", movie.title, year, rating, lang)
}

pub fn format_trending(trending: &[SearchTerm]) -> String {
    trending
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {} ({})", i + 1, t.term, t.count))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render(state: &UiState) -> String {
    let mut out = String::new();
    if !state.trending.is_empty() {
        out.push_str("Trending:\n");
        out.push_str(&format_trending(&state.trending));
        out.push('\n');
    }
    match state.display() {
        DisplayState::Loading => out.push_str("Loading..."),
        DisplayState::Error(message) => out.push_str(&format!("Error: {}", message)),
        DisplayState::Results(movies) if movies.is_empty() => out.push_str("No movies found."),
        DisplayState::Results(movies) => {
            let lines: Vec<String> = movies.iter().map(format_movie).collect();
            out.push_str(&lines.join("\n"));
        }
    }
    out
}

/// Interactive mode: every stdin line replaces the search input. Runs until
/// stdin closes.
pub async fn browse(services: Services, quiet_window: Duration) -> Result<(), AppError> {
    let handle = Controller::spawn(services.catalog, services.analytics, quiet_window);

    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        let mut last = String::new();
        while updates.changed().await.is_ok() {
            let frame = render(&updates.borrow_and_update());
            if frame != last {
                println!("----\n{}", frame);
                last = frame;
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        debug!(input = %line, "search input");
        handle.set_input(line).await?;
    }

    handle.shutdown().await;
    let _ = printer.await;
    Ok(())
}

pub async fn search_once(services: &Services, term: &str) -> Result<(), AppError> {
    let movies = search_and_record(services.catalog.as_ref(), &services.analytics, term).await?;
    if movies.is_empty() {
        println!("No movies found.");
    }
    for movie in &movies {
        println!("{}", format_movie(movie));
    }
    Ok(())
}

pub async fn show_trending(services: &Services) -> Result<(), AppError> {
    match services.analytics.fetch_trending().await {
        Some(trending) if !trending.is_empty() => println!("{}", format_trending(&trending)),
        _ => println!("No trending searches yet."),
    }
    Ok(())
}
