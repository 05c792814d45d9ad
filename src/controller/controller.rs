use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{self, JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info};

use super::command::*;
use super::state::UiState;
use crate::analytics::SearchAnalytics;
use crate::catalog::{CatalogError, MovieCatalog, QueryOutcome};
use crate::debounce::Debouncer;

/// Query the catalog and, for a non-empty term with results, count the
/// search. Shared by the controller and the HTTP API.
pub async fn search_and_record(
    catalog: &dyn MovieCatalog,
    analytics: &SearchAnalytics,
    term: &str,
) -> QueryOutcome {
    let outcome = catalog.query(term).await;
    if let Ok(ref movies) = outcome {
        if let (false, Some(top)) = (term.is_empty(), movies.first()) {
            analytics.record_search(term, top).await;
        }
    }
    outcome
}

/// Owns `UiState` and runs on its own task. Input arrives as `Command`s;
/// snapshots go out on a watch channel after every transition.
pub struct Controller {
    catalog: Arc<dyn MovieCatalog>,
    analytics: Arc<SearchAnalytics>,
    state: UiState,
    debouncer: Debouncer<String>,
    tasks: JoinSet<Completion>,
    // Sequence number of the newest query; older completions are dropped.
    latest_seq: u64,
    // Query tasks still running, so a task that dies can be matched to its seq.
    queries: HashMap<task::Id, u64>,
    published: watch::Sender<UiState>,
}

pub struct ControllerHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<UiState>,
    task: JoinHandle<()>,
}

impl Controller {
    pub fn spawn(
        catalog: Arc<dyn MovieCatalog>,
        analytics: Arc<SearchAnalytics>,
        quiet_window: Duration,
    ) -> ControllerHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(UiState::default());

        let controller = Controller {
            catalog,
            analytics,
            state: UiState::default(),
            debouncer: Debouncer::new(quiet_window),
            tasks: JoinSet::new(),
            latest_seq: 0,
            queries: HashMap::new(),
            published: state_tx,
        };
        let task = tokio::spawn(controller.run(cmd_rx));

        ControllerHandle {
            commands: cmd_tx,
            state: state_rx,
            task,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        info!(window = ?self.debouncer.window(), "controller started");

        // Mount: trending once, plus the discover query for the empty term.
        self.load_trending();
        self.start_query();

        loop {
            tokio::select! {
                cmd = commands.recv() => match cmd {
                    Some(Command::SetInput(text)) => self.on_input(text),
                    Some(Command::Shutdown) | None => break,
                },
                term = self.debouncer.settled() => self.on_settled(term),
                Some(joined) = self.tasks.join_next_with_id() => match joined {
                    Ok((id, completion)) => {
                        self.queries.remove(&id);
                        self.on_completion(completion);
                    }
                    Err(e) => self.on_task_failed(e),
                },
            }
        }

        self.debouncer.cancel();
        self.tasks.abort_all();
        info!("controller stopped");
    }

    fn publish(&self) {
        self.published.send_replace(self.state.clone());
    }

    fn on_input(&mut self, text: String) {
        self.state.set_input(text.clone());
        self.debouncer.arm(text);
        self.publish();
    }

    fn on_settled(&mut self, term: String) {
        debug!(term = %term, "search term settled");
        self.state.settle(term);
        self.start_query();
    }

    fn start_query(&mut self) {
        self.latest_seq += 1;
        let seq = self.latest_seq;
        let term = self.state.settled_term.clone();

        self.state.begin_query();
        self.publish();

        let catalog = Arc::clone(&self.catalog);
        let analytics = Arc::clone(&self.analytics);
        let handle = self.tasks.spawn(async move {
            let outcome = search_and_record(catalog.as_ref(), &analytics, &term).await;
            Completion::Query { seq, term, outcome }
        });
        self.queries.insert(handle.id(), seq);
    }

    fn load_trending(&mut self) {
        let analytics = Arc::clone(&self.analytics);
        self.tasks
            .spawn(async move { Completion::Trending(analytics.fetch_trending().await) });
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Query { seq, term, outcome } => {
                if seq != self.latest_seq {
                    debug!(term = %term, seq = seq, latest = self.latest_seq, "discarding superseded response");
                    return;
                }
                match outcome {
                    Ok(ref movies) => info!(term = %term, results = movies.len(), "query complete"),
                    Err(ref e) => info!(term = %term, "query failed: {}", e),
                }
                self.state.apply_outcome(outcome);
                self.state.finish_query();
            }
            Completion::Trending(trending) => self.state.set_trending(trending),
        }
        self.publish();
    }

    fn on_task_failed(&mut self, e: JoinError) {
        error!("controller task failed: {}", e);
        match self.queries.remove(&e.id()) {
            Some(seq) if seq == self.latest_seq => {
                self.state.apply_outcome(Err(CatalogError::Interrupted));
                self.state.finish_query();
                self.publish();
            }
            _ => {}
        }
    }
}

impl ControllerHandle {
    pub async fn set_input(&self, text: impl Into<String>) -> Result<(), ControllerError> {
        self.commands
            .send(Command::SetInput(text.into()))
            .await
            .map_err(|_| ControllerError::Stopped)
    }

    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Stop the controller. A pending debounce never fires afterwards.
    pub async fn shutdown(self) {
        let _ = self.commands.send(Command::Shutdown).await;
        if let Err(e) = self.task.await {
            error!("controller task ended abnormally: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{AnalyticsStore, MemoryStore};
    use crate::catalog::{Movie, GENERIC_ERROR_MESSAGE};
    use crate::controller::DisplayState;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::{sleep, timeout};

    const WINDOW: Duration = Duration::from_millis(500);

    type Respond = Box<dyn Fn(&str) -> QueryOutcome + Send + Sync>;

    struct MockCatalog {
        calls: Mutex<Vec<String>>,
        delays: HashMap<String, Duration>,
        respond: Respond,
    }

    impl MockCatalog {
        fn new(respond: Respond) -> Arc<Self> {
            Self::with_delays(respond, HashMap::new())
        }

        fn with_delays(respond: Respond, delays: HashMap<String, Duration>) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                delays,
                respond,
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl MovieCatalog for MockCatalog {
        async fn query(&self, term: &str) -> QueryOutcome {
            self.calls.lock().unwrap().push(term.to_string());
            if let Some(delay) = self.delays.get(term) {
                sleep(*delay).await;
            }
            (self.respond)(term)
        }
    }

    fn movie_named(id: i64, title: &str) -> Movie {
        Movie {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{}.jpg", id)),
            vote_average: Some(7.5),
            release_date: Some("2010-07-15".to_string()),
            original_language: "en".to_string(),
        }
    }

    // One movie titled after the term; discover mode gets "popular".
    fn echo() -> Respond {
        Box::new(|term: &str| {
            let title = if term.is_empty() { "popular" } else { term };
            Ok(vec![movie_named(title.len() as i64, title)])
        })
    }

    fn analytics(store: Arc<MemoryStore>) -> Arc<SearchAnalytics> {
        Arc::new(SearchAnalytics::new(store, "https://image.tmdb.org/t/p/w500", 5))
    }

    async fn wait_until<F>(rx: &mut watch::Receiver<UiState>, f: F) -> UiState
    where
        F: FnMut(&UiState) -> bool,
    {
        timeout(Duration::from_secs(60), rx.wait_for(f))
            .await
            .expect("state never reached")
            .expect("controller gone")
            .clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_issues_one_query() {
        let catalog = MockCatalog::new(echo());
        let handle = Controller::spawn(catalog.clone(), analytics(Arc::new(MemoryStore::new())), WINDOW);
        let mut rx = handle.subscribe();

        let word = "inception";
        for end in 1..=word.len() {
            handle.set_input(&word[..end]).await.unwrap();
            sleep(Duration::from_millis(200)).await;
        }

        let state = wait_until(&mut rx, |s| s.settled_term == "inception" && !s.is_loading).await;
        assert_eq!(state.raw_input, "inception");
        assert_eq!(state.movies[0].title, "inception");

        sleep(Duration::from_secs(2)).await;
        // The mount-time discover query plus exactly one search.
        assert_eq!(catalog.calls(), vec!["".to_string(), "inception".to_string()]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_application_error_surfaces() {
        let catalog = MockCatalog::new(Box::new(|term: &str| {
            if term == "batman" {
                Err(CatalogError::Application("Request limit reached".to_string()))
            } else {
                Ok(vec![movie_named(1, "popular")])
            }
        }));
        let handle = Controller::spawn(catalog, analytics(Arc::new(MemoryStore::new())), WINDOW);
        let mut rx = handle.subscribe();

        wait_until(&mut rx, |s| !s.movies.is_empty() && !s.is_loading).await;
        handle.set_input("batman").await.unwrap();

        let state = wait_until(&mut rx, |s| s.settled_term == "batman" && !s.is_loading).await;
        assert_eq!(state.error_message, "Request limit reached");
        assert!(state.movies.is_empty());
        assert!(!state.is_loading);
        assert_eq!(state.display(), DisplayState::Error("Request limit reached"));
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_records_only_real_searches() {
        let store = Arc::new(MemoryStore::new());
        let catalog = MockCatalog::new(Box::new(|term: &str| match term {
            "zzz" => Ok(Vec::new()),
            "" => Ok(vec![movie_named(1, "popular")]),
            other => Ok(vec![movie_named(438631, other)]),
        }));
        let handle = Controller::spawn(catalog, analytics(store.clone()), WINDOW);
        let mut rx = handle.subscribe();

        handle.set_input("dune").await.unwrap();
        wait_until(&mut rx, |s| s.settled_term == "dune" && !s.is_loading).await;
        handle.set_input("zzz").await.unwrap();
        let state = wait_until(&mut rx, |s| s.settled_term == "zzz" && !s.is_loading).await;
        assert!(matches!(state.display(), DisplayState::Results(m) if m.is_empty()));

        let dune = store.find_by_term("dune").await.unwrap().unwrap();
        assert_eq!(dune.count, 1);
        assert_eq!(dune.movie_id, 438631);
        assert_eq!(dune.poster_url, "https://image.tmdb.org/t/p/w500/438631.jpg");
        assert_eq!(store.len().await, 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_resettling_same_term_queries_again() {
        let catalog = MockCatalog::new(echo());
        let handle = Controller::spawn(catalog.clone(), analytics(Arc::new(MemoryStore::new())), WINDOW);
        let mut rx = handle.subscribe();

        handle.set_input("alien").await.unwrap();
        wait_until(&mut rx, |s| s.settled_term == "alien" && !s.is_loading).await;
        handle.set_input("alien").await.unwrap();
        sleep(Duration::from_secs(1)).await;
        wait_until(&mut rx, |s| !s.is_loading).await;

        assert_eq!(catalog.calls(), vec!["", "alien", "alien"]);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_response_is_discarded() {
        let delays = [("slow".to_string(), Duration::from_secs(2))].into_iter().collect();
        let catalog = MockCatalog::with_delays(echo(), delays);
        let handle = Controller::spawn(catalog.clone(), analytics(Arc::new(MemoryStore::new())), WINDOW);
        let mut rx = handle.subscribe();

        handle.set_input("slow").await.unwrap();
        sleep(Duration::from_millis(600)).await;
        assert!(handle.snapshot().is_loading);

        handle.set_input("fast").await.unwrap();
        let state = wait_until(&mut rx, |s| s.settled_term == "fast" && !s.is_loading).await;
        assert_eq!(state.movies[0].title, "fast");

        // Let the slow response arrive; it must not overwrite the newer one.
        sleep(Duration::from_secs(3)).await;
        let state = handle.snapshot();
        assert_eq!(state.movies[0].title, "fast");
        assert!(!state.is_loading);
        assert_eq!(catalog.calls(), vec!["", "slow", "fast"]);
        handle.shutdown().await;
    }

    struct PanickingCatalog;

    #[async_trait]
    impl MovieCatalog for PanickingCatalog {
        async fn query(&self, term: &str) -> QueryOutcome {
            if term == "boom" {
                panic!("catalog blew up");
            }
            Ok(vec![movie_named(1, "popular")])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_query_task_clears_loading() {
        let handle = Controller::spawn(
            Arc::new(PanickingCatalog),
            analytics(Arc::new(MemoryStore::new())),
            WINDOW,
        );
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| !s.movies.is_empty() && !s.is_loading).await;

        handle.set_input("boom").await.unwrap();
        let state = wait_until(&mut rx, |s| s.settled_term == "boom" && !s.is_loading).await;
        assert_eq!(state.error_message, GENERIC_ERROR_MESSAGE);
        assert!(state.movies.is_empty());

        // The controller keeps serving input afterwards.
        handle.set_input("alien").await.unwrap();
        let state = wait_until(&mut rx, |s| s.settled_term == "alien" && !s.is_loading).await;
        assert!(state.error_message.is_empty());
        assert_eq!(state.movies.len(), 1);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_trending_loaded_on_start() {
        let store = Arc::new(MemoryStore::new());
        let seed = analytics(store.clone());
        seed.record_search("dune", &movie_named(1, "Dune")).await;
        seed.record_search("dune", &movie_named(1, "Dune")).await;
        seed.record_search("alien", &movie_named(2, "Alien")).await;

        let handle = Controller::spawn(MockCatalog::new(echo()), seed, WINDOW);
        let mut rx = handle.subscribe();

        let state = wait_until(&mut rx, |s| s.trending.len() == 2).await;
        assert_eq!(state.trending[0].term, "dune");
        assert_eq!(state.trending[0].count, 2);
        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_debounce() {
        let catalog = MockCatalog::new(echo());
        let handle = Controller::spawn(catalog.clone(), analytics(Arc::new(MemoryStore::new())), WINDOW);
        let mut rx = handle.subscribe();
        wait_until(&mut rx, |s| !s.movies.is_empty() && !s.is_loading).await;

        handle.set_input("never").await.unwrap();
        handle.shutdown().await;
        sleep(Duration::from_secs(2)).await;

        assert_eq!(catalog.calls(), vec![""]);
    }
}
