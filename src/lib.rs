pub mod analytics;
pub mod api;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod controller;
pub mod debounce;
pub mod middleware;
pub mod server;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use analytics::{AnalyticsStore, AppwriteStore, MemoryStore, SearchAnalytics, SqliteStore};
use catalog::{CatalogClient, MovieCatalog};
use config::Config;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),
    #[error("Analytics store error: {0}")]
    Store(#[from] analytics::StoreError),
    #[error("Controller error: {0}")]
    Controller(#[from] controller::ControllerError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Server error: {0}")]
    Server(String),
}

/// The two external collaborators, built from config.
pub struct Services {
    pub catalog: Arc<dyn MovieCatalog>,
    pub analytics: Arc<SearchAnalytics>,
}

pub async fn open_store(config: &Config) -> Result<Arc<dyn AnalyticsStore>, AppError> {
    if let Some(ref aw) = config.analytics.appwrite {
        info!("Using remote analytics store at {}", aw.endpoint);
        return Ok(Arc::new(AppwriteStore::new(aw)?));
    }
    if let Some(ref sqlite) = config.analytics.sqlite {
        info!("Opening analytics database at {}", sqlite.filename);
        return Ok(Arc::new(SqliteStore::new(&sqlite.filename).await?));
    }
    warn!("No analytics store configured, search counts are kept in memory only");
    Ok(Arc::new(MemoryStore::new()))
}

pub async fn build_services(config: &Config) -> Result<Services, AppError> {
    let catalog = Arc::new(CatalogClient::new(&config.catalog)?);
    info!("Catalog at {}", config.catalog.baseurl);

    let store = open_store(config).await?;
    let analytics = Arc::new(SearchAnalytics::new(
        store,
        &config.images.baseurl,
        config.search.trending_limit,
    ));

    Ok(Services { catalog, analytics })
}

pub async fn serve(config: &Config) -> Result<(), AppError> {
    let services = build_services(config).await?;

    let addr: SocketAddr = config
        .listen_addr()
        .parse()
        .map_err(|e| AppError::Server(format!("Invalid address: {}", e)))?;

    let state = server::AppState::new(services.catalog, services.analytics);
    let app = server::build_router(state);

    info!("Serving HTTP on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Server(format!("Server error: {}", e)))?;

    Ok(())
}
