use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub images: ImageConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_url")]
    pub baseurl: String,
    #[serde(default)]
    pub apikey: Option<String>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            baseurl: default_catalog_url(),
            apikey: None,
            timeout: default_timeout(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImageConfig {
    #[serde(default = "default_image_url")]
    pub baseurl: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            baseurl: default_image_url(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default = "default_trending_limit")]
    pub trending_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            trending_limit: default_trending_limit(),
        }
    }
}

impl SearchConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub sqlite: Option<SqliteConfig>,
    #[serde(default)]
    pub appwrite: Option<AppwriteConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SqliteConfig {
    pub filename: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AppwriteConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub project: String,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub apikey: Option<String>,
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_catalog_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_debounce_ms() -> u64 {
    500
}

fn default_trending_limit() -> usize {
    5
}

impl Config {
    /// Load the config file, apply environment overrides and validate.
    /// A missing file is not an error as long as the environment supplies
    /// everything required.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Config::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(path.to_string(), e))
    }

    /// Overlay values from the environment. The lookup is injected so tests
    /// don't have to touch the process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("TMDB_API_KEY") {
            self.catalog.apikey = Some(key);
        }
        if let Some(url) = lookup("TMDB_BASE_URL") {
            self.catalog.baseurl = url;
        }

        let endpoint = lookup("APPWRITE_ENDPOINT");
        let project = lookup("APPWRITE_PROJECT_ID");
        let database = lookup("APPWRITE_DATABASE_ID");
        let collection = lookup("APPWRITE_COLLECTION_ID");
        let apikey = lookup("APPWRITE_API_KEY");

        if endpoint.is_some() || project.is_some() || database.is_some() || collection.is_some() {
            let aw = self.analytics.appwrite.get_or_insert_with(AppwriteConfig::default);
            if let Some(v) = endpoint {
                aw.endpoint = v;
            }
            if let Some(v) = project {
                aw.project = v;
            }
            if let Some(v) = database {
                aw.database = v;
            }
            if let Some(v) = collection {
                aw.collection = v;
            }
        }
        if let (Some(aw), Some(key)) = (self.analytics.appwrite.as_mut(), apikey) {
            aw.apikey = Some(key);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.catalog.apikey.as_deref() {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(ConfigError::Missing("catalog.apikey (or TMDB_API_KEY)".to_string())),
        }
        if self.catalog.baseurl.is_empty() {
            return Err(ConfigError::Missing("catalog.baseurl".to_string()));
        }
        if self.search.debounce_ms == 0 {
            return Err(ConfigError::Invalid("search.debounce_ms must be positive".to_string()));
        }
        if self.search.trending_limit == 0 {
            return Err(ConfigError::Invalid("search.trending_limit must be positive".to_string()));
        }
        if let Some(ref aw) = self.analytics.appwrite {
            for (name, value) in [
                ("endpoint", &aw.endpoint),
                ("project", &aw.project),
                ("database", &aw.database),
                ("collection", &aw.collection),
            ] {
                if value.is_empty() {
                    return Err(ConfigError::Missing(format!("analytics.appwrite.{}", name)));
                }
            }
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> String {
        let address = self.listen.address.as_deref().unwrap_or("[::]");
        format!("{}:{}", address, self.listen.port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("Missing configuration value: {0}")]
    Missing(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
