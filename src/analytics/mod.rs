pub mod appwrite;
pub mod memory;
pub mod model;
pub mod repo;
pub mod service;
pub mod sqlite;

pub use appwrite::AppwriteStore;
pub use memory::MemoryStore;
pub use model::*;
pub use repo::*;
pub use service::SearchAnalytics;
pub use sqlite::SqliteStore;
