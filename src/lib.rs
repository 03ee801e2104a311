// taskdb - Task and label persistence over a pooled SQLite connection

pub mod config;
pub mod connection;
pub mod error;
pub mod models;
pub mod schema;
pub mod store;

// Re-export main types for convenience
pub use config::Config;
pub use connection::{ConnectionConfig, ConnectionPool, open_pool};
pub use error::{Result, StoreError};
pub use models::{Task, now_secs};
pub use store::TaskStore;
