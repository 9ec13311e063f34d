//! # bizhub-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement `KeyValueStore` (the engine's rule, log and dedup blobs)
//! - Implement `ActivityLog` (the dashboard journal)
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations)
//!
//! ## Dependency rule
//! Depends on `bizhub-app` (for port traits) and `bizhub-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

mod activity_log;
mod error;
mod key_value;
mod pool;

pub use activity_log::SqliteActivityLog;
pub use error::StorageError;
pub use key_value::SqliteKeyValueStore;
pub use pool::{Config, Database};
