//! # bizhub-adapter-memory
//!
//! In-process implementations of the `bizhub-app` ports.
//!
//! ## Responsibilities
//! - `InMemoryEntityStore` — the business collections, publishing every
//!   completed write to registered mutation listeners
//! - `InMemoryKeyValueStore` — blob storage for tests and ephemeral runs
//! - `TracingNotificationSink` / `RecordingNotificationSink` — notification delivery
//! - `InMemoryActivityLog` — the activity journal
//!
//! ## Dependency rule
//! Depends on `bizhub-app` (for port traits) and `bizhub-domain` (for domain types).

mod activity_log;
mod entity_store;
mod key_value;
mod notification;

pub use activity_log::InMemoryActivityLog;
pub use entity_store::InMemoryEntityStore;
pub use key_value::InMemoryKeyValueStore;
pub use notification::{RecordingNotificationSink, TracingNotificationSink};
